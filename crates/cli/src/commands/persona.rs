//! `folio persona` — Inspect the stored persona.

use folio_persona::{PersonaStore, build_system_prompt};
use std::path::Path;

fn store(config_override: Option<&Path>) -> Result<PersonaStore, Box<dyn std::error::Error>> {
    let config = super::load_config(config_override)?;
    Ok(PersonaStore::new(config.persona.path))
}

/// Print the sanitized persona, exactly as `GET /get-persona` serves it.
pub async fn show(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let persona = store(config_override)?.read().await?;
    println!("{}", serde_json::to_string_pretty(&persona.display_view())?);
    Ok(())
}

/// Print the system prompt the next chat request would use.
pub async fn prompt(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let persona = store(config_override)?.read().await?;
    println!("{}", build_system_prompt(&persona));
    Ok(())
}
