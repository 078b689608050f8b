//! `folio onboard` — First-time setup.

use folio_config::AppConfig;
use folio_persona::PersonaStore;
use std::path::Path;

pub async fn run(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(config_override);

    println!("Folio — First-Time Setup");
    println!("========================\n");

    if let Some(dir) = config_path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
        println!("✅ Created config directory: {}", dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = super::load_config(config_override)?;
    let store = PersonaStore::new(config.persona.path.clone());
    if store.ensure_exists().await? {
        println!("✅ Created persona file: {}", store.path().display());
    } else {
        println!("   Persona file exists: {}", store.path().display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Set api_key in {} (or export HUGGING_FACE_TOKEN)", config_path.display());
    println!("   2. Run: folio gateway");
    println!("   3. POST your story to /persona-chat-update to shape the persona\n");

    Ok(())
}
