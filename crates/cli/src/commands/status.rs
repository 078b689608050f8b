//! `folio status` — Show configuration status.

use folio_config::CredentialError;
use std::path::Path;

pub async fn run(config_override: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(config_override);
    let config = super::load_config(config_override)?;

    let credentials = match config.credentials() {
        Ok(_) => "configured".to_string(),
        Err(CredentialError::Missing) => "missing".to_string(),
        Err(CredentialError::Malformed(reason)) => format!("malformed ({reason})"),
    };

    println!("Folio Status");
    println!("============");
    println!("  Config file:  {}", config_path.display());
    println!("  Environment:  {}", config.environment);
    println!("  API URL:      {}", config.provider.api_url);
    println!("  Model:        {}", config.provider.model);
    println!("  Timeout:      {}s", config.provider.timeout_secs);
    println!("  API key:      {credentials}");
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Origins:      {}", config.gateway.allowed_origins.join(", "));
    println!("  Persona file: {}", config.persona.path.display());

    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `folio onboard` first");
    }
    if !config.persona.path.exists() {
        println!("  ⚠️  Persona file not created yet — defaults will be used");
    }

    Ok(())
}
