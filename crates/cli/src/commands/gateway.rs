//! `folio gateway` — Start the HTTP server.

use std::path::Path;

pub async fn run(
    config_override: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_override)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Folio Gateway");
    println!("   Listening:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Environment: {}", config.environment);
    println!("   Origins:     {}", config.gateway.allowed_origins.join(", "));

    folio_gateway::start(config).await?;

    Ok(())
}
