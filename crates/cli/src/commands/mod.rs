pub mod gateway;
pub mod onboard;
pub mod persona;
pub mod status;

use folio_config::AppConfig;
use std::path::{Path, PathBuf};

/// Where the config file lives: the `--config` override or the default.
pub fn config_path(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the config with environment overrides applied.
pub fn load_config(override_path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_path(override_path);
    AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}").into())
}
