//! Configuration loader for Haggle.
//!
//! Reads `config.toml` from the data directory (`~/.haggle/` in production)
//! and deserializes it into [`HaggleConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use haggle_types::config::HaggleConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HAGGLE_DATA_DIR";

/// Resolve the data directory.
///
/// Checks `HAGGLE_DATA_DIR`, then `~/.haggle`, then `.haggle` in the current
/// directory.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".haggle");
    }

    PathBuf::from(".haggle")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`HaggleConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> HaggleConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return HaggleConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return HaggleConfig::default();
        }
    };

    match toml::from_str::<HaggleConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            HaggleConfig::default()
        }
    }
}
