//! Configuration loader for Jarvis.
//!
//! Reads `config.toml` from the data directory (`~/.jarvis/` by default)
//! and deserializes it into [`JarvisConfig`]. Falls back to defaults when
//! the file is missing or malformed; the backend always starts.

use std::path::{Path, PathBuf};

use jarvis_types::config::JarvisConfig;
use jarvis_types::error::ConfigError;

pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `JARVIS_DATA_DIR` environment variable
/// 2. `~/.jarvis`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("JARVIS_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".jarvis");
    }

    // Last resort: current directory
    PathBuf::from(".jarvis")
}

/// Load variables from a `.env` file in the working directory (or a parent).
///
/// Variables already set in the process environment take precedence.
/// Returns the path of the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(err) if err.not_found() => None,
        Err(err) => {
            // Tracing may not be initialized yet.
            eprintln!("warning: ignoring malformed .env file: {err}");
            None
        }
    }
}

/// Read and parse a config file strictly.
pub fn read_config(path: &Path) -> Result<Option<JarvisConfig>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<JarvisConfig>(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.message().to_string(),
        })
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`JarvisConfig::default()`].
/// - Unreadable or malformed file: logs a warning and returns the default.
pub fn load_config(data_dir: &Path) -> JarvisConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    match read_config(&config_path) {
        Ok(Some(config)) => {
            tracing::debug!("Loaded configuration from {}", config_path.display());
            config
        }
        Ok(None) => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            JarvisConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            JarvisConfig::default()
        }
    }
}
