//! Configuration loading and settings resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Registry used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://waveplot.net";

/// Blocking request timeout when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log level when neither `RUST_LOG` nor configuration sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_SERVER_URL: &str = "WAVEPLOT_SERVER";
pub const ENV_EDITOR_KEY: &str = "WAVEPLOT_EDITOR_KEY";
pub const ENV_TIMEOUT_SECS: &str = "WAVEPLOT_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "WAVEPLOT_LOG_LEVEL";

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or filter directive, e.g. `debug` or `waveplot=trace`
    pub level: Option<String>,
}

/// Contents of `config.toml`
///
/// All fields are optional; a file containing only `[logging]` is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server_url: Option<String>,
    pub editor_key: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    ///
    /// # Errors
    /// `Error::Io` if the file cannot be read, `Error::Config` if it is not
    /// valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
    }

    /// Load the platform config file, or defaults if none exists
    ///
    /// A missing file is not an error. A present but malformed file is.
    pub fn load_default() -> Result<Self> {
        match config_file_path() {
            Some(path) => {
                debug!(path = %path.display(), "Loading TOML config");
                Self::load(&path)
            }
            None => {
                debug!("No TOML config found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the config file for the current platform
///
/// Linux checks `~/.config/waveplot/config.toml` then
/// `/etc/waveplot/config.toml`. Other platforms use the user config dir only.
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("waveplot").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/waveplot/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub editor_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved settings for the registry client and logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Registry base URL without trailing slash
    pub server_url: String,
    /// Editor credential, required only for registration
    pub editor_key: Option<String>,
    pub timeout: Duration,
    pub log_level: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            editor_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientSettings {
    /// Resolve settings from CLI overrides, environment and TOML
    pub fn resolve(overrides: &Overrides, toml_config: &TomlConfig) -> Result<Self> {
        let server_url = overrides
            .server_url
            .clone()
            .or_else(|| env_value(ENV_SERVER_URL))
            .or_else(|| toml_config.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let editor_key = overrides
            .editor_key
            .clone()
            .or_else(|| env_value(ENV_EDITOR_KEY))
            .or_else(|| toml_config.editor_key.clone())
            .filter(|key| is_valid_key(key));

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match env_value(ENV_TIMEOUT_SECS) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("{} must be a whole number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
                })?,
                None => toml_config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
        };

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| env_value(ENV_LOG_LEVEL))
            .or_else(|| toml_config.logging.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            server_url: normalize_server_url(&server_url)?,
            editor_key,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }
}

/// Validate credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Server URL must start with http:// or https://, got {:?}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
