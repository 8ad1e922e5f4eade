//! Client configuration, loaded from the environment (and `.env` in development).

use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

use crate::api::DEFAULT_BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub timeout: Option<Duration>,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenv::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("LEARNHUB_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "LEARNHUB_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let token_file = lookup("LEARNHUB_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);

        let timeout = match lookup("LEARNHUB_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("LEARNHUB_TIMEOUT_SECS".to_string(), e.to_string())
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_url,
            token_file,
            timeout,
            log_level,
        })
    }
}

fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("learnhub").join("tokens.yaml"))
        .unwrap_or_else(|| PathBuf::from(".learnhub-tokens.yaml"))
}
