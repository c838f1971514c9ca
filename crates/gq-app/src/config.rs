use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://127.0.0.1:7860";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Runtime settings, read from the environment (and an optional `.env`).
///
/// | Env Var                   | Default                  |
/// |---------------------------|--------------------------|
/// | `SD_API_URL`              | `http://127.0.0.1:7860`  |
/// | `SD_REQUEST_TIMEOUT_SECS` | `300`                    |
/// | `GQ_OUTPUT_DIR`           | `outputs`                |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = lookup("SD_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = match lookup("SD_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: "SD_REQUEST_TIMEOUT_SECS",
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        let output_dir = lookup("GQ_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        Ok(Self {
            api_url,
            request_timeout,
            output_dir,
        })
    }
}
