//! Backend configuration parsed from environment variables.

use crate::error::ErrorCode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_FLOORPLAN_PATH: &str = "/api/kubes/svg";
pub const DEFAULT_SHELVES_PATH: &str = "/api/shelves";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeConfig {
    pub base_url: String,
    pub floorplan_path: String,
    pub shelves_path: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub request_timeout_secs: Option<u64>,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            floorplan_path: DEFAULT_FLOORPLAN_PATH.to_string(),
            shelves_path: DEFAULT_SHELVES_PATH.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: None,
        }
    }
}

impl KubeConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `KUBESHELF_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `KUBESHELF_FLOORPLAN_PATH`: default `/api/kubes/svg`
    /// - `KUBESHELF_SHELVES_PATH`: default `/api/shelves`
    /// - `KUBESHELF_CONNECT_TIMEOUT_SECS`: default 10
    /// - `KUBESHELF_REQUEST_TIMEOUT_SECS`: unset or `0` means no timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if a numeric variable is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("KUBESHELF_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let floorplan_path =
            std::env::var("KUBESHELF_FLOORPLAN_PATH").unwrap_or_else(|_| DEFAULT_FLOORPLAN_PATH.to_string());
        let shelves_path = std::env::var("KUBESHELF_SHELVES_PATH").unwrap_or_else(|_| DEFAULT_SHELVES_PATH.to_string());

        let connect_timeout_secs =
            env_parse_u64("KUBESHELF_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let request_timeout_secs = env_parse_u64("KUBESHELF_REQUEST_TIMEOUT_SECS")?.filter(|secs| *secs > 0);

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            floorplan_path: normalize_path(&floorplan_path),
            shelves_path: normalize_path(&shelves_path),
            connect_timeout_secs,
            request_timeout_secs,
        })
    }

    /// Replace the base URL (CLI override), applying the same normalization.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub fn floorplan_url(&self) -> String {
        format!("{}{}", self.base_url, self.floorplan_path)
    }

    #[must_use]
    pub fn shelves_url(&self) -> String {
        format!("{}{}", self.base_url, self.shelves_path)
    }
}

fn env_parse_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("{key} must be a non-negative integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
