//! Service configuration from environment variables.
//!
//! - `PORT`: listen port (default `3000`)
//! - `DATA_DIR`: directory holding `{planet}.json` files (default `data`)
//! - `PUBLIC_BASE_URL`: base of generated share links
//!   (default `http://localhost:{PORT}/`)

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";

/// Invalid service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings for the `planetmap` service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_base_url: Url,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| match std::env::var(var) {
            Ok(value) => Some(value),
            Err(std::env::VarError::NotPresent) => None,
            Err(std::env::VarError::NotUnicode(raw)) => {
                tracing::warn!(var, value = ?raw, "ignoring non-UTF-8 environment variable");
                None
            }
        })
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { var: "PORT", reason: e.to_string() })?,
            None => DEFAULT_PORT,
        };
        let data_dir = lookup("DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let raw_base = lookup("PUBLIC_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}/"));
        let public_base_url = Url::parse(raw_base.trim())
            .map_err(|e| ConfigError::Invalid { var: "PUBLIC_BASE_URL", reason: e.to_string() })?;
        if public_base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid { var: "PUBLIC_BASE_URL", reason: "not a base URL".into() });
        }
        Ok(Self { port, data_dir, public_base_url })
    }
}
