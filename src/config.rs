//! Configuration management for judgeval-mcp.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the Judgment API credential.
pub const API_KEY_ENV: &str = "JUDGMENT_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.judgmentlabs.ai";

/// Main configuration structure.
///
/// The API key comes from the `JUDGMENT_API_KEY` environment variable unless
/// the config file provides one. A missing key never aborts startup; the MCP
/// server degrades every request to a fixed error instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Judgment API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// API key (or environment variable name if prefixed with $).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            api_key: None,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("judgeval-mcp").join("config.toml"))
    }

    /// Load configuration from a specific path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the API key: config file entry first (with `$VAR`
    /// indirection), then the `JUDGMENT_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            let resolved = resolve_env(key);
            if !resolved.is_empty() {
                return Some(resolved);
            }
        }

        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

/// Resolve environment variable references (values starting with $).
fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            String::new()
        })
    } else {
        value.to_string()
    }
}
