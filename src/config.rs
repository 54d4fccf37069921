use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// Bearer token to attach to every request. How it is obtained and
    /// refreshed is the auth layer's business, not ours.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            auth_token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_upload_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Shown as the uploader on normalized resources until the backend
    /// starts returning uploader identity.
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
        }
    }
}

fn default_display_name() -> String {
    "You".to_string()
}

impl Config {
    /// Built-in defaults for running without a config file: a local
    /// backend and no auth.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        anyhow::bail!("api.base_url must be an http(s) URL");
    }
    if config.api.timeout_secs == 0 || config.api.upload_timeout_secs == 0 {
        anyhow::bail!("api timeouts must be > 0");
    }
    if config.session.display_name.trim().is_empty() {
        anyhow::bail!("session.display_name must not be empty");
    }

    Ok(config)
}
