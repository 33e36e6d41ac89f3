/*
[INPUT]:  YAML configuration file and WALLEX_* environment variables
[OUTPUT]: Parsed CLI configuration and adapter configs derived from it
[POS]:    Configuration layer - client setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use wallex_adapter::http::DEFAULT_BASE_URL;
use wallex_adapter::{ChannelConfig, ClientConfig, Credentials};

pub const API_KEY_ENV: &str = "WALLEX_API_KEY";
pub const BASE_URL_ENV: &str = "WALLEX_BASE_URL";

/// Top-level configuration for the Wallex CLI
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    /// API key for authenticated endpoints
    #[serde(default)]
    pub api_key: Option<String>,
    /// REST and socket.io base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub http: HttpTimeouts,
    #[serde(default)]
    pub stream: StreamTimeouts,
}

/// Request timeouts in seconds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HttpTimeouts {
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Streaming waits in seconds; 0 waits without bound
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StreamTimeouts {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_message_timeout_secs")]
    pub message_timeout_secs: u64,
}

impl Default for StreamTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            message_timeout_secs: default_message_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_message_timeout_secs() -> u64 {
    60
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            http: HttpTimeouts::default(),
            stream: StreamTimeouts::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist; the default path is optional. Environment
    /// variables win over file values.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from `lookup` (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|value| !value.is_empty()) {
            self.api_key = Some(api_key);
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.is_empty()) {
            self.base_url = base_url;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.http.timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            bail!("http timeouts must be greater than zero");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }

    pub fn channel_config(&self, once: bool) -> ChannelConfig {
        ChannelConfig {
            base_url: self.base_url.clone(),
            once,
            connect_timeout: optional_secs(self.stream.connect_timeout_secs),
            message_timeout: optional_secs(self.stream.message_timeout_secs),
        }
    }

    /// Credentials for authenticated commands
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Credentials::new(key)),
            _ => bail!("api key required: set api_key in the config file or {API_KEY_ENV}"),
        }
    }
}

/// `<config dir>/wallex/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wallex").join("config.yaml"))
}

fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
