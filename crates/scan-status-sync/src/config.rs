/*
[INPUT]:  YAML configuration file, SCAN_STATUS_* environment variables
[OUTPUT]: Validated SyncConfig
[POS]:    Configuration layer - endpoints, update mode and timing
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use scan_status_adapter::ClientConfig;
use serde::{Deserialize, Serialize};
use url::Url;

const ENV_PREFIX: &str = "SCAN_STATUS";

/// How the service keeps its snapshot current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Server push over the live-update channel.
    #[default]
    Stream,
    /// Periodic full task-list fetches.
    Poll,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stream" => Ok(SyncMode::Stream),
            "poll" => Ok(SyncMode::Poll),
            other => Err(format!("unknown sync mode '{other}' (expected stream or poll)")),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            SyncMode::Stream => "stream",
            SyncMode::Poll => "poll",
        })
    }
}

/// Top-level configuration for the task status service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// REST base URL of the scan server
    pub api_base_url: String,
    /// WebSocket endpoint of the live task-status stream
    pub stream_url: String,
    pub mode: SyncMode,
    /// Wait before reopening a failed stream
    pub reconnect_delay_secs: u64,
    /// Period between polling fetches
    pub poll_interval_secs: u64,
    /// Number of recent tasks requested per update
    pub task_limit: u32,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            stream_url: "ws://127.0.0.1:8000/api/v1/tasks/stream".to_string(),
            mode: SyncMode::Stream,
            reconnect_delay_secs: 10,
            poll_interval_secs: 6,
            task_limit: 50,
            request_timeout_secs: 15,
        }
    }
}

impl SyncConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {path}"))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse yaml config")?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then `SCAN_STATUS_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Self::default()).context("encode defaults")?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("build layered config")?
            .try_deserialize()
            .context("deserialize config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let api = Url::parse(&self.api_base_url)
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(api.scheme(), "http" | "https") {
            bail!("api_base_url must use http or https, got '{}'", api.scheme());
        }
        let stream = Url::parse(&self.stream_url)
            .with_context(|| format!("invalid stream_url '{}'", self.stream_url))?;
        if !matches!(stream.scheme(), "ws" | "wss") {
            bail!("stream_url must use ws or wss, got '{}'", stream.scheme());
        }
        if self.reconnect_delay_secs == 0 {
            bail!("reconnect_delay_secs must be greater than zero");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.task_limit == 0 {
            bail!("task_limit must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP settings for the REST client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.request_timeout(),
            ..ClientConfig::default()
        }
    }
}
