use std::time::Duration;

use hagw_core::LinkSettings;
use serde::{Deserialize, Serialize};

/// Connection settings for one AMX NI controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmxConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// 0 keeps queued commands forever
    #[serde(default = "default_command_ttl_ms")]
    pub command_ttl_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    50_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_retry_delay_ms() -> u64 {
    15_000
}

fn default_command_ttl_ms() -> u64 {
    60_000
}

impl Default for AmxConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            command_ttl_ms: default_command_ttl_ms(),
        }
    }
}

impl AmxConfig {
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn command_ttl(&self) -> Option<Duration> {
        (self.command_ttl_ms > 0).then(|| Duration::from_millis(self.command_ttl_ms))
    }
}
