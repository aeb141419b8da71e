//! Lutron HomeWorks gateway configuration

use std::time::Duration;

use hagw_core::LinkSettings;
use serde::{Deserialize, Serialize};

/// Connection and login settings for one HomeWorks processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LutronConfig {
    /// Processor host name or IP address
    #[serde(default = "default_host")]
    pub host: String,
    /// Telnet port
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Connect timeout
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Pause after a failed connect attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause after the processor rejected the credentials
    #[serde(default = "default_invalid_login_delay_ms")]
    pub invalid_login_delay_ms: u64,
    /// Maximum age of a queued command (0 = never expires)
    #[serde(default = "default_command_ttl_ms")]
    pub command_ttl_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    23
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_retry_delay_ms() -> u64 {
    15_000
}

fn default_invalid_login_delay_ms() -> u64 {
    60_000
}

fn default_command_ttl_ms() -> u64 {
    60_000
}

impl Default for LutronConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            invalid_login_delay_ms: default_invalid_login_delay_ms(),
            command_ttl_ms: default_command_ttl_ms(),
        }
    }
}

impl LutronConfig {
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn invalid_login_delay(&self) -> Duration {
        Duration::from_millis(self.invalid_login_delay_ms)
    }

    pub fn command_ttl(&self) -> Option<Duration> {
        (self.command_ttl_ms > 0).then(|| Duration::from_millis(self.command_ttl_ms))
    }
}
