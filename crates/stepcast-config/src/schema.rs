//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port shared by the relay and its clients unless configured otherwise.
pub const DEFAULT_PORT: u16 = 3001;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub consumer: ConsumerConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_host")]
    pub host: String,

    /// Listening port; 0 binds an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_port(),
        }
    }
}

impl RelayConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_relay_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

/// What the bridge does with events it cannot forward right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPolicy {
    /// Discard silently.
    #[default]
    Drop,
    /// Buffer up to `capacity` events while the link is down during a
    /// recording, evicting the oldest, and flush on reconnect.
    Queue { capacity: usize },
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_relay_url")]
    pub url: String,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default)]
    pub delivery: DeliveryPolicy,

    /// Value of `source` in recording notices.
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            delivery: DeliveryPolicy::default(),
            source: default_source(),
        }
    }
}

impl BridgeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

fn default_relay_url() -> String {
    format!("ws://localhost:{}", DEFAULT_PORT)
}

fn default_source() -> String {
    "extension".to_string()
}

/// Consumer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_consumer_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,

    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Stamp new steps with their event time.
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Where the step draft is saved, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_path: Option<PathBuf>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            host: default_consumer_host(),
            port: default_port(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            dedup_window_ms: default_dedup_window_ms(),
            dedup_capacity: default_dedup_capacity(),
            timestamps: true,
            draft_path: None,
        }
    }
}

impl ConsumerConfig {
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

fn default_consumer_host() -> String {
    "localhost".to_string()
}

fn default_dedup_window_ms() -> u64 {
    750
}

fn default_dedup_capacity() -> usize {
    50
}

fn default_true() -> bool {
    true
}

/// Observer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_click_debounce_ms")]
    pub click_debounce_ms: u64,

    #[serde(default = "default_input_debounce_ms")]
    pub input_debounce_ms: u64,

    #[serde(default = "default_min_label_len")]
    pub min_label_len: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            click_debounce_ms: default_click_debounce_ms(),
            input_debounce_ms: default_input_debounce_ms(),
            min_label_len: default_min_label_len(),
        }
    }
}

impl ObserverConfig {
    pub fn click_debounce(&self) -> Duration {
        Duration::from_millis(self.click_debounce_ms)
    }

    pub fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }
}

fn default_click_debounce_ms() -> u64 {
    300
}

fn default_input_debounce_ms() -> u64 {
    600
}

fn default_min_label_len() -> usize {
    2
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files (default: ~/.stepcast/logs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_files: default_max_log_files(),
        }
    }
}

fn default_max_log_files() -> usize {
    14
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
