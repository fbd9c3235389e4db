//! Relay connection lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one endpoint's relay connection.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected -> Connecting ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }
}

/// Why `raw` cannot be used to reach a relay, or `None` when it can.
///
/// Only `ws://` and `wss://` URLs with a host are accepted.
pub fn relay_url_problem(raw: &str) -> Option<String> {
    match url::Url::parse(raw) {
        Ok(url) if !matches!(url.scheme(), "ws" | "wss") => {
            Some(format!("unsupported scheme '{}'", url.scheme()))
        }
        Ok(url) if url.host_str().is_none_or(str::is_empty) => Some("missing host".to_string()),
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}
