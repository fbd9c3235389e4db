//! Relay link errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid relay URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Relay link is not connected")]
    NotConnected,

    #[error("Relay link is closed")]
    Closed,
}
