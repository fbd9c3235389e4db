//! Consumer errors.
//!
//! Relayed messages never produce these; they come from draft files,
//! screenshot export and link setup.

use thiserror::Error;

use stepcast_link::LinkError;
use stepcast_protocols::ProtocolError;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Relay link error: {0}")]
    Link(#[from] LinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Draft format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid screenshot: {0}")]
    Screenshot(#[from] ProtocolError),

    #[error("Screenshot decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}
