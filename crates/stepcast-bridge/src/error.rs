//! Bridge errors.

use thiserror::Error;

use stepcast_link::LinkError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Relay link error: {0}")]
    Link(#[from] LinkError),

    #[error("Bridge has shut down")]
    Stopped,

    #[error("Invalid control message: {0}")]
    InvalidControl(#[from] serde_json::Error),
}
