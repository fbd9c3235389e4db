//! Relay errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Relay is already running on {0}")]
    AlreadyRunning(std::net::SocketAddr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
