//! Observer errors.
//!
//! None of these cross the observer's event boundary; they only surface
//! while loading pages and scripts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("No element matches '{0}'")]
    NoMatch(String),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
