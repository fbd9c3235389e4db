//! # stepcast Consumer
//!
//! Connects to the relay as an ordinary peer and turns what it hears into
//! reproduction steps:
//!
//! - screenshots attach to the most recent step
//! - recording notices update the recording flag and session start
//! - everything else is deduplicated, formatted and appended as a step
//!
//! Malformed or unformattable messages are skipped without surfacing an
//! error. The [`Draft`] holding the steps can be edited, exported as text
//! and saved to disk.

mod consumer;
mod dedup;
mod draft;
mod error;
mod intake;

pub use consumer::{load_draft, spawn, ConsumerHandle};
pub use dedup::{dedup_key, DedupWindow};
pub use draft::{Draft, Screenshot, Step};
pub use error::ConsumerError;
pub use intake::{DraftUpdate, Intake};
