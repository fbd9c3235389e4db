//! # stepcast Link
//!
//! Reconnecting WebSocket client used by every endpoint that talks to the
//! relay. Each owner gets its own supervisor task, which:
//!
//! - connects immediately on [`spawn`]
//! - publishes `Disconnected -> Connecting -> Connected` through a watch channel
//! - retries forever after a fixed backoff, with at most one pending retry
//! - holds exactly one live connection at a time
//!
//! ## Usage
//!
//! ```ignore
//! let config = LinkConfig::new("consumer", "ws://localhost:3001", Duration::from_secs(2));
//! let (link, mut events) = stepcast_link::spawn(config)?;
//! while let Some(event) = events.recv().await {
//!     if let LinkEvent::Message(text) = event {
//!         // ...
//!     }
//! }
//! ```

mod error;
mod link;

pub use error::LinkError;
pub use link::{spawn, LinkConfig, LinkEvent, LinkHandle};
