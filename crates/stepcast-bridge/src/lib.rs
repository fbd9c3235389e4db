//! # stepcast Bridge
//!
//! Owns the one relay connection of a recording context and decides which
//! captured events reach it.
//!
//! Observers hand events to a [`BridgeHandle`] (it implements
//! [`EventSink`](stepcast_observer::EventSink)). Events are forwarded as
//! bare JSON only while recording; otherwise they are dropped or, under
//! [`DeliveryPolicy::Queue`](stepcast_config::DeliveryPolicy), held until
//! the link returns.
//!
//! ```text
//!            toggle                 link down (queue)
//!   Idle ------------> Recording --------------------> Suspended
//!    ^  <------------     |    <--------------------     |
//!    |      toggle        |          link up
//!    | link up            | link down (drop)
//!  Offline <--------------+
//!
//! Toggles are ignored in `Offline` and `Suspended`.
//! ```

mod bridge;
mod error;
mod outbox;
mod state;

pub use bridge::{spawn, BridgeHandle, ControlReply};
pub use error::BridgeError;
pub use outbox::Outbox;
pub use state::RecordingState;
