//! # stepcast Protocols
//!
//! Message definitions shared by every stage of the recorder pipeline.
//! Contains only types and small pure helpers - no I/O.
//!
//! ## Contents
//!
//! - [`InteractionEvent`] - one captured user action
//! - [`InboundMessage`] - what a consumer may receive from the relay
//! - [`RecordingNotice`] / [`ScreenshotMessage`] - auxiliary wire messages
//! - [`ControlRequest`] / [`BridgeStatus`] - the bridge's local control plane
//! - [`ConnectionState`] - lifecycle of a relay connection
//! - [`describe`] / [`normalize_text`] - step-text formatting

pub mod connection;
pub mod control;
pub mod error;
pub mod event;
pub mod format;
pub mod message;

pub use connection::{relay_url_problem, ConnectionState};
pub use control::{BridgeStatus, ControlNotice, ControlRequest, PingReply};
pub use error::ProtocolError;
pub use event::{now_millis, EventKind, InteractionEvent};
pub use format::{describe, normalize_text};
pub use message::{InboundMessage, RecordingNotice, ScreenshotMessage};
