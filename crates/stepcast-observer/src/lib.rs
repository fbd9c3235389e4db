//! # stepcast Observer
//!
//! Watches interactions on a page and turns the ones worth recording into
//! [`InteractionEvent`](stepcast_protocols::InteractionEvent)s.
//!
//! ## Pipeline
//!
//! ```text
//! DomEvent -> target detection -> label resolution -> debounce -> EventSink
//! ```
//!
//! - Clicks count only on actionable elements (or their nearest actionable
//!   ancestor) and are debounced per label.
//! - Text input is debounced per element; only the settled value is sent.
//! - Selects report the chosen option's text, toggles their checked state.
//! - Labels shorter than the configured minimum are never emitted.
//!
//! The page itself is modelled by [`Document`], an arena DOM that can be
//! loaded from a JSON snapshot and driven by a [`Script`].

mod badge;
pub mod dom;
mod error;
mod label;
mod observer;
mod script;
mod sink;

pub use badge::{BADGE_ID, BADGE_IDLE_TEXT};
pub use dom::{Document, Element, ElementSpec, NodeId, NodeSpec, SelectorList};
pub use error::ObserverError;
pub use label::resolve_label;
pub use observer::{click_target, DomEvent, Observer, Page};
pub use script::{Script, ScriptStep};
pub use sink::EventSink;
