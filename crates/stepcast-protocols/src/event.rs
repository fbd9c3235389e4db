//! Interaction events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::describe;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Kind of user interaction captured by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Input,
    Select,
    Toggle,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::Select => "select",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured record of one user action on a monitored page.
///
/// This is exactly what travels over the relay: the bridge forwards the bare
/// event, never the local `{type: "event", payload}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Normalized human-readable name of the element.
    pub label: String,

    /// Entered text or selected option text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Toggle state for checkboxes and radios.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    /// Milliseconds since epoch, assigned at emission.
    pub timestamp: i64,
}

impl InteractionEvent {
    fn new(kind: EventKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            value: None,
            checked: None,
            timestamp: now_millis(),
        }
    }

    pub fn click(label: impl Into<String>) -> Self {
        Self::new(EventKind::Click, label)
    }

    pub fn input(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Input, label);
        event.value = Some(value.into());
        event
    }

    pub fn select(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Select, label);
        event.value = Some(value.into());
        event
    }

    pub fn toggle(label: impl Into<String>, checked: bool) -> Self {
        let mut event = Self::new(EventKind::Toggle, label);
        event.checked = Some(checked);
        event
    }

    /// Override the emission timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Reproduction-step text for this event, if it has one.
    pub fn step_text(&self) -> Option<String> {
        serde_json::to_value(self).ok().and_then(|v| describe(&v))
    }

    /// Serialize to the JSON text sent over the relay.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_serialization_omits_optional_fields() {
        let event = InteractionEvent::click("Save").with_timestamp(1_700_000_000_000);
        let json = event.to_wire().unwrap();
        assert_eq!(
            json,
            r#"{"type":"click","label":"Save","timestamp":1700000000000}"#
        );
    }

    #[test]
    fn test_toggle_round_trip() {
        let json = r#"{"type":"toggle","label":"Notifications","checked":false,"timestamp":5}"#;
        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Toggle);
        assert_eq!(event.checked, Some(false));
        assert!(event.value.is_none());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"type":"hover","label":"Menu","timestamp":5}"#;
        assert!(serde_json::from_str::<InteractionEvent>(json).is_err());
    }

    #[test]
    fn test_step_text() {
        assert_eq!(
            InteractionEvent::select("Country", "France").step_text().as_deref(),
            Some(r#"Select "France" from "Country""#)
        );
        assert_eq!(
            InteractionEvent::toggle("Notifications", true).step_text().as_deref(),
            Some(r#"Enable "Notifications""#)
        );
    }

    #[test]
    fn test_timestamp_assigned() {
        let before = now_millis();
        let event = InteractionEvent::input("Email", "a@b.com");
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EventKind::Select.to_string(), "select");
    }
}
