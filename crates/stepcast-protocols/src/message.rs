//! Relay wire messages.
//!
//! The relay is schema-agnostic; these shapes are a contract between the
//! bridge, screenshot producers and consumers only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Sent by the bridge whenever recording is toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingNotice {
    pub active: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// An image to attach to the most recent step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotMessage {
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Tagged<'a> {
    Recording(&'a RecordingNotice),
    Screenshot(&'a ScreenshotMessage),
}

impl RecordingNotice {
    pub fn new(active: bool, timestamp: i64, source: impl Into<String>) -> Self {
        Self {
            active,
            timestamp,
            source: Some(source.into()),
        }
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Tagged::Recording(self))
    }
}

impl ScreenshotMessage {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Tagged::Screenshot(self))
    }

    /// Split a `data:<mime>;base64,<payload>` URL into mime type and payload.
    ///
    /// The mime type defaults to `image/png` when the header does not name one.
    pub fn split_data_url(&self) -> Result<(&str, &str), ProtocolError> {
        let (header, payload) = self
            .data_url
            .split_once(',')
            .ok_or(ProtocolError::MissingField("data url payload"))?;
        let mime = header
            .strip_prefix("data:")
            .and_then(|rest| rest.strip_suffix(";base64"))
            .filter(|m| !m.is_empty())
            .unwrap_or("image/png");
        Ok((mime, payload))
    }
}

/// A decoded message as received by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Screenshot(ScreenshotMessage),
    Recording(RecordingNotice),
    /// Anything else, handed to step formatting as-is.
    Event(Value),
}

impl InboundMessage {
    /// Decode one relayed text frame. Only invalid JSON is an error.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;

        match value.get("type").and_then(Value::as_str) {
            Some("screenshot") => {
                let data_url = value
                    .get("dataUrl")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                match data_url {
                    Some(url) => Ok(Self::Screenshot(ScreenshotMessage::new(url))),
                    None => Ok(Self::Event(value)),
                }
            }
            Some("recording") if value.get("active").is_some_and(Value::is_boolean) => {
                match serde_json::from_value::<RecordingNotice>(value.clone()) {
                    Ok(notice) => Ok(Self::Recording(notice)),
                    Err(_) => Ok(Self::Event(value)),
                }
            }
            _ => Ok(Self::Event(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notice_wire_shape() {
        let notice = RecordingNotice::new(true, 42, "extension");
        let json = notice.to_wire().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "recording");
        assert_eq!(value["active"], true);
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["source"], "extension");
    }

    #[test]
    fn test_screenshot_wire_shape() {
        let shot = ScreenshotMessage::new("data:image/png;base64,AAAA");
        let json = shot.to_wire().unwrap();
        assert_eq!(json, r#"{"type":"screenshot","dataUrl":"data:image/png;base64,AAAA"}"#);
    }

    #[test]
    fn test_parse_screenshot() {
        let msg = InboundMessage::parse(r#"{"type":"screenshot","dataUrl":"data:x"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Screenshot(ScreenshotMessage::new("data:x")));
    }

    #[test]
    fn test_parse_screenshot_without_data_is_event() {
        let msg = InboundMessage::parse(r#"{"type":"screenshot"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Event(_)));
    }

    #[test]
    fn test_parse_recording() {
        let msg = InboundMessage::parse(
            r#"{"type":"recording","active":false,"timestamp":9,"source":"extension"}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::Recording(n) => {
                assert!(!n.active);
                assert_eq!(n.timestamp, 9);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_event_passthrough() {
        let msg = InboundMessage::parse(r#"{"type":"click","label":"Save","timestamp":1}"#).unwrap();
        match msg {
            InboundMessage::Event(v) => assert_eq!(v["label"], "Save"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed() {
        assert!(InboundMessage::parse("{oops").is_err());
        assert!(InboundMessage::parse("").is_err());
    }

    #[test]
    fn test_split_data_url() {
        let shot = ScreenshotMessage::new("data:image/jpeg;base64,QUJD");
        assert_eq!(shot.split_data_url().unwrap(), ("image/jpeg", "QUJD"));

        let bare = ScreenshotMessage::new("data:;base64,QUJD");
        assert_eq!(bare.split_data_url().unwrap().0, "image/png");

        let broken = ScreenshotMessage::new("not-a-data-url");
        assert!(broken.split_data_url().is_err());
    }
}
