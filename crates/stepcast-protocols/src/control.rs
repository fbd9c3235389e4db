//! Bridge control plane.
//!
//! Local request/response messages between UIs or observers and the bridge.
//! These never travel over the relay.

use serde::{Deserialize, Serialize};

use crate::event::InteractionEvent;

/// Requests accepted by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlRequest {
    /// Liveness check, answered with a [`PingReply`].
    Ping,
    /// Answered with the current [`BridgeStatus`].
    GetStatus,
    /// An observer-captured event. Fire-and-forget.
    Event { payload: InteractionEvent },
    /// Flip recording on or off, answered with the resulting [`BridgeStatus`].
    ToggleRecording,
}

/// Snapshot of the bridge as seen by a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub connected: bool,
    pub recording: bool,
}

/// Reply to [`ControlRequest::Ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    pub ok: bool,
    #[serde(flatten)]
    pub status: BridgeStatus,
}

/// Unsolicited notices pushed to status listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlNotice {
    Status { connected: bool, recording: bool },
}

impl From<BridgeStatus> for ControlNotice {
    fn from(status: BridgeStatus) -> Self {
        Self::Status {
            connected: status.connected,
            recording: status.recording,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let req: ControlRequest = serde_json::from_str(r#"{"type":"toggleRecording"}"#).unwrap();
        assert_eq!(req, ControlRequest::ToggleRecording);

        let req: ControlRequest = serde_json::from_str(r#"{"type":"getStatus"}"#).unwrap();
        assert_eq!(req, ControlRequest::GetStatus);
    }

    #[test]
    fn test_event_envelope() {
        let json = r#"{"type":"event","payload":{"type":"click","label":"Save","timestamp":1}}"#;
        let req: ControlRequest = serde_json::from_str(json).unwrap();
        match req {
            ControlRequest::Event { payload } => assert_eq!(payload.label, "Save"),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_ping_reply_is_flat() {
        let reply = PingReply {
            ok: true,
            status: BridgeStatus {
                connected: true,
                recording: false,
            },
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"ok":true,"connected":true,"recording":false}"#);
    }

    #[test]
    fn test_status_notice() {
        let notice = ControlNotice::from(BridgeStatus {
            connected: false,
            recording: false,
        });
        let json = serde_json::to_string(&notice).unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""connected":false"#));
    }
}
