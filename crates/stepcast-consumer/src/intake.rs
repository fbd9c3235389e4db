//! Relayed message handling: decode, deduplicate, format, store.

use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use stepcast_config::ConsumerConfig;
use stepcast_protocols::{describe, now_millis, InboundMessage};

use crate::dedup::{dedup_key, DedupWindow};
use crate::draft::Draft;

/// What a relayed message changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftUpdate {
    StepAdded { id: Uuid, text: String },
    ScreenshotAttached { step: Uuid },
    Recording { active: bool },
}

/// Turns relayed text frames into draft changes.
///
/// Nothing here fails: malformed, duplicate and unformattable messages are
/// skipped and logged at debug level.
#[derive(Debug)]
pub struct Intake {
    dedup: DedupWindow,
    recording: bool,
}

impl Intake {
    pub fn new(config: &ConsumerConfig) -> Self {
        Self {
            dedup: DedupWindow::new(config.dedup_window(), config.dedup_capacity),
            recording: false,
        }
    }

    /// Whether the last recording notice said recording is on.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn handle(&mut self, text: &str, draft: &mut Draft) -> Option<DraftUpdate> {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Discarding relayed message: {}", e);
                return None;
            }
        };

        match message {
            InboundMessage::Screenshot(shot) => match draft.attach_to_last(shot.data_url) {
                Some(_) => draft
                    .last_step()
                    .map(|step| DraftUpdate::ScreenshotAttached { step: step.id }),
                None => {
                    debug!("Screenshot received before any step");
                    None
                }
            },
            InboundMessage::Recording(notice) => {
                self.recording = notice.active;
                if notice.active && draft.recording_start.is_none() {
                    let start = if notice.timestamp > 0 {
                        notice.timestamp
                    } else {
                        now_millis()
                    };
                    draft.recording_start = Some(start);
                }
                debug!(active = notice.active, "Recording notice");
                Some(DraftUpdate::Recording {
                    active: notice.active,
                })
            }
            InboundMessage::Event(payload) => self.append_event(&payload, draft),
        }
    }

    fn append_event(&mut self, payload: &Value, draft: &mut Draft) -> Option<DraftUpdate> {
        if let Some(key) = dedup_key(payload) {
            if !self.dedup.admit(&key) {
                trace!(key = %key, "Duplicate event suppressed");
                return None;
            }
        }

        let Some(text) = describe(payload) else {
            trace!("Event has no step text");
            return None;
        };

        let timestamp = draft.timestamps_enabled.then(|| {
            payload
                .get("timestamp")
                .and_then(Value::as_i64)
                .filter(|t| *t != 0)
                .unwrap_or_else(now_millis)
        });
        let id = draft.append_step(text.clone(), timestamp);
        debug!(step = %text, "Step added");
        Some(DraftUpdate::StepAdded { id, text })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn intake() -> Intake {
        Intake::new(&ConsumerConfig::default())
    }

    fn step_text(update: Option<DraftUpdate>) -> Option<String> {
        match update? {
            DraftUpdate::StepAdded { text, .. } => Some(text),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_formats_each_kind() {
        let mut intake = intake();
        let mut draft = Draft::new();
        let cases = [
            (r#"{"type":"click","label":"Save"}"#, r#"Click "Save""#),
            (
                r#"{"type":"input","label":"Email","value":"a@b.com"}"#,
                r#"Enter "a@b.com" into "Email""#,
            ),
            (
                r#"{"type":"select","label":"Country","value":"France"}"#,
                r#"Select "France" from "Country""#,
            ),
            (
                r#"{"type":"toggle","label":"Notifications","checked":true}"#,
                r#"Enable "Notifications""#,
            ),
            (
                r#"{"type":"toggle","label":"Notifications","checked":false}"#,
                r#"Disable "Notifications""#,
            ),
        ];
        for (message, expected) in cases {
            let text = step_text(intake.handle(message, &mut draft));
            assert_eq!(text.as_deref(), Some(expected), "{}", message);
        }
        assert_eq!(draft.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_and_unformattable_are_skipped() {
        let mut intake = intake();
        let mut draft = Draft::new();

        assert_eq!(intake.handle("{not json", &mut draft), None);
        assert_eq!(intake.handle(r#"{"type":"hover","label":"Menu"}"#, &mut draft), None);
        assert_eq!(intake.handle(r#"{"type":"click"}"#, &mut draft), None);
        assert!(draft.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_within_window_yields_one_step() {
        let mut intake = intake();
        let mut draft = Draft::new();
        let message = r#"{"type":"click","label":"Save","timestamp":1700000000000}"#;

        assert!(intake.handle(message, &mut draft).is_some());
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(intake.handle(message, &mut draft).is_none());
        assert_eq!(draft.len(), 1);

        tokio::time::advance(Duration::from_millis(750)).await;
        assert!(intake.handle(message, &mut draft).is_some());
        assert_eq!(draft.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_screenshot_attaches_to_last_step() {
        let mut intake = intake();
        let mut draft = Draft::new();
        let shot = r#"{"type":"screenshot","dataUrl":"data:image/png;base64,AAAA"}"#;

        assert_eq!(intake.handle(shot, &mut draft), None);

        intake.handle(r#"{"type":"click","label":"One"}"#, &mut draft);
        intake.handle(r#"{"type":"click","label":"Two"}"#, &mut draft);
        let last = draft.last_step().unwrap().id;
        assert_eq!(
            intake.handle(shot, &mut draft),
            Some(DraftUpdate::ScreenshotAttached { step: last })
        );
        assert_eq!(draft.len(), 2);
        assert_eq!(draft.steps[1].screenshots.len(), 1);
        assert!(draft.steps[0].screenshots.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_notice_never_becomes_a_step() {
        let mut intake = intake();
        let mut draft = Draft::new();

        let update = intake.handle(
            r#"{"type":"recording","active":true,"timestamp":5000,"source":"extension"}"#,
            &mut draft,
        );
        assert_eq!(update, Some(DraftUpdate::Recording { active: true }));
        assert!(intake.is_recording());
        assert_eq!(draft.recording_start, Some(5000));

        intake.handle(r#"{"type":"recording","active":false,"timestamp":9000}"#, &mut draft);
        assert!(!intake.is_recording());
        // The start of the session is kept across pauses.
        intake.handle(r#"{"type":"recording","active":true,"timestamp":12000}"#, &mut draft);
        assert_eq!(draft.recording_start, Some(5000));
        assert!(draft.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timestamps() {
        let mut intake = intake();
        let mut draft = Draft::new();

        intake.handle(r#"{"type":"click","label":"Save","timestamp":42}"#, &mut draft);
        assert_eq!(draft.steps[0].timestamp, Some(42));

        intake.handle(r#"{"type":"click","label":"Open"}"#, &mut draft);
        assert!(draft.steps[1].timestamp.unwrap() > 42);

        draft.timestamps_enabled = false;
        intake.handle(r#"{"type":"click","label":"Close","timestamp":43}"#, &mut draft);
        assert_eq!(draft.steps[2].timestamp, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_step_requests_focus() {
        let mut intake = intake();
        let mut draft = Draft::new();
        let Some(DraftUpdate::StepAdded { id, .. }) =
            intake.handle(r#"{"type":"click","label":"Save"}"#, &mut draft)
        else {
            panic!("expected a step");
        };
        assert_eq!(draft.take_focus_request(), Some(id));
    }
}
