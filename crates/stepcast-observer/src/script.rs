//! Scripted page interactions.
//!
//! A [`Script`] replays a list of user actions against an observed page,
//! mutating the [`Document`](crate::Document) the way a browser would and
//! dispatching the matching [`DomEvent`]s. Used by the `record` command to
//! drive the pipeline without a browser.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{NodeId, SelectorList};
use crate::error::ObserverError;
use crate::observer::{DomEvent, Observer};

/// One scripted action. Targets are selector lists; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Click {
        target: String,
    },
    /// Focus the field and type `text` one character at a time.
    Type {
        target: String,
        text: String,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Pick the option whose value is `value`.
    Select {
        target: String,
        value: String,
    },
    Check {
        target: String,
        checked: bool,
    },
    Focus {
        target: String,
    },
    Blur {
        target: String,
    },
    Wait {
        ms: u64,
    },
}

/// An ordered list of [`ScriptStep`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    pub fn from_json(json: &str) -> Result<Self, ObserverError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order against `observer`'s page.
    ///
    /// Stops at the first step whose target cannot be found.
    pub async fn play(&self, observer: &Observer) -> Result<(), ObserverError> {
        for (index, step) in self.steps.iter().enumerate() {
            debug!(step = index, ?step, "Playing script step");
            play_step(observer, step).await?;
        }
        Ok(())
    }
}

fn resolve(observer: &Observer, target: &str) -> Result<NodeId, ObserverError> {
    let selectors: SelectorList = target.parse()?;
    observer
        .page()
        .read()
        .find(&selectors)
        .ok_or_else(|| ObserverError::NoMatch(target.to_string()))
}

async fn play_step(observer: &Observer, step: &ScriptStep) -> Result<(), ObserverError> {
    match step {
        ScriptStep::Click { target } => {
            let node = resolve(observer, target)?;
            observer.handle(DomEvent::Click(node));
        }
        ScriptStep::Type {
            target,
            text,
            delay_ms,
        } => {
            let node = resolve(observer, target)?;
            observer.handle(DomEvent::FocusIn(node));

            let mut typed = String::with_capacity(text.len());
            for ch in text.chars() {
                typed.push(ch);
                observer.page().write().set_value(node, &typed);
                observer.handle(DomEvent::Input(node));
                if *delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
            }
        }
        ScriptStep::Select { target, value } => {
            let node = resolve(observer, target)?;
            let found = observer.page().write().select_option(node, value);
            if !found {
                return Err(ObserverError::NoMatch(format!("{} option '{}'", target, value)));
            }
            observer.handle(DomEvent::Change(node));
        }
        ScriptStep::Check { target, checked } => {
            let node = resolve(observer, target)?;
            observer.page().write().set_checked(node, *checked);
            observer.handle(DomEvent::Click(node));
            observer.handle(DomEvent::Change(node));
        }
        ScriptStep::Focus { target } => {
            let node = resolve(observer, target)?;
            observer.handle(DomEvent::FocusIn(node));
        }
        ScriptStep::Blur { target } => {
            let node = resolve(observer, target)?;
            observer.handle(DomEvent::FocusOut(node));
        }
        ScriptStep::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::RwLock;
    use tokio::sync::mpsc;

    use stepcast_config::ObserverConfig;
    use stepcast_protocols::{EventKind, InteractionEvent};

    use super::*;
    use crate::dom::Document;

    const PAGE: &str = r#"{
        "tag": "body",
        "children": [
            { "tag": "label", "attrs": { "for": "email" }, "children": ["Email"] },
            { "tag": "input", "attrs": { "id": "email", "type": "email" } },
            { "tag": "label", "attrs": { "for": "country" }, "children": ["Country"] },
            { "tag": "select", "attrs": { "id": "country" }, "children": [
                { "tag": "option", "attrs": { "value": "de" }, "children": ["Germany"] },
                { "tag": "option", "attrs": { "value": "fr" }, "children": ["France"] }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "id": "notify", "type": "checkbox" } },
                "Notifications"
            ]},
            { "tag": "button", "attrs": { "class": "btn primary" }, "children": ["Save"] }
        ]
    }"#;

    fn setup() -> (Observer, mpsc::UnboundedReceiver<InteractionEvent>) {
        let page = Arc::new(RwLock::new(Document::from_json(PAGE).unwrap()));
        let (tx, rx) = mpsc::unbounded_channel();
        (Observer::new(ObserverConfig::default(), page, Arc::new(tx)), rx)
    }

    #[test]
    fn test_parse_script() {
        let script = Script::from_json(
            r##"[
                {"action": "type", "target": "#email", "text": "a@b.com", "delay_ms": 50},
                {"action": "select", "target": "#country", "value": "fr"},
                {"action": "check", "target": "#notify", "checked": true},
                {"action": "wait", "ms": 700},
                {"action": "click", "target": "button.primary"}
            ]"##,
        )
        .unwrap();

        assert_eq!(script.len(), 5);
        assert_eq!(
            script.steps[0],
            ScriptStep::Type {
                target: "#email".to_string(),
                text: "a@b.com".to_string(),
                delay_ms: 50,
            }
        );
        assert_eq!(script.steps[3], ScriptStep::Wait { ms: 700 });
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Script::from_json(r#"[{"action": "hover", "target": "a"}]"#).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_full_form() {
        let (observer, mut rx) = setup();
        let script = Script::new(vec![
            ScriptStep::Type {
                target: "#email".to_string(),
                text: "a@b.com".to_string(),
                delay_ms: 40,
            },
            ScriptStep::Wait { ms: 700 },
            ScriptStep::Select {
                target: "#country".to_string(),
                value: "fr".to_string(),
            },
            ScriptStep::Check {
                target: "#notify".to_string(),
                checked: true,
            },
            ScriptStep::Click {
                target: "button.primary".to_string(),
            },
        ]);

        script.play(&observer).await.unwrap();

        let steps: Vec<String> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .filter_map(InteractionEvent::step_text)
        .collect();
        assert_eq!(
            steps,
            vec![
                r#"Enter "a@b.com" into "Email""#,
                r#"Select "France" from "Country""#,
                r#"Enable "Notifications""#,
                r#"Click "Save""#,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_leaves_focus_value() {
        let (observer, mut rx) = setup();
        let script = Script::new(vec![ScriptStep::Type {
            target: "#email".to_string(),
            text: "hi there".to_string(),
            delay_ms: 0,
        }]);

        script.play(&observer).await.unwrap();
        let email = observer.page().read().get_element_by_id("email").unwrap();
        assert_eq!(observer.focus_value(email).as_deref(), Some(""));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Input);
        assert_eq!(event.value.as_deref(), Some("hi there"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_target_stops_playback() {
        let (observer, _rx) = setup();
        let script = Script::new(vec![
            ScriptStep::Click {
                target: "#missing".to_string(),
            },
            ScriptStep::Click {
                target: "button".to_string(),
            },
        ]);

        let err = script.play(&observer).await.unwrap_err();
        assert!(matches!(err, ObserverError::NoMatch(t) if t == "#missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_option_is_an_error() {
        let (observer, _rx) = setup();
        let script = Script::new(vec![ScriptStep::Select {
            target: "#country".to_string(),
            value: "xx".to_string(),
        }]);
        assert!(matches!(
            script.play(&observer).await,
            Err(ObserverError::NoMatch(_))
        ));
    }
}
