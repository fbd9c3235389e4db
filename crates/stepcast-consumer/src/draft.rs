//! The bug-report draft that recorded steps accumulate into.

use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};
use stepcast_protocols::ScreenshotMessage;
use tokio::fs;
use uuid::Uuid;

use crate::error::ConsumerError;

/// An image attached to a step, kept as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: Uuid,
    pub data_url: String,
}

impl Screenshot {
    fn new(data_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_url: data_url.into(),
        }
    }
}

/// One reproduction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub text: String,
    /// Event time in epoch milliseconds, when timestamps are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
}

impl Step {
    pub fn new(text: impl Into<String>, timestamp: Option<i64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp,
            screenshots: Vec::new(),
        }
    }
}

/// Editable bug report: header fields plus an ordered step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// When the current recording started, in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_start: Option<i64>,
    #[serde(default = "default_true")]
    pub timestamps_enabled: bool,
    #[serde(skip)]
    focus_request: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            title: String::new(),
            environment: String::new(),
            platform: String::new(),
            account: String::new(),
            actual: String::new(),
            expected: String::new(),
            steps: Vec::new(),
            recording_start: None,
            timestamps_enabled: true,
            focus_request: None,
        }
    }
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: Uuid) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Append a step and ask for its input to be focused.
    pub fn append_step(&mut self, text: impl Into<String>, timestamp: Option<i64>) -> Uuid {
        let step = Step::new(text, timestamp);
        let id = step.id;
        self.steps.push(step);
        self.focus_request = Some(id);
        id
    }

    /// Insert an empty step after `index` (clamped to the end).
    pub fn insert_after(&mut self, index: usize) -> Uuid {
        let step = Step::new("", None);
        let id = step.id;
        let at = (index + 1).min(self.steps.len());
        self.steps.insert(at, step);
        self.focus_request = Some(id);
        id
    }

    pub fn update_step(&mut self, id: Uuid, text: impl Into<String>) -> bool {
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) => {
                step.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_step(&mut self, id: Uuid) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        self.steps.len() != before
    }

    /// Move the step at `from` to position `to`.
    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        if from >= self.steps.len() || to >= self.steps.len() {
            return false;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        true
    }

    pub fn add_screenshot(&mut self, step_id: Uuid, data_url: impl Into<String>) -> Option<Uuid> {
        let step = self.steps.iter_mut().find(|s| s.id == step_id)?;
        let shot = Screenshot::new(data_url);
        let id = shot.id;
        step.screenshots.push(shot);
        Some(id)
    }

    /// Attach an image to the most recently added step. `None` when there
    /// are no steps yet.
    pub fn attach_to_last(&mut self, data_url: impl Into<String>) -> Option<Uuid> {
        let step_id = self.steps.last()?.id;
        self.add_screenshot(step_id, data_url)
    }

    pub fn remove_screenshot(&mut self, step_id: Uuid, shot_id: Uuid) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        let before = step.screenshots.len();
        step.screenshots.retain(|shot| shot.id != shot_id);
        step.screenshots.len() != before
    }

    /// The step whose input should be focused next, at most once.
    pub fn take_focus_request(&mut self) -> Option<Uuid> {
        self.focus_request.take()
    }

    pub fn clear_steps(&mut self) {
        self.steps.clear();
        self.focus_request = None;
    }

    /// Plain-text report, sections separated by blank lines.
    pub fn export_text(&self) -> String {
        let mut sections: Vec<Vec<String>> = Vec::new();
        let header = [
            ("Title", &self.title),
            ("Environment", &self.environment),
            ("Platform", &self.platform),
            ("Account", &self.account),
        ];
        for (name, value) in header {
            if !value.is_empty() {
                sections.push(vec![format!("{}: {}", name, value)]);
            }
        }

        if !self.steps.is_empty() {
            let mut lines = vec!["Steps:".to_string()];
            for (index, step) in self.steps.iter().enumerate() {
                let elapsed = self
                    .elapsed_secs(step)
                    .map(|secs| format!(" ({})", format_elapsed(secs)))
                    .unwrap_or_default();
                lines.push(format!("{}. {}{}", index + 1, step.text, elapsed).trim().to_string());
                for shot in 1..=step.screenshots.len() {
                    lines.push(format!("   - Screenshot: {}", screenshot_name(index + 1, shot)));
                }
            }
            sections.push(lines);
        }

        if !self.actual.is_empty() {
            sections.push(vec!["Actual Result:".to_string(), self.actual.clone()]);
        }
        if !self.expected.is_empty() {
            sections.push(vec!["Expected Result:".to_string(), self.expected.clone()]);
        }

        sections
            .iter()
            .map(|lines| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn elapsed_secs(&self, step: &Step) -> Option<i64> {
        if !self.timestamps_enabled {
            return None;
        }
        let start = self.recording_start.filter(|t| *t != 0)?;
        let at = step.timestamp.filter(|t| *t != 0)?;
        Some(at.saturating_sub(start).max(0) / 1000)
    }

    pub async fn load(path: &Path) -> Result<Self, ConsumerError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConsumerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Decode every screenshot into `dir` as `step-N-M.png`, numbered the
    /// way [`export_text`](Self::export_text) refers to them.
    pub async fn write_screenshots(&self, dir: &Path) -> Result<Vec<PathBuf>, ConsumerError> {
        fs::create_dir_all(dir).await?;
        let mut written = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            for (shot_index, shot) in step.screenshots.iter().enumerate() {
                let message = ScreenshotMessage::new(shot.data_url.as_str());
                let (_, payload) = message.split_data_url()?;
                let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
                let path = dir.join(screenshot_name(index + 1, shot_index + 1));
                fs::write(&path, bytes).await?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

fn screenshot_name(step: usize, shot: usize) -> String {
    format!("step-{}-{}.png", step, shot)
}

/// `mm:ss`, minutes unbounded.
fn format_elapsed(secs: i64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
