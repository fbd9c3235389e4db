//! Near-duplicate suppression for relayed events.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

const KEY_FIELDS: [&str; 5] = ["type", "label", "value", "checked", "timestamp"];

/// Composite key of an event's identifying fields, joined with `|`.
///
/// Absent and null fields are skipped. `None` when no field is present, in
/// which case the event is never deduplicated.
pub fn dedup_key(payload: &Value) -> Option<String> {
    let parts: Vec<String> = KEY_FIELDS
        .iter()
        .filter_map(|field| match payload.get(*field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

/// Remembers recently seen keys for a fixed window.
///
/// Entries older than the window are forgotten on every check. When more
/// than `capacity` keys are live at once, the oldest are forgotten early, so
/// a very busy stream can let a repeat through.
#[derive(Debug)]
pub struct DedupWindow {
    window: Duration,
    capacity: usize,
    seen: HashMap<String, Instant>,
    order: VecDeque<(String, Instant)>,
}

impl DedupWindow {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            seen: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Record `key` and report whether it is new within the window.
    pub fn admit(&mut self, key: &str) -> bool {
        let now = Instant::now();
        self.prune(now);

        if self.seen.contains_key(key) {
            return false;
        }

        self.seen.insert(key.to_string(), now);
        self.order.push_back((key.to_string(), now));
        while self.order.len() > self.capacity {
            if let Some((oldest, _)) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        while let Some((_, at)) = self.order.front() {
            if now.duration_since(*at) < self.window {
                break;
            }
            if let Some((key, _)) = self.order.pop_front() {
                self.seen.remove(&key);
            }
        }
    }
}
