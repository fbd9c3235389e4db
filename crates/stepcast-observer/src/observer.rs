//! Interaction capture.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use stepcast_config::ObserverConfig;
use stepcast_protocols::{normalize_text, InteractionEvent};

use crate::badge;
use crate::dom::{Document, Element, NodeId, SelectorList};
use crate::label::resolve_label;
use crate::sink::EventSink;

/// A page shared between the observer and whatever drives it.
pub type Page = Arc<RwLock<Document>>;

/// A DOM event as the observer receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Click(NodeId),
    Input(NodeId),
    Change(NodeId),
    FocusIn(NodeId),
    FocusOut(NodeId),
}

static CLICKABLE_ANCESTOR: LazyLock<SelectorList> = LazyLock::new(|| {
    SelectorList::fixed(
        "button, a, [role='button'], input[type='submit'], input[type='button'], \
         input[type='reset'], .cursor-pointer, [onclick]",
    )
});

fn is_click_target(el: &Element) -> bool {
    match el.tag.as_str() {
        "button" | "a" => true,
        "input" => matches!(
            el.input_type().as_str(),
            "submit" | "button" | "reset" | "" | "text" | "email" | "number" | "search" | "tel"
                | "url"
        ),
        _ => {
            el.attr("role").is_some_and(|r| r.eq_ignore_ascii_case("button"))
                || el.attr("onclick").is_some()
                || el.has_class("cursor-pointer")
        }
    }
}

/// The element itself when actionable, else its nearest actionable ancestor.
pub fn click_target(doc: &Document, id: NodeId) -> Option<NodeId> {
    if doc.element(id).is_some_and(is_click_target) {
        return Some(id);
    }
    doc.closest(id, &CLICKABLE_ANCESTOR)
}

fn is_text_entry(el: &Element) -> bool {
    (el.is("input") || el.is("textarea"))
        && !matches!(el.input_type().as_str(), "checkbox" | "radio" | "password")
}

fn tracks_focus(el: &Element) -> bool {
    (el.is("input") || el.is("textarea"))
        && !matches!(el.input_type().as_str(), "checkbox" | "radio")
}

fn is_toggle(el: &Element) -> bool {
    el.is("input") && matches!(el.input_type().as_str(), "checkbox" | "radio")
}

/// Updates the badge and the step preview, then queues the event for the sink.
#[derive(Clone)]
struct Emitter {
    page: Page,
    tx: mpsc::UnboundedSender<InteractionEvent>,
    last_step_text: Arc<Mutex<Option<String>>>,
    badge: Arc<Mutex<Option<NodeId>>>,
}

impl Emitter {
    fn emit(&self, event: InteractionEvent) {
        debug!(kind = %event.kind, label = %event.label, "Captured event");
        {
            let mut badge = self.badge.lock();
            let text = format!("Captured: {}", event.kind);
            *badge = Some(badge::update_badge(&mut self.page.write(), *badge, &text));
        }
        if let Some(text) = event.step_text() {
            *self.last_step_text.lock() = Some(text);
        }
        let _ = self.tx.send(event);
    }
}

/// Watches one page and turns qualifying interactions into events.
///
/// Never fails across its event boundary: anything that cannot be labelled
/// or targeted is silently not captured.
pub struct Observer {
    config: ObserverConfig,
    page: Page,
    emitter: Emitter,
    recent_clicks: Mutex<HashMap<String, Instant>>,
    pending_inputs: Arc<Mutex<HashMap<NodeId, JoinHandle<()>>>>,
    last_values: Arc<Mutex<HashMap<NodeId, String>>>,
    focus_values: Mutex<HashMap<NodeId, String>>,
    forwarder: JoinHandle<()>,
}

impl Observer {
    /// Attach to `page`, mounting the badge, and deliver events to `sink` in
    /// capture order.
    pub fn new(config: ObserverConfig, page: Page, sink: Arc<dyn EventSink>) -> Self {
        let badge = badge::ensure_badge(&mut page.write());

        let (tx, mut rx) = mpsc::unbounded_channel::<InteractionEvent>();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.submit(event).await;
            }
        });

        Self {
            config,
            emitter: Emitter {
                page: page.clone(),
                tx,
                last_step_text: Arc::new(Mutex::new(None)),
                badge: Arc::new(Mutex::new(Some(badge))),
            },
            page,
            recent_clicks: Mutex::new(HashMap::new()),
            pending_inputs: Arc::new(Mutex::new(HashMap::new())),
            last_values: Arc::new(Mutex::new(HashMap::new())),
            focus_values: Mutex::new(HashMap::new()),
            forwarder,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn handle(&self, event: DomEvent) {
        match event {
            DomEvent::Click(target) => self.on_click(target),
            DomEvent::Input(target) => self.on_input(target),
            DomEvent::Change(target) => self.on_change(target),
            DomEvent::FocusIn(target) => self.on_focus_in(target),
            DomEvent::FocusOut(target) => {
                self.focus_values.lock().remove(&target);
            }
        }
    }

    /// Step text of the most recent captured event.
    pub fn last_step_text(&self) -> Option<String> {
        self.emitter.last_step_text.lock().clone()
    }

    pub fn badge_text(&self) -> Option<String> {
        badge::badge_text(&self.page.read())
    }

    /// Value the element had when it gained focus, while it still has it.
    pub fn focus_value(&self, target: NodeId) -> Option<String> {
        self.focus_values.lock().get(&target).cloned()
    }

    /// Cancel pending input timers and wait until every captured event has
    /// been handed to the sink.
    pub async fn close(self) {
        for (_, task) in self.pending_inputs.lock().drain() {
            task.abort();
        }
        let Observer {
            emitter, forwarder, ..
        } = self;
        drop(emitter);
        let _ = forwarder.await;
    }

    fn label_ok(&self, label: &str) -> bool {
        label.chars().count() >= self.config.min_label_len.max(1)
    }

    fn on_click(&self, node: NodeId) {
        let label = {
            let doc = self.page.read();
            let Some(target) = click_target(&doc, node) else {
                trace!("Click on non-actionable element ignored");
                return;
            };
            resolve_label(&doc, target)
        };
        if !self.label_ok(&label) {
            trace!(label = %label, "Click without usable label ignored");
            return;
        }

        let key = format!("click:{}", label);
        let window = self.config.click_debounce();
        let now = Instant::now();
        {
            let mut recent = self.recent_clicks.lock();
            if recent
                .get(&key)
                .is_some_and(|last| now.duration_since(*last) < window)
            {
                trace!(key = %key, "Click debounced");
                return;
            }
            recent.retain(|_, last| now.duration_since(*last) < window);
            recent.insert(key, now);
        }

        self.emitter.emit(InteractionEvent::click(label));
    }

    fn on_input(&self, target: NodeId) {
        if !self.page.read().element(target).is_some_and(is_text_entry) {
            return;
        }

        let deadline = Instant::now() + self.config.input_debounce();
        let min_len = self.config.min_label_len.max(1);
        let page = self.page.clone();
        let emitter = self.emitter.clone();
        let last_values = self.last_values.clone();
        let pending = self.pending_inputs.clone();

        let mut timers = self.pending_inputs.lock();
        if let Some(previous) = timers.remove(&target) {
            previous.abort();
        }
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            pending.lock().remove(&target);

            let (label, value) = {
                let doc = page.read();
                let Some(el) = doc.element(target) else {
                    return;
                };
                (resolve_label(&doc, target), normalize_text(&el.value))
            };
            if label.chars().count() < min_len {
                trace!(label = %label, "Input without usable label ignored");
                return;
            }
            if value.is_empty() {
                return;
            }
            {
                let mut last = last_values.lock();
                if last.get(&target) == Some(&value) {
                    trace!(label = %label, "Input value unchanged");
                    return;
                }
                last.insert(target, value.clone());
            }
            emitter.emit(InteractionEvent::input(label, value));
        });
        timers.insert(target, task);
    }

    fn on_change(&self, target: NodeId) {
        let event = {
            let doc = self.page.read();
            let Some(el) = doc.element(target) else {
                return;
            };

            if el.is("select") {
                let label = resolve_label(&doc, target);
                if !self.label_ok(&label) {
                    return;
                }
                let option_text = doc
                    .selected_option(target)
                    .map(|opt| normalize_text(&doc.text_content(opt)))
                    .filter(|text| !text.is_empty());
                let value = option_text.unwrap_or_else(|| normalize_text(&el.value));
                if value.is_empty() {
                    return;
                }
                InteractionEvent::select(label, value)
            } else if is_toggle(el) {
                let label = resolve_label(&doc, target);
                if !self.label_ok(&label) {
                    return;
                }
                InteractionEvent::toggle(label, el.checked)
            } else {
                return;
            }
        };
        self.emitter.emit(event);
    }

    fn on_focus_in(&self, target: NodeId) {
        let value = {
            let doc = self.page.read();
            match doc.element(target) {
                Some(el) if tracks_focus(el) => el.value.clone(),
                _ => return,
            }
        };
        self.focus_values.lock().insert(target, value);
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
