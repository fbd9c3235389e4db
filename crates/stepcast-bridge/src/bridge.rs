//! Bridge actor and handle.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use stepcast_config::{BridgeConfig, DeliveryPolicy};
use stepcast_link::{LinkConfig, LinkEvent, LinkHandle};
use stepcast_observer::EventSink;
use stepcast_protocols::{
    now_millis, BridgeStatus, ControlNotice, ControlRequest, InteractionEvent, PingReply,
    RecordingNotice,
};

use crate::error::BridgeError;
use crate::outbox::Outbox;
use crate::state::RecordingState;

/// Capacity of the status notice channel; slow listeners miss old notices.
const NOTICE_CAPACITY: usize = 16;

/// Reply to a [`ControlRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    Pong(PingReply),
    Status(BridgeStatus),
    /// Fire-and-forget requests carry no payload.
    Accepted,
}

enum Request {
    Toggle(oneshot::Sender<BridgeStatus>),
    Event(InteractionEvent),
    Reconnect,
    Shutdown,
}

/// Cloneable handle to a running bridge.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::UnboundedSender<Request>,
    status_rx: watch::Receiver<BridgeStatus>,
    notices: broadcast::Sender<ControlNotice>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl BridgeHandle {
    /// Current status. Never blocks and never changes anything.
    pub fn get_status(&self) -> BridgeStatus {
        *self.status_rx.borrow()
    }

    pub fn ping(&self) -> PingReply {
        PingReply {
            ok: true,
            status: self.get_status(),
        }
    }

    /// Flip recording. While offline this is a no-op returning the current
    /// status.
    pub async fn toggle_recording(&self) -> Result<BridgeStatus, BridgeError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Toggle(reply))?;
        rx.await.map_err(|_| BridgeError::Stopped)
    }

    /// Hand over a captured event. Whether it reaches the relay depends on
    /// the recording state and delivery policy.
    pub fn submit_event(&self, event: InteractionEvent) -> Result<(), BridgeError> {
        self.request(Request::Event(event))
    }

    /// Drop the live relay connection and connect again immediately.
    pub fn reconnect(&self) -> Result<(), BridgeError> {
        self.request(Request::Reconnect)
    }

    /// Answer one local control-plane request.
    pub async fn control(&self, request: ControlRequest) -> Result<ControlReply, BridgeError> {
        match request {
            ControlRequest::Ping => Ok(ControlReply::Pong(self.ping())),
            ControlRequest::GetStatus => Ok(ControlReply::Status(self.get_status())),
            ControlRequest::Event { payload } => {
                self.submit_event(payload)?;
                Ok(ControlReply::Accepted)
            }
            ControlRequest::ToggleRecording => {
                Ok(ControlReply::Status(self.toggle_recording().await?))
            }
        }
    }

    /// [`control`](Self::control) for JSON-encoded requests and replies.
    pub async fn control_json(&self, request: &str) -> Result<String, BridgeError> {
        let request: ControlRequest = serde_json::from_str(request)?;
        let reply = self.control(request).await?;
        Ok(serde_json::to_string(&reply)?)
    }

    /// Listen for status notices. Notices sent while nobody listens are lost.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlNotice> {
        self.notices.subscribe()
    }

    /// Watch the status value itself.
    pub fn watch_status(&self) -> watch::Receiver<BridgeStatus> {
        self.status_rx.clone()
    }

    /// Stop recording, cancel any pending reconnect, close the relay
    /// connection and wait for the bridge to finish.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Request::Shutdown);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn request(&self, request: Request) -> Result<(), BridgeError> {
        self.tx.send(request).map_err(|_| BridgeError::Stopped)
    }
}

#[async_trait]
impl EventSink for BridgeHandle {
    async fn submit(&self, event: InteractionEvent) {
        if let Err(e) = self.submit_event(event) {
            debug!("Event not delivered to bridge: {}", e);
        }
    }
}

/// Start a bridge. It begins connecting to the relay right away.
pub fn spawn(config: &BridgeConfig) -> Result<BridgeHandle, BridgeError> {
    let link_config = LinkConfig::new("bridge", config.url.clone(), config.reconnect_delay());
    let (link, link_events) = stepcast_link::spawn(link_config)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(BridgeStatus::default());
    let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

    let actor = Bridge {
        source: config.source.clone(),
        policy: config.delivery,
        state: RecordingState::Offline,
        outbox: Outbox::new(config.delivery),
        link,
        status_tx,
        notices: notices.clone(),
    };
    let task = tokio::spawn(actor.run(rx, link_events));

    Ok(BridgeHandle {
        tx,
        status_rx,
        notices,
        task: Arc::new(Mutex::new(Some(task))),
    })
}

struct Bridge {
    source: String,
    policy: DeliveryPolicy,
    state: RecordingState,
    outbox: Outbox,
    link: LinkHandle,
    status_tx: watch::Sender<BridgeStatus>,
    notices: broadcast::Sender<ControlNotice>,
}

impl Bridge {
    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut link_events: mpsc::UnboundedReceiver<LinkEvent>,
    ) {
        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Toggle(reply)) => {
                        let status = self.toggle();
                        let _ = reply.send(status);
                    }
                    Some(Request::Event(event)) => self.submit(event),
                    Some(Request::Reconnect) => {
                        if self.link.reconnect().is_err() {
                            break;
                        }
                    }
                    Some(Request::Shutdown) | None => break,
                },
                event = link_events.recv() => match event {
                    Some(LinkEvent::Up) => self.on_connected(),
                    Some(LinkEvent::Down) => self.on_disconnected(),
                    Some(LinkEvent::Message(_)) => {
                        trace!("Ignoring relayed message");
                    }
                    None => break,
                },
            }
        }

        if !self.outbox.is_empty() {
            debug!(dropped = self.outbox.len(), "Discarding queued events on shutdown");
        }
        self.link.close().await;
        self.transition(RecordingState::Offline);
        info!("Bridge stopped");
    }

    fn toggle(&mut self) -> BridgeStatus {
        let now = now_millis();
        let next = self.state.toggled(now);
        if next == self.state {
            debug!(state = %self.state, "Toggle ignored without a relay link");
            return self.state.status();
        }

        let was_recording = self.state.is_recording();
        self.transition(next);

        if self.link.is_connected() && was_recording != next.is_recording() {
            let notice = RecordingNotice::new(next.is_recording(), now, self.source.as_str());
            match notice.to_wire() {
                Ok(wire) => {
                    if let Err(e) = self.link.send(wire) {
                        debug!("Recording notice not sent: {}", e);
                    }
                }
                Err(e) => warn!("Failed to encode recording notice: {}", e),
            }
        }
        self.state.status()
    }

    fn submit(&mut self, event: InteractionEvent) {
        let wire = match event.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Failed to encode event: {}", e);
                return;
            }
        };

        match self.state {
            RecordingState::Recording { .. } => {
                if let Err(e) = self.link.send(wire.clone()) {
                    if self.outbox.push(wire) {
                        debug!("Relay unavailable, event queued");
                    } else {
                        debug!("Event dropped: {}", e);
                    }
                }
            }
            RecordingState::Suspended { .. } => {
                self.outbox.push(wire);
                trace!(queued = self.outbox.len(), "Event queued while suspended");
            }
            RecordingState::Offline | RecordingState::Idle => {
                trace!(state = %self.state, "Event dropped, not recording");
            }
        }
    }

    fn on_connected(&mut self) {
        self.transition(self.state.connected());
        if self.state.is_recording() {
            self.flush();
        }
    }

    fn on_disconnected(&mut self) {
        self.transition(self.state.disconnected(self.policy));
    }

    fn flush(&mut self) {
        let pending = self.outbox.len();
        while let Some(wire) = self.outbox.pop_front() {
            if self.link.send(wire.clone()).is_err() {
                self.outbox.push_front(wire);
                break;
            }
        }
        if pending > 0 {
            info!(sent = pending - self.outbox.len(), "Flushed queued events");
        }
    }

    fn transition(&mut self, next: RecordingState) {
        if next == self.state {
            return;
        }
        debug!(from = %self.state, to = %next, "Bridge state changed");
        self.state = next;

        let status = next.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        // No listeners is fine.
        let _ = self.notices.send(ControlNotice::from(status));
    }
}
