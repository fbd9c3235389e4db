//! Consumer actor: one relay link feeding one draft.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use stepcast_config::{ConfigLoader, ConsumerConfig};
use stepcast_link::{LinkConfig, LinkEvent, LinkHandle};
use stepcast_protocols::ConnectionState;

use crate::draft::Draft;
use crate::error::ConsumerError;
use crate::intake::{DraftUpdate, Intake};

const UPDATE_CAPACITY: usize = 64;

/// Draft changes are written out at most this often.
const PERSIST_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to a running consumer.
#[derive(Clone)]
pub struct ConsumerHandle {
    draft: Arc<Mutex<Draft>>,
    link: LinkHandle,
    updates: broadcast::Sender<DraftUpdate>,
    recording_rx: watch::Receiver<bool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ConsumerHandle {
    /// The live draft, shared with the consumer. Edits made through it are
    /// seen by subsequent relayed messages.
    pub fn draft(&self) -> Arc<Mutex<Draft>> {
        self.draft.clone()
    }

    pub fn snapshot(&self) -> Draft {
        self.draft.lock().clone()
    }

    pub fn export_text(&self) -> String {
        self.draft.lock().export_text()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.link.subscribe_state()
    }

    /// Recording flag as last announced on the relay.
    pub fn is_recording(&self) -> bool {
        *self.recording_rx.borrow()
    }

    /// Listen for draft changes caused by relayed messages.
    pub fn subscribe(&self) -> broadcast::Receiver<DraftUpdate> {
        self.updates.subscribe()
    }

    /// Close the relay link and wait for the consumer to finish.
    pub async fn close(&self) {
        self.link.close().await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Start a consumer over `draft`. It begins connecting to the relay right
/// away.
pub fn spawn(config: &ConsumerConfig, mut draft: Draft) -> Result<ConsumerHandle, ConsumerError> {
    let link_config = LinkConfig::new("consumer", config.url(), config.reconnect_delay());
    let (link, link_events) = stepcast_link::spawn(link_config)?;

    draft.timestamps_enabled = config.timestamps;
    let draft = Arc::new(Mutex::new(draft));
    let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
    let (recording_tx, recording_rx) = watch::channel(false);

    let actor = Consumer {
        intake: Intake::new(config),
        draft: draft.clone(),
        draft_path: config.draft_path.as_deref().map(ConfigLoader::expand_path),
        updates: updates.clone(),
        recording_tx,
        persist_at: None,
    };
    let task = tokio::spawn(actor.run(link_events));

    Ok(ConsumerHandle {
        draft,
        link,
        updates,
        recording_rx,
        task: Arc::new(Mutex::new(Some(task))),
    })
}

/// Load the draft saved at `path`, or start a fresh one.
pub async fn load_draft(path: Option<&Path>) -> Draft {
    let Some(path) = path.map(ConfigLoader::expand_path) else {
        return Draft::new();
    };
    match Draft::load(&path).await {
        Ok(draft) => {
            info!(path = %path.display(), steps = draft.len(), "Loaded draft");
            draft
        }
        Err(ConsumerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Draft::new(),
        Err(e) => {
            warn!(path = %path.display(), "Ignoring unreadable draft: {}", e);
            Draft::new()
        }
    }
}

struct Consumer {
    intake: Intake,
    draft: Arc<Mutex<Draft>>,
    draft_path: Option<PathBuf>,
    updates: broadcast::Sender<DraftUpdate>,
    recording_tx: watch::Sender<bool>,
    /// Set while the draft has unsaved changes.
    persist_at: Option<Instant>,
}

impl Consumer {
    async fn run(mut self, mut link_events: mpsc::UnboundedReceiver<LinkEvent>) {
        loop {
            let persist_at = self.persist_at;
            tokio::select! {
                event = link_events.recv() => match event {
                    Some(LinkEvent::Up) => info!("Consumer connected to relay"),
                    Some(LinkEvent::Down) => info!("Consumer lost relay connection"),
                    Some(LinkEvent::Message(text)) => self.on_message(&text),
                    None => break,
                },
                _ = tokio::time::sleep_until(persist_at.unwrap_or_else(Instant::now)),
                    if persist_at.is_some() => self.persist().await,
            }
        }
        self.persist().await;
        debug!("Consumer stopped");
    }

    fn on_message(&mut self, text: &str) {
        let update = {
            let mut draft = self.draft.lock();
            self.intake.handle(text, &mut draft)
        };
        let Some(update) = update else {
            return;
        };

        if let DraftUpdate::Recording { active } = update {
            self.recording_tx.send_replace(active);
        }
        self.persist_at.get_or_insert_with(|| Instant::now() + PERSIST_INTERVAL);
        // No listeners is fine.
        let _ = self.updates.send(update);
    }

    async fn persist(&mut self) {
        if self.persist_at.take().is_none() {
            return;
        }
        let Some(path) = &self.draft_path else {
            return;
        };
        let draft = self.draft.lock().clone();
        if let Err(e) = draft.save(path).await {
            warn!(path = %path.display(), "Failed to save draft: {}", e);
        }
    }
}
