//! Link supervisor and handle.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use stepcast_protocols::{relay_url_problem, ConnectionState};

use crate::error::LinkError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Relay link configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Name used in log output (e.g. "bridge", "consumer").
    pub name: String,
    /// Relay WebSocket URL.
    pub url: String,
    /// Fixed delay between a drop and the next connection attempt.
    pub backoff: Duration,
}

impl LinkConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, backoff: Duration) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            backoff,
        }
    }

    fn validate(&self) -> Result<(), LinkError> {
        match relay_url_problem(&self.url) {
            Some(reason) => Err(LinkError::InvalidUrl {
                url: self.url.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Something that happened on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A connection was established.
    Up,
    /// The live connection was lost.
    Down,
    /// A text frame arrived from the relay.
    Message(String),
}

enum Command {
    Send(String),
    Reconnect,
    Close,
}

/// Why a connection's pump stopped.
enum PumpExit {
    Dropped,
    Reconnect,
    Closed,
}

/// Cloneable handle to a running link.
#[derive(Clone)]
pub struct LinkHandle {
    name: Arc<str>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LinkHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Queue a text frame on the live connection.
    pub fn send(&self, text: impl Into<String>) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.cmd_tx
            .send(Command::Send(text.into()))
            .map_err(|_| LinkError::Closed)
    }

    /// Drop the current connection (if any) and connect again without
    /// waiting out the backoff.
    pub fn reconnect(&self) -> Result<(), LinkError> {
        self.cmd_tx
            .send(Command::Reconnect)
            .map_err(|_| LinkError::Closed)
    }

    /// Close the connection, cancel any pending reconnect and wait for the
    /// supervisor to stop.
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Start a link supervisor. Connecting begins immediately.
pub fn spawn(
    config: LinkConfig,
) -> Result<(LinkHandle, mpsc::UnboundedReceiver<LinkEvent>), LinkError> {
    config.validate()?;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let name: Arc<str> = Arc::from(config.name.as_str());

    let supervisor = Supervisor {
        config,
        cmd_rx,
        event_tx,
        state_tx,
    };
    let task = tokio::spawn(supervisor.run());

    let handle = LinkHandle {
        name,
        cmd_tx,
        state_rx,
        task: Arc::new(Mutex::new(Some(task))),
    };
    Ok((handle, event_rx))
}

struct Supervisor {
    config: LinkConfig,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Supervisor {
    async fn run(mut self) {
        let name = self.config.name.clone();
        loop {
            self.set_state(ConnectionState::Connecting);
            debug!(link = %name, url = %self.config.url, "Connecting to relay");

            let Some(result) = self.connect().await else {
                break;
            };

            let mut skip_backoff = false;
            match result {
                Ok(ws) => {
                    info!(link = %name, "Relay connected");
                    self.set_state(ConnectionState::Connected);
                    self.emit(LinkEvent::Up);

                    let exit = self.pump(ws).await;

                    self.set_state(ConnectionState::Disconnected);
                    self.emit(LinkEvent::Down);
                    match exit {
                        PumpExit::Closed => break,
                        PumpExit::Reconnect => skip_backoff = true,
                        PumpExit::Dropped => info!(link = %name, "Relay disconnected"),
                    }
                }
                Err(e) => {
                    warn!(link = %name, "Relay connection failed: {}", e);
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            if !skip_backoff && !self.wait_backoff().await {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected);
        debug!(link = %name, "Relay link stopped");
    }

    /// Attempt one connection. `None` means the link was closed meanwhile.
    async fn connect(
        &mut self,
    ) -> Option<Result<WsStream, tokio_tungstenite::tungstenite::Error>> {
        let connect = tokio_tungstenite::connect_async(self.config.url.as_str());
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => return Some(result.map(|(ws, _)| ws)),
                cmd = self.cmd_rx.recv() => match cmd {
                    None | Some(Command::Close) => return None,
                    Some(Command::Send(_)) => {
                        trace!(link = %self.config.name, "Discarding frame while connecting");
                    }
                    Some(Command::Reconnect) => {}
                },
            }
        }
    }

    /// Sleep out the backoff. Returns false when the link was closed.
    async fn wait_backoff(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.config.backoff);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    None | Some(Command::Close) => return false,
                    Some(Command::Reconnect) => return true,
                    Some(Command::Send(_)) => {
                        trace!(link = %self.config.name, "Discarding frame while disconnected");
                    }
                },
            }
        }
    }

    async fn pump(&mut self, ws: WsStream) -> PumpExit {
        let (mut sink, mut source) = ws.split();

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(text)) => {
                        trace!(link = %self.config.name, "send: {}", text);
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            warn!(link = %self.config.name, "Relay send failed: {}", e);
                            return PumpExit::Dropped;
                        }
                    }
                    Some(Command::Reconnect) => {
                        let _ = sink.close().await;
                        return PumpExit::Reconnect;
                    }
                    Some(Command::Close) | None => {
                        let _ = sink.close().await;
                        return PumpExit::Closed;
                    }
                },
                msg = source.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.emit(LinkEvent::Message(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        self.emit(LinkEvent::Message(String::from_utf8_lossy(&bytes).into_owned()));
                    }
                    Some(Ok(Message::Close(_))) | None => return PumpExit::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(link = %self.config.name, "Relay socket error: {}", e);
                        return PumpExit::Dropped;
                    }
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn emit(&self, event: LinkEvent) {
        // The owner may have stopped listening; that is not an error.
        let _ = self.event_tx.send(event);
    }
}
