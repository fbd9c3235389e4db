//! `stepcast record`: drive an observer over a page snapshot through the bridge.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use stepcast_config::{Config, DeliveryPolicy};
use stepcast_observer::{Document, Observer, Script};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extra time after the input debounce so trailing input events are flushed.
const SETTLE_MARGIN: Duration = Duration::from_millis(200);

pub(crate) struct RecordOptions {
    pub page: PathBuf,
    pub script: PathBuf,
    pub url: Option<String>,
    pub queue: Option<usize>,
    pub connect_timeout: Duration,
}

pub(crate) async fn run_record(mut config: Config, options: RecordOptions) -> CliResult {
    let document = Document::from_json(&std::fs::read_to_string(&options.page)?)?;
    let script = Script::from_json(&std::fs::read_to_string(&options.script)?)?;

    if let Some(url) = options.url {
        config.bridge.url = url;
    }
    if let Some(capacity) = options.queue {
        config.bridge.delivery = DeliveryPolicy::Queue { capacity };
    }

    let bridge = stepcast_bridge::spawn(&config.bridge)?;
    let mut status = bridge.watch_status();
    let connected = tokio::time::timeout(options.connect_timeout, status.wait_for(|s| s.connected)).await;
    if !matches!(connected, Ok(Ok(_))) {
        bridge.shutdown().await;
        return Err(format!("Relay at {} not reachable", config.bridge.url).into());
    }

    let status = bridge.toggle_recording().await?;
    info!(recording = status.recording, steps = script.len(), "Recording started");

    let sink = Arc::new(bridge.clone());
    let observer = Observer::new(config.observer.clone(), Arc::new(RwLock::new(document)), sink);
    let played = script.play(&observer).await;

    tokio::time::sleep(config.observer.input_debounce() + SETTLE_MARGIN).await;
    if let Some(text) = observer.last_step_text() {
        info!(last_step = %text, "Script finished");
    }
    observer.close().await;

    if bridge.get_status().recording {
        bridge.toggle_recording().await?;
    }
    bridge.shutdown().await;
    played?;
    Ok(())
}
