//! Where captured events go.

use async_trait::async_trait;
use tokio::sync::mpsc;

use stepcast_protocols::InteractionEvent;

/// Receiver of captured events, typically the bridge.
///
/// Delivery is best effort: implementations swallow their own failures.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn submit(&self, event: InteractionEvent);
}

#[async_trait]
impl EventSink for mpsc::UnboundedSender<InteractionEvent> {
    async fn submit(&self, event: InteractionEvent) {
        let _ = self.send(event);
    }
}
