use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted by the taxonomy service. Consumers (cache invalidation,
/// storefront menu rebuilds) subscribe through the processing loop; the write
/// path never waits on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeactivated(Uuid),

    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Best-effort publish: a full or closed channel is logged, never
    /// propagated, so mutations commit regardless of consumer health.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Handlers implementing this trait process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the sender side; returns once every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CategoryCreated(id) => {
                info!(category_id = %id, "category created");
            }
            Event::CategoryUpdated(id) => {
                info!(category_id = %id, "category updated");
            }
            Event::CategoryDeactivated(id) => {
                info!(category_id = %id, "category deactivated");
            }
            Event::Generic {
                message, metadata, ..
            } => {
                info!(%message, %metadata, "event received");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::CategoryCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::CategoryCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or block.
        sender
            .send_or_log(Event::CategoryUpdated(Uuid::new_v4()))
            .await;
    }

    #[tokio::test]
    async fn process_events_drains_until_senders_drop() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let worker = tokio::spawn(process_events(rx));
        sender
            .send(Event::CategoryDeactivated(Uuid::new_v4()))
            .await
            .unwrap();
        drop(sender);

        worker.await.expect("processing loop should exit cleanly");
    }
}
