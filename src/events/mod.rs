use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Cloneable handle used by services to publish events without awaiting
/// consumers.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Notifications emitted by the session lifecycle and the update
/// coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SessionStarted {
        batch_id: String,
        rows: usize,
        archived_batch: Option<String>,
    },
    SessionAppended {
        batch_id: String,
        rows: usize,
    },
    SessionCleared {
        batch_id: String,
        rows_removed: u64,
    },
    RecordUpdated {
        record_id: i64,
        updated_by: String,
        updated_at: DateTime<Utc>,
    },
    UpdateConflicted {
        record_id: i64,
        rejected_actor: String,
        competing_actor: String,
    },
}

/// Consumes events off the channel and logs them. Runs for the lifetime of
/// the process; ends when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::SessionStarted {
                batch_id,
                rows,
                archived_batch,
            } => info!(
                batch_id = %batch_id,
                rows = rows,
                archived_batch = ?archived_batch,
                "Counting session started"
            ),
            Event::SessionAppended { batch_id, rows } => {
                info!(batch_id = %batch_id, rows = rows, "Rows appended to active session")
            }
            Event::SessionCleared {
                batch_id,
                rows_removed,
            } => warn!(
                batch_id = %batch_id,
                rows_removed = rows_removed,
                "Active session cleared without archive"
            ),
            Event::RecordUpdated {
                record_id,
                updated_by,
                updated_at,
            } => info!(
                record_id = record_id,
                updated_by = %updated_by,
                updated_at = %updated_at,
                "Record updated"
            ),
            Event::UpdateConflicted {
                record_id,
                rejected_actor,
                competing_actor,
            } => info!(
                record_id = record_id,
                rejected_actor = %rejected_actor,
                competing_actor = %competing_actor,
                "Update rejected on concurrent modification"
            ),
        }
    }
    info!("Event channel closed; event processor exiting");
}
