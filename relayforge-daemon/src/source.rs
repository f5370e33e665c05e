//! File-backed queue source.
//!
//! Reads newline-delimited JSON event envelopes from a file and hands
//! them out in batches. Messages classified as retryable are requeued
//! at the back with a redelivery counter; messages that exceed the
//! redelivery cap are dropped with a warning so a poisoned batch
//! cannot wedge the loop.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};
use relayforge_core::event::{QueueMessage, RawEvent};
use tracing::{debug, warn};

/// Maximum times a message is handed out again after a transient failure.
const MAX_REDELIVERIES: u32 = 5;

/// In-process queue fed from a JSON-lines file.
pub struct FileQueueSource {
    source_id: String,
    pending: VecDeque<QueueMessage>,
    redeliveries: HashMap<String, u32>,
}

impl FileQueueSource {
    /// Read all events from `path` into the queue.
    ///
    /// Lines that fail to parse are skipped with a warning; one bad
    /// line does not poison the rest of the file.
    pub async fn from_file(path: impl AsRef<Path>, source_id: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let source_id = source_id.into();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read queue file {}", path.display()))?;

        let mut pending = VecDeque::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match RawEvent::from_json(line.as_bytes()) {
                Ok(event) => {
                    pending.push_back(QueueMessage::new(event, source_id.clone()));
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping malformed queue line"
                    );
                }
            }
        }

        debug!(
            path = %path.display(),
            messages = pending.len(),
            "queue file loaded"
        );
        Ok(Self {
            source_id,
            pending,
            redeliveries: HashMap::new(),
        })
    }

    /// Create an empty source (used by tests and the drain path).
    pub fn empty(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            pending: VecDeque::new(),
            redeliveries: HashMap::new(),
        }
    }

    /// Identifier used as `source_queue` on outgoing messages.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Take up to `batch_size` messages from the front of the queue.
    pub fn poll_batch(&mut self, batch_size: usize) -> Vec<QueueMessage> {
        let take = batch_size.min(self.pending.len());
        self.pending.drain(..take).collect()
    }

    /// Put a message back for redelivery after a transient failure.
    ///
    /// Returns `false` if the redelivery cap was reached and the
    /// message was dropped instead.
    pub fn requeue(&mut self, message: QueueMessage) -> bool {
        let attempts = self.redeliveries.entry(message.id.clone()).or_insert(0);
        *attempts += 1;
        if *attempts > MAX_REDELIVERIES {
            warn!(
                message_id = %message.id,
                attempts = *attempts,
                "redelivery cap reached, dropping message from in-process queue"
            );
            return false;
        }
        self.pending.push_back(message);
        true
    }

    /// Forget the redelivery count of a message that reached a
    /// terminal state.
    pub fn ack(&mut self, message_id: &str) {
        self.redeliveries.remove(message_id);
    }

    /// Number of messages waiting for delivery.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has no pending messages.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
