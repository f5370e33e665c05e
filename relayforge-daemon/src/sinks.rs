//! File-backed destination implementations.
//!
//! These implement the core sink traits on top of the local
//! filesystem: the audit channel and findings queue append JSON
//! lines, the columnar store writes partitioned objects under a
//! directory tree, and the dead-letter queue appends reason
//! envelopes. I/O errors surface as transient delivery failures so
//! the classifier keeps the affected messages retryable.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use relayforge_core::error::DeliveryError;
use relayforge_core::event::QueueMessage;
use relayforge_core::sink::{
    AuditBatchResponse, AuditSink, ColumnarStore, DeadLetterQueue, FindingsQueue, PartitionKey,
};
use serde_json::Value;
use tracing::debug;

fn io_transient(destination: &str, e: std::io::Error) -> DeliveryError {
    DeliveryError::Transient {
        destination: destination.to_owned(),
        reason: e.to_string(),
    }
}

async fn append_json_lines(
    path: &Path,
    destination: &str,
    records: &[Value],
) -> Result<(), DeliveryError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_transient(destination, e))?;
    }

    let mut lines = String::new();
    for record in records {
        lines.push_str(&record.to_string());
        lines.push('\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| io_transient(destination, e))?;
    tokio::io::AsyncWriteExt::write_all(&mut file, lines.as_bytes())
        .await
        .map_err(|e| io_transient(destination, e))?;
    Ok(())
}

/// Audit channel that appends records to a JSON-lines file.
///
/// A local file never rejects a subset, so every batch comes back
/// fully accepted.
pub struct FileAuditSink {
    path: PathBuf,
    channel: String,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>, channel: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            channel: channel.into(),
        }
    }
}

impl AuditSink for FileAuditSink {
    async fn put_batch(&self, records: Vec<Value>) -> Result<AuditBatchResponse, DeliveryError> {
        append_json_lines(&self.path, &self.channel, &records).await?;
        debug!(channel = %self.channel, records = records.len(), "audit batch appended");
        Ok(AuditBatchResponse::accepted())
    }
}

/// Columnar store that writes objects under `root/prefix/<partition>/`.
pub struct FileColumnarStore {
    root: PathBuf,
    prefix: String,
    bucket: String,
}

impl FileColumnarStore {
    pub fn new(
        root: impl Into<PathBuf>,
        prefix: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            bucket: bucket.into(),
        }
    }

    /// Filesystem path for an object within a partition.
    pub fn object_path(&self, partition: &PartitionKey, object_name: &str) -> PathBuf {
        self.root
            .join(&self.prefix)
            .join(partition.object_prefix())
            .join(object_name)
    }
}

impl ColumnarStore for FileColumnarStore {
    async fn write_object(
        &self,
        partition: &PartitionKey,
        object_name: &str,
        payload: Bytes,
    ) -> Result<(), DeliveryError> {
        let path = self.object_path(partition, object_name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_transient(&self.bucket, e))?;
        }
        tokio::fs::write(&path, &payload)
            .await
            .map_err(|e| io_transient(&self.bucket, e))?;
        debug!(object = %path.display(), bytes = payload.len(), "columnar object written");
        Ok(())
    }
}

/// Findings queue that appends records to a JSON-lines file.
pub struct FileFindingsQueue {
    path: PathBuf,
    queue: String,
}

impl FileFindingsQueue {
    pub fn new(path: impl Into<PathBuf>, queue: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            queue: queue.into(),
        }
    }
}

impl FindingsQueue for FileFindingsQueue {
    async fn enqueue(&self, records: Vec<Value>) -> Result<(), DeliveryError> {
        append_json_lines(&self.path, &self.queue, &records).await?;
        debug!(queue = %self.queue, records = records.len(), "findings enqueued");
        Ok(())
    }
}

/// Dead-letter queue that appends reason envelopes to a JSON-lines file.
pub struct FileDeadLetterQueue {
    path: PathBuf,
    queue: String,
}

impl FileDeadLetterQueue {
    pub fn new(path: impl Into<PathBuf>, queue: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            queue: queue.into(),
        }
    }
}

impl DeadLetterQueue for FileDeadLetterQueue {
    async fn publish(&self, message: &QueueMessage, reason: &str) -> Result<(), DeliveryError> {
        let envelope = serde_json::json!({
            "message_id": message.id,
            "source_queue": message.source_queue,
            "reason": reason,
            "event": message.event,
        });
        append_json_lines(&self.path, &self.queue, std::slice::from_ref(&envelope)).await
    }
}
