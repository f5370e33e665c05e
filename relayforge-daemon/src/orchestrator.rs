//! Pipeline orchestration -- assembly, the poll/transform/deliver loop,
//! and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of
//! `relayforge-daemon`. It loads configuration, loads mapping
//! templates, wires the file-backed destinations, and runs the main
//! batch loop until a shutdown signal arrives.
//!
//! # Batch Flow
//!
//! 1. Poll up to `batch_size` messages from the queue source
//! 2. Transform each message into every enabled output format
//! 3. Deliver the transformed records to their destinations
//! 4. Classify each message (delivered / retryable / dead-lettered)
//! 5. Ack terminal messages, requeue retryable ones

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};

use relayforge_core::config::RelayforgeConfig;
use relayforge_core::event::QueueMessage;
use relayforge_core::metrics::{DAEMON_BUILD_INFO, DAEMON_UPTIME_SECONDS};
use relayforge_core::sink::{AuditSink, ColumnarStore, DeadLetterQueue, FindingsQueue};
use relayforge_transform::batch::{BatchProcessor, BatchSummary};
use relayforge_transform::config::TransformConfig;
use relayforge_transform::dispatch::DeliveryDispatcher;
use relayforge_transform::dlq::{DlqController, MessageState};
use relayforge_transform::template::TemplateStore;

use crate::sinks::{FileAuditSink, FileColumnarStore, FileDeadLetterQueue, FileFindingsQueue};
use crate::source::FileQueueSource;

/// How often the main loop polls the queue when it is empty.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often the uptime gauge is refreshed.
const UPTIME_INTERVAL: Duration = Duration::from_secs(10);

/// Result of processing one batch end to end.
pub struct BatchReport {
    /// Per-(message, format) outcome counts.
    pub summary: BatchSummary,
    /// Final state of every message in the batch.
    pub states: HashMap<String, MessageState>,
}

/// Transform, deliver, and classify one batch at a time.
///
/// Generic over the destination traits so integration tests can run
/// the full flow against in-memory sinks.
pub struct PipelineRunner<A, C, F, D> {
    processor: BatchProcessor,
    dispatcher: DeliveryDispatcher<A, C, F>,
    dlq: DlqController<D>,
}

impl<A, C, F, D> PipelineRunner<A, C, F, D>
where
    A: AuditSink,
    C: ColumnarStore,
    F: FindingsQueue,
    D: DeadLetterQueue,
{
    /// Assemble the runner from a transform config and a loaded
    /// template store.
    pub fn new(
        config: &TransformConfig,
        store: Arc<TemplateStore>,
        audit: A,
        columnar: C,
        findings: F,
        dead_letter: D,
    ) -> Result<Self> {
        let processor = BatchProcessor::new(config, store)
            .map_err(|e| anyhow::anyhow!("failed to build batch processor: {}", e))?;
        let dispatcher = DeliveryDispatcher::new(config, audit, columnar, findings);
        let dlq = DlqController::new(dead_letter, config.dead_letter_queue.clone());
        Ok(Self {
            processor,
            dispatcher,
            dlq,
        })
    }

    /// Run one batch through transform, delivery, and classification.
    pub async fn run_batch(&self, messages: &[QueueMessage]) -> BatchReport {
        let transformed = self.processor.process(messages);

        let mut entries = transformed.transform_entries.clone();
        entries.extend(self.dispatcher.deliver(&transformed).await);

        let summary = BatchSummary::from_entries(messages.len(), entries);
        let states = self.dlq.classify(messages, &summary).await;

        BatchReport { summary, states }
    }
}

/// File-backed runner type used by the daemon binary.
pub type FileRunner =
    PipelineRunner<FileAuditSink, FileColumnarStore, FileFindingsQueue, FileDeadLetterQueue>;

/// The main daemon orchestrator.
pub struct Orchestrator {
    config: RelayforgeConfig,
    runner: FileRunner,
    source: FileQueueSource,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = RelayforgeConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when CLI overrides have been applied.
    pub async fn build_from_config(config: RelayforgeConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let transform_config = TransformConfig::from_core(&config);

        let mut store = TemplateStore::new();
        let loaded = store
            .load_from_dir(
                &transform_config.template_dir,
                transform_config.template_max_file_bytes,
            )
            .await
            .map_err(|e| anyhow::anyhow!("failed to load mapping templates: {}", e))?;
        if loaded == 0 {
            warn!(
                dir = %transform_config.template_dir,
                "no mapping templates loaded, every message will fail routing"
            );
        } else {
            info!(templates = loaded, "mapping templates loaded");
        }

        let delivery_root = Path::new(&config.queue.file_path)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("delivery");
        let audit = FileAuditSink::new(
            delivery_root.join("audit.jsonl"),
            config.destinations.audit_channel.clone(),
        );
        let columnar = FileColumnarStore::new(
            delivery_root.join("columnar"),
            config.destinations.columnar_prefix.clone(),
            config.destinations.columnar_bucket.clone(),
        );
        let findings = FileFindingsQueue::new(
            delivery_root.join("findings.jsonl"),
            config.destinations.findings_queue.clone(),
        );
        let dead_letter = FileDeadLetterQueue::new(
            delivery_root.join("dlq.jsonl"),
            config.destinations.dead_letter_queue.clone(),
        );

        let runner = PipelineRunner::new(
            &transform_config,
            Arc::new(store),
            audit,
            columnar,
            findings,
            dead_letter,
        )?;

        let source =
            FileQueueSource::from_file(&config.queue.file_path, config.queue.source_id.clone())
                .await?;
        info!(
            source = %config.queue.source_id,
            pending = source.len(),
            "queue source loaded"
        );

        let (shutdown_tx, _) = broadcast::channel(16);

        metrics::gauge!(DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

        Ok(Self {
            config,
            runner,
            source,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Process batches until a shutdown signal arrives.
    ///
    /// With `drain` set, the loop exits once the queue is empty
    /// instead of idling.
    pub async fn run(&mut self, drain: bool) -> Result<()> {
        let uptime_task = spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe());

        info!("entering main batch loop");
        loop {
            if self.source.is_empty() {
                if drain {
                    info!("queue drained, exiting");
                    break;
                }
                tokio::select! {
                    signal = wait_for_shutdown_signal() => {
                        info!(signal = signal?, "shutdown signal received");
                        break;
                    }
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => continue,
                }
            }

            let batch = self.source.poll_batch(self.config.queue.batch_size);
            let report = self.runner.run_batch(&batch).await;

            let mut requeued = 0usize;
            for message in batch {
                match report.states.get(&message.id) {
                    Some(MessageState::Retryable) => {
                        if self.source.requeue(message) {
                            requeued += 1;
                        }
                    }
                    _ => self.source.ack(&message.id),
                }
            }

            info!(
                total = report.summary.total_messages,
                delivered = report.summary.delivered,
                validation_failed = report.summary.validation_failed,
                delivery_failed = report.summary.delivery_failed,
                skipped = report.summary.skipped,
                requeued,
                "batch processed"
            );
        }

        let _ = self.shutdown_tx.send(());
        let _ = uptime_task.await;
        info!("relayforge-daemon shut down");
        Ok(())
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &RelayforgeConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Refresh the uptime gauge until shutdown.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    })
}
