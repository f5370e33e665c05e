//! 목적지 전달 디스패처 -- 검증된 레코드를 목적지별로 배치 전달합니다.
//!
//! 세 목적지(감사 채널, 컬럼 저장소, findings 큐)로의 전달은 동시에
//! 진행되며 서로 격리됩니다. 한 목적지의 실패가 다른 두 목적지로의
//! 전달 시도를 막지 않습니다. 모든 외부 호출은 타임아웃을 가지며,
//! 타임아웃은 일시적 실패로 취급됩니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::DateTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use metrics::{counter, histogram};
use relayforge_core::error::DeliveryError;
use relayforge_core::metrics::{
    DELIVERY_CALLS_TOTAL, DELIVERY_CALL_DURATION_SECONDS, DELIVERY_RECORDS_TOTAL,
    DELIVERY_REJECTED_RETRIED_TOTAL, LABEL_DESTINATION, LABEL_RESULT,
};
use relayforge_core::sink::{AuditSink, ColumnarStore, FindingsQueue, PartitionKey};
use relayforge_core::types::DestinationKind;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::{debug, warn};

use crate::batch::{BatchResultEntry, DestinedRecord, FormatOutcome, TransformedBatch};
use crate::config::TransformConfig;
use crate::template::OutputFormat;

/// 전달 디스패처
///
/// 싱크는 trait 경계로 주입됩니다. 싱크 구현이 동시 사용에
/// 안전하다면 디스패처도 여러 배치에서 공유할 수 있습니다.
pub struct DeliveryDispatcher<A, C, F> {
    audit: A,
    columnar: C,
    findings: F,
    audit_channel: String,
    columnar_bucket: String,
    findings_queue: String,
    timeout: Duration,
    findings_max_attempts: u32,
    audit_max_records: usize,
    audit_max_bytes: usize,
}

impl<A, C, F> DeliveryDispatcher<A, C, F>
where
    A: AuditSink,
    C: ColumnarStore,
    F: FindingsQueue,
{
    /// 새 디스패처를 생성합니다.
    pub fn new(config: &TransformConfig, audit: A, columnar: C, findings: F) -> Self {
        Self {
            audit,
            columnar,
            findings,
            audit_channel: config.audit_channel.clone(),
            columnar_bucket: config.columnar_bucket.clone(),
            findings_queue: config.findings_queue.clone(),
            timeout: Duration::from_secs(config.delivery_timeout_secs),
            findings_max_attempts: config.findings_max_attempts,
            audit_max_records: config.audit_max_records,
            audit_max_bytes: config.audit_max_bytes,
        }
    }

    /// 변환된 배치를 세 목적지로 전달합니다.
    ///
    /// 목적지별 전달은 동시에 진행되며, (메시지, 형식) 단위의 전달
    /// 결과 엔트리를 반환합니다. 에러를 반환하지 않습니다.
    pub async fn deliver(&self, batch: &TransformedBatch) -> Vec<BatchResultEntry> {
        let (audit_entries, schema_entries, findings_entries) = tokio::join!(
            self.deliver_audit(&batch.audit_records),
            self.deliver_schema(&batch.schema_records),
            self.deliver_findings(&batch.findings_records),
        );

        let mut entries = audit_entries;
        entries.extend(schema_entries);
        entries.extend(findings_entries);
        entries
    }

    /// 감사 레코드를 상한(레코드 수/바이트)을 지키는 배치로 나눠
    /// 제출합니다.
    ///
    /// 부분 거부된 서브셋은 한 번 더 재시도하고, 그래도 거부되면
    /// 일시적 실패로 기록합니다.
    async fn deliver_audit(&self, records: &[DestinedRecord]) -> Vec<BatchResultEntry> {
        let mut entries = Vec::new();
        if records.is_empty() {
            return entries;
        }

        let mut chunk: Vec<&DestinedRecord> = Vec::new();
        let mut chunk_bytes = 0usize;

        for destined in records {
            let serialized_len = destined.record.to_string().len();

            // 단일 레코드가 바이트 상한을 초과하면 그 레코드만 영구 실패
            if serialized_len > self.audit_max_bytes {
                entries.push(audit_entry(
                    &destined.message_id,
                    FormatOutcome::DeliveryFailed {
                        transient: false,
                        reason: format!(
                            "record exceeds audit batch byte cap ({serialized_len} > {})",
                            self.audit_max_bytes
                        ),
                    },
                ));
                continue;
            }

            if chunk.len() >= self.audit_max_records
                || chunk_bytes + serialized_len > self.audit_max_bytes
            {
                entries.extend(self.submit_audit_chunk(&chunk).await);
                chunk.clear();
                chunk_bytes = 0;
            }

            chunk.push(destined);
            chunk_bytes += serialized_len;
        }

        if !chunk.is_empty() {
            entries.extend(self.submit_audit_chunk(&chunk).await);
        }

        entries
    }

    async fn submit_audit_chunk(&self, chunk: &[&DestinedRecord]) -> Vec<BatchResultEntry> {
        let payload: Vec<Value> = chunk.iter().map(|d| d.record.clone()).collect();

        let response = match self
            .timed_call(
                DestinationKind::Audit,
                &self.audit_channel,
                self.audit.put_batch(payload),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return chunk.iter().map(|d| failed_entry(d, OutputFormat::AuditLog, &e)).collect(),
        };

        if response.rejected.is_empty() {
            counter!(DELIVERY_RECORDS_TOTAL, LABEL_DESTINATION => "audit")
                .increment(chunk.len() as u64);
            return chunk
                .iter()
                .map(|d| audit_entry(&d.message_id, FormatOutcome::Delivered))
                .collect();
        }

        // 거부된 서브셋 1회 재시도
        counter!(DELIVERY_REJECTED_RETRIED_TOTAL, LABEL_DESTINATION => "audit")
            .increment(response.rejected.len() as u64);
        warn!(
            rejected = response.rejected.len(),
            channel = %self.audit_channel,
            "audit destination rejected subset, retrying once"
        );

        let retry_result = self
            .timed_call(
                DestinationKind::Audit,
                &self.audit_channel,
                self.audit.put_batch(response.rejected.clone()),
            )
            .await;

        let mut still_rejected: Vec<Value> = match retry_result {
            Ok(retry_response) => retry_response.rejected,
            Err(_) => response.rejected,
        };

        let delivered = chunk.len().saturating_sub(still_rejected.len());
        counter!(DELIVERY_RECORDS_TOTAL, LABEL_DESTINATION => "audit")
            .increment(delivered as u64);
        // 동일 값 레코드가 여럿인 청크에서 거부 1건이 전부를 실패로
        // 만들지 않도록, 매칭된 거부 항목은 하나씩 소비합니다
        chunk
            .iter()
            .map(|d| {
                if let Some(pos) = still_rejected.iter().position(|r| *r == d.record) {
                    still_rejected.remove(pos);
                    audit_entry(
                        &d.message_id,
                        FormatOutcome::DeliveryFailed {
                            transient: true,
                            reason: "rejected by audit destination after retry".to_owned(),
                        },
                    )
                } else {
                    audit_entry(&d.message_id, FormatOutcome::Delivered)
                }
            })
            .collect()
    }

    /// 스키마 레코드를 파티션별로 묶어 압축 오브젝트로 기록합니다.
    ///
    /// 오브젝트 이름은 페이로드 해시에서 파생되므로 같은 배치를
    /// 재기록해도 같은 오브젝트에 수렴합니다.
    async fn deliver_schema(&self, records: &[DestinedRecord]) -> Vec<BatchResultEntry> {
        let mut entries = Vec::new();
        if records.is_empty() {
            return entries;
        }

        let mut partitions: HashMap<PartitionKey, Vec<&DestinedRecord>> = HashMap::new();
        for destined in records {
            partitions
                .entry(partition_for(&destined.record))
                .or_default()
                .push(destined);
        }

        for (partition, group) in partitions {
            let outcome = match self.write_partition(&partition, &group).await {
                Ok(()) => FormatOutcome::Delivered,
                Err(e) => FormatOutcome::DeliveryFailed {
                    transient: e.is_transient(),
                    reason: e.to_string(),
                },
            };
            for destined in group {
                entries.push(BatchResultEntry {
                    message_id: destined.message_id.clone(),
                    format: OutputFormat::Schema,
                    outcome: outcome.clone(),
                });
            }
        }

        entries
    }

    async fn write_partition(
        &self,
        partition: &PartitionKey,
        group: &[&DestinedRecord],
    ) -> Result<(), DeliveryError> {
        let mut lines = String::new();
        for destined in group {
            lines.push_str(&destined.record.to_string());
            lines.push('\n');
        }

        // 오브젝트 이름은 비압축 페이로드 해시에서 파생
        let digest = Sha256::digest(lines.as_bytes());
        let object_name = format!("part-{}.jsonl.gz", &hex::encode(digest)[..16]);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        let payload = encoder
            .write_all(lines.as_bytes())
            .and_then(|_| encoder.finish())
            .map(Bytes::from)
            .map_err(|e| DeliveryError::Permanent {
                destination: self.columnar_bucket.clone(),
                reason: format!("gzip encoding failed: {e}"),
            })?;

        debug!(
            partition = %partition,
            object = %object_name,
            records = group.len(),
            "writing columnar object"
        );
        self.timed_call(
            DestinationKind::Columnar,
            &self.columnar_bucket,
            self.columnar.write_object(partition, &object_name, payload),
        )
        .await?;
        counter!(DELIVERY_RECORDS_TOTAL, LABEL_DESTINATION => "columnar")
            .increment(group.len() as u64);
        Ok(())
    }

    /// Findings 레코드를 큐에 넣습니다.
    ///
    /// 일시적 실패는 설정된 횟수까지 재시도하며, 소진되면 전달
    /// 실패로 기록합니다.
    async fn deliver_findings(&self, records: &[DestinedRecord]) -> Vec<BatchResultEntry> {
        if records.is_empty() {
            return Vec::new();
        }

        let payload: Vec<Value> = records.iter().map(|d| d.record.clone()).collect();
        let mut last_error: Option<DeliveryError> = None;

        for attempt in 1..=self.findings_max_attempts {
            match self
                .timed_call(
                    DestinationKind::Findings,
                    &self.findings_queue,
                    self.findings.enqueue(payload.clone()),
                )
                .await
            {
                Ok(()) => {
                    counter!(DELIVERY_RECORDS_TOTAL, LABEL_DESTINATION => "findings")
                        .increment(records.len() as u64);
                    return records
                        .iter()
                        .map(|d| BatchResultEntry {
                            message_id: d.message_id.clone(),
                            format: OutputFormat::Findings,
                            outcome: FormatOutcome::Delivered,
                        })
                        .collect();
                }
                Err(e) if e.is_transient() && attempt < self.findings_max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.findings_max_attempts,
                        error = %e,
                        "findings enqueue failed, retrying"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        let error = last_error.unwrap_or_else(|| DeliveryError::Transient {
            destination: self.findings_queue.clone(),
            reason: "findings enqueue attempts exhausted".to_owned(),
        });
        records
            .iter()
            .map(|d| failed_entry(d, OutputFormat::Findings, &error))
            .collect()
    }

    /// 목적지 호출에 타임아웃과 메트릭을 적용합니다.
    async fn timed_call<T>(
        &self,
        destination: DestinationKind,
        destination_id: &str,
        call: impl Future<Output = Result<T, DeliveryError>>,
    ) -> Result<T, DeliveryError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout {
                destination: destination_id.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            }),
        };

        histogram!(DELIVERY_CALL_DURATION_SECONDS, LABEL_DESTINATION => destination.as_str())
            .record(started.elapsed().as_secs_f64());
        let result_label = if result.is_ok() { "success" } else { "failure" };
        counter!(
            DELIVERY_CALLS_TOTAL,
            LABEL_DESTINATION => destination.as_str(),
            LABEL_RESULT => result_label
        )
        .increment(1);

        result
    }
}

fn audit_entry(message_id: &str, outcome: FormatOutcome) -> BatchResultEntry {
    BatchResultEntry {
        message_id: message_id.to_owned(),
        format: OutputFormat::AuditLog,
        outcome,
    }
}

fn failed_entry(
    destined: &DestinedRecord,
    format: OutputFormat,
    error: &DeliveryError,
) -> BatchResultEntry {
    BatchResultEntry {
        message_id: destined.message_id.clone(),
        format,
        outcome: FormatOutcome::DeliveryFailed {
            transient: error.is_transient(),
            reason: error.to_string(),
        },
    }
}

/// 스키마 레코드에서 파티션 키를 파생합니다.
///
/// 리전/계정은 레코드의 `cloud` 블록에서, 일자는 레코드의 `time`
/// (epoch 밀리초)에서 계산합니다. 벽시계는 사용하지 않으므로
/// 재처리 시에도 같은 파티션에 기록됩니다.
pub fn partition_for(record: &Value) -> PartitionKey {
    let region = record
        .pointer("/cloud/region")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_owned();
    let account_id = record
        .pointer("/cloud/account/uid")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_owned();
    let event_day = record
        .get("time")
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_owned());

    PartitionKey {
        region,
        account_id,
        event_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use relayforge_core::sink::{
        AuditBatchResponse, FailMode, MemoryAuditSink, MemoryColumnarStore, MemoryFindingsQueue,
    };
    use serde_json::json;
    use std::io::Read;

    fn destined(message_id: &str, record: Value) -> DestinedRecord {
        DestinedRecord {
            message_id: message_id.to_owned(),
            record,
        }
    }

    fn schema_record(region: &str, account: &str, time: i64) -> Value {
        json!({
            "time": time,
            "class_uid": 4001,
            "cloud": {"region": region, "account": {"uid": account}}
        })
    }

    fn dispatcher(
        config: &TransformConfig,
    ) -> DeliveryDispatcher<MemoryAuditSink, MemoryColumnarStore, MemoryFindingsQueue> {
        DeliveryDispatcher::new(
            config,
            MemoryAuditSink::new(),
            MemoryColumnarStore::new(),
            MemoryFindingsQueue::new(),
        )
    }

    fn batch_with(
        audit: Vec<DestinedRecord>,
        schema: Vec<DestinedRecord>,
        findings: Vec<DestinedRecord>,
    ) -> TransformedBatch {
        TransformedBatch {
            total_messages: audit.len().max(schema.len()).max(findings.len()),
            transform_entries: Vec::new(),
            audit_records: audit,
            schema_records: schema,
            findings_records: findings,
        }
    }

    fn all_delivered(entries: &[BatchResultEntry]) -> bool {
        entries
            .iter()
            .all(|e| e.outcome == FormatOutcome::Delivered)
    }

    #[tokio::test]
    async fn delivers_to_all_three_destinations() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        let batch = batch_with(
            vec![destined("m-1", json!({"eventName": "A"}))],
            vec![destined("m-1", schema_record("us-east-1", "123", 1714564800000))],
            vec![destined("m-1", json!({"Id": "f-1"}))],
        );

        let entries = dispatcher.deliver(&batch).await;
        assert_eq!(entries.len(), 3);
        assert!(all_delivered(&entries));
        assert_eq!(dispatcher.audit.records().len(), 1);
        assert_eq!(dispatcher.columnar.object_count(), 1);
        assert_eq!(dispatcher.findings.entries().len(), 1);
    }

    #[tokio::test]
    async fn audit_batches_respect_record_cap() {
        let config = TransformConfig {
            audit_max_records: 2,
            ..Default::default()
        };
        let dispatcher = dispatcher(&config);
        let records: Vec<DestinedRecord> = (0..5)
            .map(|i| destined(&format!("m-{i}"), json!({"n": i})))
            .collect();

        let entries = dispatcher.deliver_audit(&records).await;
        assert!(all_delivered(&entries));
        // 5개 레코드, 상한 2 -> 3회 호출
        assert_eq!(dispatcher.audit.batch_calls(), 3);
    }

    #[tokio::test]
    async fn oversized_audit_record_fails_permanently_alone() {
        let config = TransformConfig {
            audit_max_bytes: 64,
            ..Default::default()
        };
        let dispatcher = dispatcher(&config);
        let records = vec![
            destined("m-big", json!({"data": "x".repeat(200)})),
            destined("m-ok", json!({"n": 1})),
        ];

        let entries = dispatcher.deliver_audit(&records).await;
        let big = entries.iter().find(|e| e.message_id == "m-big").unwrap();
        assert!(matches!(
            big.outcome,
            FormatOutcome::DeliveryFailed { transient: false, .. }
        ));
        let ok = entries.iter().find(|e| e.message_id == "m-ok").unwrap();
        assert_eq!(ok.outcome, FormatOutcome::Delivered);
    }

    #[tokio::test]
    async fn rejected_audit_subset_is_retried_once() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        // 첫 호출에서 1개 거부, 재시도에서 수락
        dispatcher.audit.reject_next(1);

        let records = vec![
            destined("m-1", json!({"n": 1})),
            destined("m-2", json!({"n": 2})),
        ];
        let entries = dispatcher.deliver_audit(&records).await;

        assert!(all_delivered(&entries));
        assert_eq!(dispatcher.audit.batch_calls(), 2);
    }

    /// 매 호출 첫 레코드를 거부하는 싱크
    struct FirstRejectingSink;

    impl AuditSink for FirstRejectingSink {
        async fn put_batch(
            &self,
            records: Vec<Value>,
        ) -> Result<AuditBatchResponse, DeliveryError> {
            Ok(AuditBatchResponse {
                rejected: records.into_iter().take(1).collect(),
            })
        }
    }

    #[tokio::test]
    async fn duplicate_audit_records_fail_only_rejected_copies() {
        let config = TransformConfig::default();
        let dispatcher = DeliveryDispatcher::new(
            &config,
            FirstRejectingSink,
            MemoryColumnarStore::new(),
            MemoryFindingsQueue::new(),
        );

        // 두 메시지가 같은 감사 레코드로 렌더링된 경우
        let records = vec![
            destined("m-1", json!({"eventName": "Dup"})),
            destined("m-2", json!({"eventName": "Dup"})),
        ];
        let entries = dispatcher.deliver_audit(&records).await;

        // 재시도 후에도 거부된 사본이 1개면 실패 처리도 1건이어야 함
        let failed = entries
            .iter()
            .filter(|e| matches!(e.outcome, FormatOutcome::DeliveryFailed { .. }))
            .count();
        assert_eq!(failed, 1);
        let delivered = entries
            .iter()
            .filter(|e| e.outcome == FormatOutcome::Delivered)
            .count();
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn schema_records_group_by_partition_key() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        let records = vec![
            destined("m-1", schema_record("us-east-1", "111", 1714564800000)),
            destined("m-2", schema_record("us-east-1", "111", 1714564900000)),
            destined("m-3", schema_record("eu-west-1", "222", 1714564800000)),
        ];

        let entries = dispatcher.deliver_schema(&records).await;
        assert!(all_delivered(&entries));
        // 두 파티션 -> 두 오브젝트
        assert_eq!(dispatcher.columnar.object_count(), 2);

        let keys = dispatcher.columnar.object_keys();
        assert!(
            keys.iter()
                .any(|k| k.starts_with("region=us-east-1/account=111/dt=2024-05-01/part-"))
        );
        assert!(
            keys.iter()
                .any(|k| k.starts_with("region=eu-west-1/account=222/dt=2024-05-01/part-"))
        );
    }

    #[tokio::test]
    async fn columnar_payload_is_gzipped_json_lines() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        let records = vec![
            destined("m-1", schema_record("us-east-1", "111", 1714564800000)),
            destined("m-2", schema_record("us-east-1", "111", 1714564800000)),
        ];

        dispatcher.deliver_schema(&records).await;
        let key = dispatcher.columnar.object_keys().pop().unwrap();
        let payload = dispatcher.columnar.object(&key).unwrap();

        let mut decoder = GzDecoder::new(payload.as_ref());
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).unwrap();

        let lines: Vec<&str> = decoded.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["class_uid"], json!(4001));
    }

    #[test]
    fn partition_key_ignores_wall_clock() {
        let record = schema_record("ap-northeast-2", "999", 1700000000000);
        let key = partition_for(&record);
        assert_eq!(key.region, "ap-northeast-2");
        assert_eq!(key.account_id, "999");
        assert_eq!(key.event_day, "2023-11-14");
    }

    #[test]
    fn partition_key_missing_fields_fall_back_to_unknown() {
        let key = partition_for(&json!({"class_uid": 1}));
        assert_eq!(key.region, "unknown");
        assert_eq!(key.account_id, "unknown");
        assert_eq!(key.event_day, "unknown");
    }

    #[tokio::test]
    async fn findings_retries_transient_failures_with_bound() {
        let config = TransformConfig {
            findings_max_attempts: 3,
            ..Default::default()
        };
        let dispatcher = dispatcher(&config);
        // 처음 2회 실패, 3번째 성공
        dispatcher.findings.fail_next(2);

        let records = vec![destined("m-1", json!({"Id": "f-1"}))];
        let entries = dispatcher.deliver_findings(&records).await;

        assert!(all_delivered(&entries));
        assert_eq!(dispatcher.findings.enqueue_calls(), 3);
    }

    #[tokio::test]
    async fn findings_exhausted_retries_surface_as_delivery_failed() {
        let config = TransformConfig {
            findings_max_attempts: 2,
            ..Default::default()
        };
        let dispatcher = dispatcher(&config);
        dispatcher.findings.fail_next(5);

        let records = vec![destined("m-1", json!({"Id": "f-1"}))];
        let entries = dispatcher.deliver_findings(&records).await;

        assert!(matches!(
            entries[0].outcome,
            FormatOutcome::DeliveryFailed { transient: true, .. }
        ));
        assert_eq!(dispatcher.findings.enqueue_calls(), 2);
    }

    #[tokio::test]
    async fn destination_failures_are_isolated() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        dispatcher.columnar.set_fail_mode(Some(FailMode::Transient));

        let batch = batch_with(
            vec![destined("m-1", json!({"eventName": "A"}))],
            vec![destined("m-1", schema_record("us-east-1", "123", 1714564800000))],
            vec![destined("m-1", json!({"Id": "f-1"}))],
        );
        let entries = dispatcher.deliver(&batch).await;

        let audit = entries
            .iter()
            .find(|e| e.format == OutputFormat::AuditLog)
            .unwrap();
        let schema = entries
            .iter()
            .find(|e| e.format == OutputFormat::Schema)
            .unwrap();
        let findings = entries
            .iter()
            .find(|e| e.format == OutputFormat::Findings)
            .unwrap();

        assert_eq!(audit.outcome, FormatOutcome::Delivered);
        assert_eq!(findings.outcome, FormatOutcome::Delivered);
        assert!(matches!(
            schema.outcome,
            FormatOutcome::DeliveryFailed { transient: true, .. }
        ));
    }

    #[tokio::test]
    async fn empty_groups_make_no_destination_calls() {
        let config = TransformConfig::default();
        let dispatcher = dispatcher(&config);
        let batch = batch_with(vec![destined("m-1", json!({"eventName": "A"}))], vec![], vec![]);

        dispatcher.deliver(&batch).await;
        // schema 비활성화 시 컬럼 저장소 호출 없음
        assert_eq!(dispatcher.columnar.object_count(), 0);
        assert_eq!(dispatcher.findings.enqueue_calls(), 0);
        assert_eq!(dispatcher.audit.batch_calls(), 1);
    }
}
