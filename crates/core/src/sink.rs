//! 싱크 trait — 전달 목적지 확장 포인트 정의
//!
//! 실제 클라우드 클라이언트(감사 스토어, 오브젝트 스토리지, 메시지 큐)는
//! 이 trait 뒤에서 주입됩니다. 배치 디스패처는 구체 타입에 의존하지 않고
//! trait 경계만 사용하므로, 테스트에서는 인메모리 구현으로 대체합니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::event::QueueMessage;

/// 컬럼 저장소 파티션 키
///
/// (region, account, event-day) 세 필드에서 파생됩니다.
/// 벽시계가 아닌 레코드 필드만으로 계산되므로 재처리(replay) 시에도
/// 같은 파티션에 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    /// 리전 식별자
    pub region: String,
    /// 계정 식별자
    pub account_id: String,
    /// 이벤트 발생일 (YYYY-MM-DD)
    pub event_day: String,
}

impl PartitionKey {
    /// 오브젝트 키 접두어를 반환합니다.
    ///
    /// Hive 스타일 파티셔닝: `region=<r>/account=<a>/dt=<d>`
    pub fn object_prefix(&self) -> String {
        format!(
            "region={}/account={}/dt={}",
            self.region, self.account_id, self.event_day,
        )
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_prefix())
    }
}

/// 감사 로그 배치 호출 응답
///
/// 목적지가 배치 일부만 거부한 경우(partial-batch rejection),
/// 거부된 레코드 서브셋이 재시도용으로 반환됩니다.
#[derive(Debug, Default)]
pub struct AuditBatchResponse {
    /// 거부된 레코드 (빈 벡터 = 전체 수락)
    pub rejected: Vec<serde_json::Value>,
}

impl AuditBatchResponse {
    /// 전체 수락 응답을 생성합니다.
    pub fn accepted() -> Self {
        Self::default()
    }
}

/// 감사 로그 목적지 trait
///
/// 통합 이벤트 스토어에 감사 레코드 배치를 제출합니다.
/// 호출 1회당 레코드 수/바이트 상한은 디스패처가 보장합니다.
pub trait AuditSink: Send + Sync {
    /// 레코드 배치를 제출합니다.
    ///
    /// 부분 거부 시 거부된 서브셋을 응답에 담아 반환합니다.
    fn put_batch(
        &self,
        records: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<AuditBatchResponse, DeliveryError>> + Send;
}

/// 컬럼 저장소 trait
///
/// 파티션 키 하위에 압축된 배치 오브젝트를 1회 기록합니다.
pub trait ColumnarStore: Send + Sync {
    /// 파티션에 오브젝트를 기록합니다.
    ///
    /// `object_name`은 페이로드에서 파생된 결정적 이름이므로
    /// 같은 배치를 재기록해도 오브젝트가 중복 생성되지 않습니다.
    fn write_object(
        &self,
        partition: &PartitionKey,
        object_name: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Findings 큐 trait
///
/// 다운스트림 소비자가 비동기 임포트하는 메시지 목적지입니다.
pub trait FindingsQueue: Send + Sync {
    /// Findings 레코드 배치를 큐에 넣습니다.
    fn enqueue(
        &self,
        records: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Dead-letter 목적지 trait
pub trait DeadLetterQueue: Send + Sync {
    /// 처리 불가 메시지를 dead-letter 목적지로 발행합니다.
    fn publish(
        &self,
        message: &QueueMessage,
        reason: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

// --- 인메모리 구현 (테스트 및 로컬 개발용) ---

/// 테스트용 실패 주입 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// 일시적 실패를 반환
    Transient,
    /// 영구적 실패를 반환
    Permanent,
}

fn injected_error(mode: FailMode, destination: &str) -> DeliveryError {
    match mode {
        FailMode::Transient => DeliveryError::Transient {
            destination: destination.to_owned(),
            reason: "injected transient failure".to_owned(),
        },
        FailMode::Permanent => DeliveryError::Permanent {
            destination: destination.to_owned(),
            reason: "injected permanent failure".to_owned(),
        },
    }
}

/// 인메모리 감사 싱크
///
/// 수신한 배치를 그대로 저장합니다. `reject_next_n`으로 partial-batch
/// rejection을, `fail_mode`로 호출 실패를 주입할 수 있습니다.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<serde_json::Value>>,
    batch_calls: Mutex<usize>,
    reject_next_n: Mutex<usize>,
    fail_mode: Mutex<Option<FailMode>>,
}

impl MemoryAuditSink {
    /// 빈 싱크를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 호출에서 배치 앞쪽 `n`개 레코드를 거부하도록 설정합니다.
    pub fn reject_next(&self, n: usize) {
        *self.reject_next_n.lock().unwrap() = n;
    }

    /// 모든 호출이 지정된 모드로 실패하도록 설정합니다.
    pub fn set_fail_mode(&self, mode: Option<FailMode>) {
        *self.fail_mode.lock().unwrap() = mode;
    }

    /// 저장된 레코드의 사본을 반환합니다.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.records.lock().unwrap().clone()
    }

    /// put_batch 호출 횟수를 반환합니다.
    pub fn batch_calls(&self) -> usize {
        *self.batch_calls.lock().unwrap()
    }
}

impl AuditSink for MemoryAuditSink {
    async fn put_batch(
        &self,
        records: Vec<serde_json::Value>,
    ) -> Result<AuditBatchResponse, DeliveryError> {
        *self.batch_calls.lock().unwrap() += 1;

        if let Some(mode) = *self.fail_mode.lock().unwrap() {
            return Err(injected_error(mode, "memory-audit"));
        }

        let reject_n = {
            let mut guard = self.reject_next_n.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        let (rejected, accepted): (Vec<_>, Vec<_>) = records
            .into_iter()
            .enumerate()
            .partition(|(i, _)| *i < reject_n);

        self.records
            .lock()
            .unwrap()
            .extend(accepted.into_iter().map(|(_, r)| r));

        Ok(AuditBatchResponse {
            rejected: rejected.into_iter().map(|(_, r)| r).collect(),
        })
    }
}

/// 인메모리 컬럼 저장소
#[derive(Debug, Default)]
pub struct MemoryColumnarStore {
    objects: Mutex<HashMap<String, Bytes>>,
    fail_mode: Mutex<Option<FailMode>>,
}

impl MemoryColumnarStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 호출이 지정된 모드로 실패하도록 설정합니다.
    pub fn set_fail_mode(&self, mode: Option<FailMode>) {
        *self.fail_mode.lock().unwrap() = mode;
    }

    /// 기록된 오브젝트 키 목록을 반환합니다.
    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 키에 해당하는 오브젝트 페이로드를 반환합니다.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// 기록된 오브젝트 수를 반환합니다.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl ColumnarStore for MemoryColumnarStore {
    async fn write_object(
        &self,
        partition: &PartitionKey,
        object_name: &str,
        payload: Bytes,
    ) -> Result<(), DeliveryError> {
        if let Some(mode) = *self.fail_mode.lock().unwrap() {
            return Err(injected_error(mode, "memory-columnar"));
        }

        let key = format!("{}/{}", partition.object_prefix(), object_name);
        self.objects.lock().unwrap().insert(key, payload);
        Ok(())
    }
}

/// 인메모리 Findings 큐
#[derive(Debug, Default)]
pub struct MemoryFindingsQueue {
    entries: Mutex<Vec<serde_json::Value>>,
    enqueue_calls: Mutex<usize>,
    fail_next_n: Mutex<usize>,
}

impl MemoryFindingsQueue {
    /// 빈 큐를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 `n`회 호출이 일시적 실패하도록 설정합니다.
    ///
    /// bounded-retry 동작 검증에 사용합니다.
    pub fn fail_next(&self, n: usize) {
        *self.fail_next_n.lock().unwrap() = n;
    }

    /// 큐에 쌓인 엔트리의 사본을 반환합니다.
    pub fn entries(&self) -> Vec<serde_json::Value> {
        self.entries.lock().unwrap().clone()
    }

    /// enqueue 호출 횟수를 반환합니다.
    pub fn enqueue_calls(&self) -> usize {
        *self.enqueue_calls.lock().unwrap()
    }
}

impl FindingsQueue for MemoryFindingsQueue {
    async fn enqueue(&self, records: Vec<serde_json::Value>) -> Result<(), DeliveryError> {
        *self.enqueue_calls.lock().unwrap() += 1;

        {
            let mut fail_n = self.fail_next_n.lock().unwrap();
            if *fail_n > 0 {
                *fail_n -= 1;
                return Err(DeliveryError::Transient {
                    destination: "memory-findings".to_owned(),
                    reason: "injected transient failure".to_owned(),
                });
            }
        }

        self.entries.lock().unwrap().extend(records);
        Ok(())
    }
}

/// 인메모리 dead-letter 큐
#[derive(Debug, Default)]
pub struct MemoryDeadLetterQueue {
    entries: Mutex<Vec<(QueueMessage, String)>>,
}

impl MemoryDeadLetterQueue {
    /// 빈 큐를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// dead-letter된 (메시지, 사유) 목록의 사본을 반환합니다.
    pub fn entries(&self) -> Vec<(QueueMessage, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl DeadLetterQueue for MemoryDeadLetterQueue {
    async fn publish(&self, message: &QueueMessage, reason: &str) -> Result<(), DeliveryError> {
        self.entries
            .lock()
            .unwrap()
            .push((message.clone(), reason.to_owned()));
        Ok(())
    }
}
