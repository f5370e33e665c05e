//! 이벤트 엔벨로프 — 큐에서 수신되는 메시지의 기본 단위
//!
//! 입력 이벤트는 제공자별 스키마가 제각각이므로 [`RawEvent`]의
//! `event_data`는 타입을 고정하지 않은 JSON 문서로 유지합니다.
//! 필드 접근은 변환 파이프라인의 경로 추출기가 담당합니다.
//! [`QueueMessage`]는 큐 전송 정보(메시지 ID, 출처 큐)를 함께 실어
//! dead-letter 사이클 방지에 사용됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 이벤트 transport 메타데이터
///
/// 소스 큐가 부여한 순서/오프셋 정보입니다. 값이 없을 수 있으므로
/// 모든 필드는 기본값(빈 문자열)을 허용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMetadata {
    /// 시퀀스 번호
    pub sequence_number: String,
    /// 파티션 내 오프셋
    pub offset: String,
    /// 큐 유입 시각 (ISO 8601 문자열, transport가 부여)
    pub enqueued_time: String,
    /// 파티션 ID
    pub partition_id: String,
}

/// 수집 처리 메타데이터
///
/// 이벤트를 큐에 넣은 수집 시스템이 부여한 정보입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingMetadata {
    /// 수집 처리 시각 (ISO 8601 문자열)
    pub processed_timestamp: String,
    /// 수집 시스템 버전
    pub processor_version: String,
    /// 소스 식별자 (원본 이벤트 출처)
    pub source: String,
}

/// 제공자 중립 이벤트 엔벨로프
///
/// `event_data`는 제공자별 필드를 그대로 담는 중첩 JSON 문서입니다.
/// 이벤트 타입을 결정할 수 있는 필드가 `event_data`에 존재해야 하며,
/// 없으면 해당 이벤트는 라우팅 불가로 즉시 실패합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    /// 제공자별 원본 이벤트 필드 (중첩 key/value 구조)
    pub event_data: serde_json::Value,
    /// transport 메타데이터
    #[serde(default)]
    pub event_metadata: EventMetadata,
    /// 수집 처리 메타데이터
    #[serde(default)]
    pub processing_metadata: ProcessingMetadata,
}

impl RawEvent {
    /// JSON 바이트에서 엔벨로프를 파싱합니다.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// 이벤트 본문만으로 엔벨로프를 생성합니다.
    ///
    /// 메타데이터는 기본값으로 채워집니다.
    pub fn from_value(event_data: serde_json::Value) -> Self {
        Self {
            event_data,
            event_metadata: EventMetadata::default(),
            processing_metadata: ProcessingMetadata::default(),
        }
    }
}

/// 큐 메시지 — RawEvent + 큐 전송 정보
///
/// 배치 오케스트레이터의 입력 단위입니다. `source_queue`는 이 메시지가
/// 어느 큐에서 왔는지 기록하며, dead-letter 큐에서 재유입된 메시지를
/// 같은 dead-letter 경로로 되돌려 보내는 사이클을 차단하는 데 쓰입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    /// 메시지 ID (transport 시퀀스 번호 또는 생성된 UUID)
    pub id: String,
    /// 이 메시지를 수신한 큐의 식별자
    pub source_queue: String,
    /// 이벤트 본문
    pub event: RawEvent,
}

impl QueueMessage {
    /// 새 큐 메시지를 생성합니다.
    ///
    /// transport 시퀀스 번호가 있으면 메시지 ID로 사용하고,
    /// 없으면 UUID v4를 생성합니다.
    pub fn new(event: RawEvent, source_queue: impl Into<String>) -> Self {
        let id = if event.event_metadata.sequence_number.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            event.event_metadata.sequence_number.clone()
        };
        Self {
            id,
            source_queue: source_queue.into(),
            event,
        }
    }

    /// 메시지 ID를 지정하여 큐 메시지를 생성합니다.
    pub fn with_id(
        event: RawEvent,
        source_queue: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_queue: source_queue.into(),
            event,
        }
    }
}

impl fmt::Display for QueueMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // id는 외부 공급 값이므로 문자 단위로 잘라냅니다
        let prefix: String = self.id.chars().take(8).collect();
        write!(
            f,
            "QueueMessage[{}] queue={} source={}",
            prefix, self.source_queue, self.event.processing_metadata.source,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_envelope() -> RawEvent {
        RawEvent {
            event_data: json!({
                "alertId": "a1",
                "severity": "High",
                "category": "SecurityAlert",
            }),
            event_metadata: EventMetadata {
                sequence_number: "seq-42".to_owned(),
                offset: "1024".to_owned(),
                enqueued_time: "2024-03-01T10:00:00Z".to_owned(),
                partition_id: "0".to_owned(),
            },
            processing_metadata: ProcessingMetadata {
                processed_timestamp: "2024-03-01T10:00:01Z".to_owned(),
                processor_version: "1.2.0".to_owned(),
                source: "cloud-alerts".to_owned(),
            },
        }
    }

    #[test]
    fn parse_full_envelope() {
        let raw = br#"{
            "event_data": {"alertId": "a1", "severity": "High"},
            "event_metadata": {"sequence_number": "7", "offset": "3", "enqueued_time": "2024-03-01T10:00:00Z", "partition_id": "1"},
            "processing_metadata": {"processed_timestamp": "2024-03-01T10:00:01Z", "processor_version": "1.0.0", "source": "scanner"}
        }"#;
        let event = RawEvent::from_json(raw).unwrap();
        assert_eq!(event.event_data["alertId"], "a1");
        assert_eq!(event.event_metadata.sequence_number, "7");
        assert_eq!(event.processing_metadata.source, "scanner");
    }

    #[test]
    fn parse_envelope_without_metadata_blocks() {
        // 메타데이터 블록이 없어도 기본값으로 파싱되어야 함
        let raw = br#"{"event_data": {"alertId": "a1"}}"#;
        let event = RawEvent::from_json(raw).unwrap();
        assert_eq!(event.event_data["alertId"], "a1");
        assert!(event.event_metadata.sequence_number.is_empty());
        assert!(event.processing_metadata.source.is_empty());
    }

    #[test]
    fn parse_invalid_json_fails() {
        assert!(RawEvent::from_json(b"not json").is_err());
    }

    #[test]
    fn message_id_from_sequence_number() {
        let message = QueueMessage::new(sample_envelope(), "ingest-queue");
        assert_eq!(message.id, "seq-42");
        assert_eq!(message.source_queue, "ingest-queue");
    }

    #[test]
    fn message_id_generated_when_sequence_missing() {
        let mut event = sample_envelope();
        event.event_metadata.sequence_number.clear();
        let message = QueueMessage::new(event, "ingest-queue");
        // UUID v4 형식 확인: 8-4-4-4-12
        assert_eq!(message.id.len(), 36);
        assert_eq!(message.id.chars().filter(|c| *c == '-').count(), 4);
    }

    #[test]
    fn message_with_explicit_id() {
        let message = QueueMessage::with_id(sample_envelope(), "dlq", "msg-1");
        assert_eq!(message.id, "msg-1");
        assert_eq!(message.source_queue, "dlq");
    }

    #[test]
    fn message_display() {
        let message = QueueMessage::new(sample_envelope(), "ingest-queue");
        let display = message.to_string();
        assert!(display.contains("ingest-queue"));
        assert!(display.contains("cloud-alerts"));
    }

    #[test]
    fn message_display_with_multibyte_id() {
        // 공급자 id의 8번째 문자 경계가 멀티바이트 안에 걸려도 표시 가능
        let message = QueueMessage::with_id(sample_envelope(), "ingest-queue", "시퀀스-아이디-123");
        let display = message.to_string();
        assert!(display.contains("QueueMessage[시퀀스-아이디-"));
    }

    #[test]
    fn envelope_serialize_roundtrip() {
        let event = sample_envelope();
        let json = serde_json::to_string(&event).unwrap();
        let deserialized = RawEvent::from_json(json.as_bytes()).unwrap();
        assert_eq!(deserialized.event_data, event.event_data);
        assert_eq!(
            deserialized.event_metadata.partition_id,
            event.event_metadata.partition_id
        );
    }

    #[test]
    fn messages_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<RawEvent>();
        assert_send_sync::<QueueMessage>();
    }
}
