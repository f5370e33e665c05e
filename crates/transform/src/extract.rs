//! 필드 추출 -- 점 표기 경로로 원본 이벤트에서 값을 추출합니다.
//!
//! 추출은 순수 연산입니다. 이벤트를 변경하지 않고, 같은 입력에
//! 대해 항상 같은 결과를 반환하며, 경로가 없으면 기본값 또는
//! null로 대체합니다.

use std::collections::HashMap;

use relayforge_core::event::RawEvent;
use serde_json::Value;

use crate::template::FieldExtractorSpec;

/// 메타데이터 경로 접두어 -- `metadata.sequence_number` 형태로
/// 큐 메타데이터에 접근합니다.
const METADATA_PREFIX: &str = "metadata.";
/// 처리 메타데이터 경로 접두어
const PROCESSING_PREFIX: &str = "processing.";

/// 필드 추출기
///
/// # 경로 문법
/// - `severity` -- 이벤트 본문의 최상위 키
/// - `resource.instanceDetails.instanceId` -- 중첩 객체 탐색
/// - `flowRecords.0.srcAddr` -- 배열 인덱스
/// - `metadata.sequence_number` -- 큐 메타데이터
/// - `processing.source` -- 처리 메타데이터
pub struct FieldExtractor;

impl FieldExtractor {
    /// 추출 사양 목록을 적용하여 이름 -> 값 맵을 생성합니다.
    ///
    /// 모든 경로가 실패한 사양은 기본값이 있으면 기본값, 없으면
    /// `Value::Null`로 채워집니다. 결과 맵은 항상 사양 목록과 같은
    /// 이름 집합을 가집니다.
    pub fn extract(event: &RawEvent, specs: &[FieldExtractorSpec]) -> HashMap<String, Value> {
        let mut values = HashMap::with_capacity(specs.len());
        for spec in specs {
            let value = spec
                .candidate_paths()
                .find_map(|path| Self::resolve_path(event, path).filter(|v| !is_empty(v)))
                .or_else(|| spec.default.clone())
                .unwrap_or(Value::Null);
            values.insert(spec.name.clone(), value);
        }
        values
    }

    /// 단일 경로를 해석하여 값을 반환합니다.
    ///
    /// 경로가 존재하지 않으면 `None`을 반환합니다.
    pub fn resolve_path(event: &RawEvent, path: &str) -> Option<Value> {
        if let Some(field) = path.strip_prefix(METADATA_PREFIX) {
            return metadata_field(event, field);
        }
        if let Some(field) = path.strip_prefix(PROCESSING_PREFIX) {
            return processing_field(event, field);
        }
        walk(&event.event_data, path).cloned()
    }
}

/// 점 표기 경로를 따라 JSON 값을 탐색합니다.
///
/// 숫자 세그먼트는 배열 인덱스로 해석합니다.
fn walk<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// null 또는 빈 문자열을 "값 없음"으로 취급합니다.
///
/// 후보 경로 체인에서 빈 값을 건너뛰고 다음 후보를 시도하기 위한
/// 기준입니다.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn metadata_field(event: &RawEvent, field: &str) -> Option<Value> {
    let meta = &event.event_metadata;
    let value = match field {
        "sequence_number" => &meta.sequence_number,
        "offset" => &meta.offset,
        "enqueued_time" => &meta.enqueued_time,
        "partition_id" => &meta.partition_id,
        _ => return None,
    };
    Some(Value::String(value.clone()))
}

fn processing_field(event: &RawEvent, field: &str) -> Option<Value> {
    let proc = &event.processing_metadata;
    let value = match field {
        "processed_timestamp" => &proc.processed_timestamp,
        "processor_version" => &proc.processor_version,
        "source" => &proc.source,
        _ => return None,
    };
    Some(Value::String(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> RawEvent {
        let mut event = RawEvent::from_value(json!({
            "alertId": "alert-123",
            "severity": "High",
            "resource": {
                "instanceDetails": {
                    "instanceId": "i-0abc",
                    "tags": [
                        {"key": "env", "value": "prod"},
                        {"key": "team", "value": "sec"}
                    ]
                }
            },
            "emptyField": "",
            "nullField": null
        }));
        event.event_metadata.sequence_number = "42".to_owned();
        event.processing_metadata.source = "queue-a".to_owned();
        event
    }

    fn spec(name: &str, path: &str) -> FieldExtractorSpec {
        FieldExtractorSpec {
            name: name.to_owned(),
            path: Some(path.to_owned()),
            paths: vec![],
            default: None,
        }
    }

    #[test]
    fn resolves_top_level_field() {
        let event = sample_event();
        assert_eq!(
            FieldExtractor::resolve_path(&event, "alertId"),
            Some(json!("alert-123"))
        );
    }

    #[test]
    fn resolves_nested_field() {
        let event = sample_event();
        assert_eq!(
            FieldExtractor::resolve_path(&event, "resource.instanceDetails.instanceId"),
            Some(json!("i-0abc"))
        );
    }

    #[test]
    fn resolves_array_index() {
        let event = sample_event();
        assert_eq!(
            FieldExtractor::resolve_path(&event, "resource.instanceDetails.tags.1.value"),
            Some(json!("sec"))
        );
    }

    #[test]
    fn missing_path_returns_none() {
        let event = sample_event();
        assert_eq!(FieldExtractor::resolve_path(&event, "no.such.path"), None);
        assert_eq!(
            FieldExtractor::resolve_path(&event, "resource.instanceDetails.tags.9"),
            None
        );
    }

    #[test]
    fn resolves_metadata_fields() {
        let event = sample_event();
        assert_eq!(
            FieldExtractor::resolve_path(&event, "metadata.sequence_number"),
            Some(json!("42"))
        );
        assert_eq!(
            FieldExtractor::resolve_path(&event, "processing.source"),
            Some(json!("queue-a"))
        );
        assert_eq!(FieldExtractor::resolve_path(&event, "metadata.unknown"), None);
    }

    #[test]
    fn extract_fills_missing_with_default_or_null() {
        let event = sample_event();
        let specs = vec![
            spec("alert_id", "alertId"),
            FieldExtractorSpec {
                name: "region".to_owned(),
                path: Some("region".to_owned()),
                paths: vec![],
                default: Some(json!("unknown")),
            },
            spec("missing", "nope"),
        ];

        let values = FieldExtractor::extract(&event, &specs);
        assert_eq!(values["alert_id"], json!("alert-123"));
        assert_eq!(values["region"], json!("unknown"));
        assert_eq!(values["missing"], Value::Null);
    }

    #[test]
    fn candidate_chain_takes_first_non_empty() {
        let event = sample_event();
        let specs = vec![FieldExtractorSpec {
            name: "id".to_owned(),
            path: None,
            paths: vec![
                "emptyField".to_owned(),
                "nullField".to_owned(),
                "alertId".to_owned(),
            ],
            default: None,
        }];

        let values = FieldExtractor::extract(&event, &specs);
        assert_eq!(values["id"], json!("alert-123"));
    }

    #[test]
    fn extraction_is_pure() {
        let event = sample_event();
        let specs = vec![spec("alert_id", "alertId")];

        let first = FieldExtractor::extract(&event, &specs);
        let second = FieldExtractor::extract(&event, &specs);
        assert_eq!(first, second);
        // 이벤트 본문은 변경되지 않음
        assert_eq!(event.event_data["alertId"], json!("alert-123"));
    }

    #[test]
    fn non_string_values_are_preserved() {
        let event = RawEvent::from_value(json!({
            "count": 5,
            "scores": [1.5, 2.5],
            "enabled": true
        }));
        assert_eq!(FieldExtractor::resolve_path(&event, "count"), Some(json!(5)));
        assert_eq!(
            FieldExtractor::resolve_path(&event, "scores.0"),
            Some(json!(1.5))
        );
        assert_eq!(
            FieldExtractor::resolve_path(&event, "enabled"),
            Some(json!(true))
        );
    }
}
