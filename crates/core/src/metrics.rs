//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `relayforge_`
//! - 모듈명: `transform_`, `delivery_`, `dlq_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use relayforge_core::metrics;
//! use metrics::counter;
//!
//! counter!(relayforge_core::metrics::TRANSFORM_RECORDS_RENDERED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 출력 형식 레이블 키 (audit_log, schema, findings)
pub const LABEL_FORMAT: &str = "format";

/// 목적지 레이블 키 (audit, columnar, findings, dead_letter)
pub const LABEL_DESTINATION: &str = "destination";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 이벤트 타입 레이블 키 (security_alert, assessment, ...)
pub const LABEL_EVENT_TYPE: &str = "event_type";

// ─── Transform 메트릭 ──────────────────────────────────────────────

/// Transform: 수신한 메시지 수 (counter)
pub const TRANSFORM_MESSAGES_RECEIVED_TOTAL: &str = "relayforge_transform_messages_received_total";

/// Transform: 렌더링된 레코드 수 (counter, label: format)
pub const TRANSFORM_RECORDS_RENDERED_TOTAL: &str = "relayforge_transform_records_rendered_total";

/// Transform: 검증 실패 수 (counter, label: format)
pub const TRANSFORM_VALIDATION_FAILURES_TOTAL: &str =
    "relayforge_transform_validation_failures_total";

/// Transform: 라우팅 불가 메시지 수 (counter)
pub const TRANSFORM_UNROUTABLE_TOTAL: &str = "relayforge_transform_unroutable_total";

/// Transform: 배치 처리 지연 시간 (histogram, 초)
pub const TRANSFORM_BATCH_DURATION_SECONDS: &str = "relayforge_transform_batch_duration_seconds";

/// Transform: 로드된 매핑 템플릿 수 (gauge)
pub const TRANSFORM_TEMPLATES_LOADED: &str = "relayforge_transform_templates_loaded";

// ─── Delivery 메트릭 ───────────────────────────────────────────────

/// Delivery: 전달된 레코드 수 (counter, labels: destination, result)
pub const DELIVERY_RECORDS_TOTAL: &str = "relayforge_delivery_records_total";

/// Delivery: 목적지 호출 수 (counter, labels: destination, result)
pub const DELIVERY_CALLS_TOTAL: &str = "relayforge_delivery_calls_total";

/// Delivery: 목적지에서 거부되어 재시도한 레코드 수 (counter, label: destination)
pub const DELIVERY_REJECTED_RETRIED_TOTAL: &str = "relayforge_delivery_rejected_retried_total";

/// Delivery: 목적지 호출 지연 시간 (histogram, 초, label: destination)
pub const DELIVERY_CALL_DURATION_SECONDS: &str = "relayforge_delivery_call_duration_seconds";

// ─── DLQ 메트릭 ────────────────────────────────────────────────────

/// DLQ: dead-letter 큐로 보낸 메시지 수 (counter)
pub const DLQ_MESSAGES_PUBLISHED_TOTAL: &str = "relayforge_dlq_messages_published_total";

/// DLQ: 순환 감지로 전송을 거부한 수 (counter)
pub const DLQ_CYCLES_PREVENTED_TOTAL: &str = "relayforge_dlq_cycles_prevented_total";

/// DLQ: 재시도 가능으로 분류된 메시지 수 (counter)
pub const DLQ_RETRYABLE_TOTAL: &str = "relayforge_dlq_retryable_total";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "relayforge_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, labels: version, rust_version)
pub const DAEMON_BUILD_INFO: &str = "relayforge_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 배치 처리 지연 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위, 로그 단위 분포
pub const BATCH_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

/// 목적지 호출 지연 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (네트워크 I/O 포함)
pub const CALL_DURATION_BUCKETS: [f64; 9] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `relayforge-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Transform
    describe_counter!(
        TRANSFORM_MESSAGES_RECEIVED_TOTAL,
        "Total number of queue messages received for transformation"
    );
    describe_counter!(
        TRANSFORM_RECORDS_RENDERED_TOTAL,
        "Total number of output records rendered per format"
    );
    describe_counter!(
        TRANSFORM_VALIDATION_FAILURES_TOTAL,
        "Total number of rendered records rejected by validation"
    );
    describe_counter!(
        TRANSFORM_UNROUTABLE_TOTAL,
        "Total number of messages with no resolvable event type"
    );
    describe_histogram!(
        TRANSFORM_BATCH_DURATION_SECONDS,
        "Time to transform a single message batch in seconds"
    );
    describe_gauge!(
        TRANSFORM_TEMPLATES_LOADED,
        "Number of mapping templates currently loaded"
    );

    // Delivery
    describe_counter!(
        DELIVERY_RECORDS_TOTAL,
        "Total number of records delivered per destination and result"
    );
    describe_counter!(
        DELIVERY_CALLS_TOTAL,
        "Total number of destination calls per destination and result"
    );
    describe_counter!(
        DELIVERY_REJECTED_RETRIED_TOTAL,
        "Total number of records rejected by a destination and retried"
    );
    describe_histogram!(
        DELIVERY_CALL_DURATION_SECONDS,
        "Destination call latency in seconds"
    );

    // DLQ
    describe_counter!(
        DLQ_MESSAGES_PUBLISHED_TOTAL,
        "Total number of messages published to the dead-letter queue"
    );
    describe_counter!(
        DLQ_CYCLES_PREVENTED_TOTAL,
        "Total number of dead-letter publishes refused due to cycle detection"
    );
    describe_counter!(
        DLQ_RETRYABLE_TOTAL,
        "Total number of messages classified as retryable"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Relayforge daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version labels)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        TRANSFORM_MESSAGES_RECEIVED_TOTAL,
        TRANSFORM_RECORDS_RENDERED_TOTAL,
        TRANSFORM_VALIDATION_FAILURES_TOTAL,
        TRANSFORM_UNROUTABLE_TOTAL,
        TRANSFORM_BATCH_DURATION_SECONDS,
        TRANSFORM_TEMPLATES_LOADED,
        DELIVERY_RECORDS_TOTAL,
        DELIVERY_CALLS_TOTAL,
        DELIVERY_REJECTED_RETRIED_TOTAL,
        DELIVERY_CALL_DURATION_SECONDS,
        DLQ_MESSAGES_PUBLISHED_TOTAL,
        DLQ_CYCLES_PREVENTED_TOTAL,
        DLQ_RETRYABLE_TOTAL,
        DAEMON_UPTIME_SECONDS,
        DAEMON_BUILD_INFO,
    ];

    #[test]
    fn all_metrics_start_with_relayforge_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("relayforge_"),
                "Metric '{}' does not start with 'relayforge_' prefix",
                name
            );
        }
    }

    #[test]
    fn metric_name_count_matches_modules() {
        // 6 Transform + 4 Delivery + 3 DLQ + 2 Daemon
        assert_eq!(ALL_METRIC_NAMES.len(), 15);
    }

    #[test]
    fn describe_all_does_not_panic() {
        // describe_all() should not panic even without a recorder installed
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        let labels = [LABEL_FORMAT, LABEL_DESTINATION, LABEL_RESULT, LABEL_EVENT_TYPE];
        for label in &labels {
            assert_eq!(
                label.to_lowercase(),
                *label,
                "Label key '{}' should be lowercase",
                label
            );
        }
    }

    #[test]
    fn batch_duration_buckets_are_sorted() {
        let buckets = BATCH_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }

    #[test]
    fn call_duration_buckets_are_sorted() {
        let buckets = CALL_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}
