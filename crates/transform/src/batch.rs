//! 배치 오케스트레이션 -- 메시지 배치의 변환 단계를 조율합니다.
//!
//! 수신한 메시지마다 이벤트 타입을 결정하고, 활성화된 각 형식에
//! 대해 추출 -> 렌더링 -> 검증을 수행합니다. 모든 실패는
//! (메시지, 형식) 경계에서 격리됩니다. 한 형식의 실패가 같은
//! 메시지의 다른 형식이나 다른 메시지의 처리를 막지 않으며,
//! 배치 호출 밖으로 에러가 전파되지 않습니다.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use relayforge_core::event::{QueueMessage, RawEvent};
use relayforge_core::metrics::{
    LABEL_FORMAT, TRANSFORM_BATCH_DURATION_SECONDS, TRANSFORM_MESSAGES_RECEIVED_TOTAL,
    TRANSFORM_RECORDS_RENDERED_TOTAL, TRANSFORM_UNROUTABLE_TOTAL,
    TRANSFORM_VALIDATION_FAILURES_TOTAL,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TransformConfig;
use crate::error::TransformError;
use crate::extract::FieldExtractor;
use crate::render::Renderer;
use crate::template::{OutputFormat, TemplateStore};
use crate::validate::Validator;

/// (메시지, 형식) 쌍 하나의 최종 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// 목적지까지 전달 완료
    Delivered,
    /// 형식 비활성화로 건너뜀
    SkippedDisabled,
    /// 변환/검증 단계 실패 (영구적)
    ValidationFailed {
        /// 실패 사유
        reason: String,
    },
    /// 전달 단계 실패
    DeliveryFailed {
        /// 재시도로 해소될 수 있는 실패인지
        transient: bool,
        /// 실패 사유
        reason: String,
    },
}

/// (메시지, 형식) 쌍 하나의 결과 엔트리
#[derive(Debug, Clone)]
pub struct BatchResultEntry {
    /// 메시지 ID
    pub message_id: String,
    /// 출력 형식
    pub format: OutputFormat,
    /// 결과
    pub outcome: FormatOutcome,
}

/// 배치 처리 요약
///
/// 부분 실패가 있어도 항상 반환됩니다. 프로세스 전역 카운터 없이
/// 호출별로 누적됩니다.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// 배치 내 메시지 수
    pub total_messages: usize,
    /// 전달 완료 엔트리 수
    pub delivered: usize,
    /// 변환/검증 실패 엔트리 수
    pub validation_failed: usize,
    /// 전달 실패 엔트리 수
    pub delivery_failed: usize,
    /// 건너뛴 엔트리 수
    pub skipped: usize,
    /// (메시지, 형식) 엔트리 전체
    pub entries: Vec<BatchResultEntry>,
}

impl BatchSummary {
    /// 엔트리 목록에서 요약을 생성합니다.
    pub fn from_entries(total_messages: usize, entries: Vec<BatchResultEntry>) -> Self {
        let mut summary = Self {
            total_messages,
            entries: Vec::new(),
            ..Self::default()
        };
        for entry in &entries {
            match &entry.outcome {
                FormatOutcome::Delivered => summary.delivered += 1,
                FormatOutcome::SkippedDisabled => summary.skipped += 1,
                FormatOutcome::ValidationFailed { .. } => summary.validation_failed += 1,
                FormatOutcome::DeliveryFailed { .. } => summary.delivery_failed += 1,
            }
        }
        summary.entries = entries;
        summary
    }

    /// 특정 메시지의 엔트리만 반환합니다.
    pub fn entries_for(&self, message_id: &str) -> impl Iterator<Item = &BatchResultEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.message_id == message_id)
    }
}

/// 활성화된 출력 형식 집합
#[derive(Debug, Clone, Copy)]
pub struct EnabledFormats {
    /// 감사 로그
    pub audit_log: bool,
    /// 스키마 레코드
    pub schema: bool,
    /// Findings
    pub findings: bool,
}

impl EnabledFormats {
    /// 설정에서 활성 형식 집합을 생성합니다.
    pub fn from_config(config: &TransformConfig) -> Self {
        Self {
            audit_log: config.audit_log_enabled,
            schema: config.schema_enabled,
            findings: config.findings_enabled,
        }
    }

    /// 해당 형식이 활성화되어 있는지 확인합니다.
    pub fn is_enabled(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::AuditLog => self.audit_log,
            OutputFormat::Schema => self.schema,
            OutputFormat::Findings => self.findings,
        }
    }
}

/// 목적지로 향하는 변환 완료 레코드
#[derive(Debug, Clone)]
pub struct DestinedRecord {
    /// 원본 메시지 ID
    pub message_id: String,
    /// 전달용 직렬화 레코드
    pub record: Value,
}

/// 변환 단계 결과 -- 목적지별 레코드 그룹과 변환 단계 엔트리
///
/// `transform_entries`에는 변환 단계에서 이미 확정된 실패/건너뜀
/// 엔트리만 담깁니다. 성공 레코드의 최종 결과는 전달 이후에
/// 확정됩니다.
#[derive(Debug, Default)]
pub struct TransformedBatch {
    /// 배치 내 메시지 수
    pub total_messages: usize,
    /// 변환 단계에서 확정된 엔트리 (실패/건너뜀)
    pub transform_entries: Vec<BatchResultEntry>,
    /// 감사 채널로 향하는 레코드
    pub audit_records: Vec<DestinedRecord>,
    /// 컬럼 저장소로 향하는 레코드
    pub schema_records: Vec<DestinedRecord>,
    /// Findings 큐로 향하는 레코드
    pub findings_records: Vec<DestinedRecord>,
}

/// 배치 변환 프로세서
///
/// 템플릿 저장소는 초기화 이후 읽기 전용이므로 여러 배치가
/// 동시에 같은 프로세서를 공유할 수 있습니다.
pub struct BatchProcessor {
    store: Arc<TemplateStore>,
    renderer: Renderer,
    validator: Validator,
    enabled: EnabledFormats,
}

impl BatchProcessor {
    /// 새 배치 프로세서를 생성합니다.
    pub fn new(config: &TransformConfig, store: Arc<TemplateStore>) -> Result<Self, TransformError> {
        config.validate()?;
        Ok(Self {
            store,
            renderer: Renderer::new()?,
            validator: Validator::new().with_description_max_chars(config.description_max_chars),
            enabled: EnabledFormats::from_config(config),
        })
    }

    /// 활성 형식 집합을 반환합니다.
    pub fn enabled_formats(&self) -> EnabledFormats {
        self.enabled
    }

    /// 메시지 배치를 변환합니다.
    ///
    /// 에러를 반환하지 않습니다. 모든 실패는 엔트리로 기록됩니다.
    pub fn process(&self, messages: &[QueueMessage]) -> TransformedBatch {
        let started = Instant::now();
        let mut batch = TransformedBatch {
            total_messages: messages.len(),
            ..TransformedBatch::default()
        };

        counter!(TRANSFORM_MESSAGES_RECEIVED_TOTAL).increment(messages.len() as u64);

        for message in messages {
            self.process_message(message, &mut batch);
        }

        histogram!(TRANSFORM_BATCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        batch
    }

    fn process_message(&self, message: &QueueMessage, batch: &mut TransformedBatch) {
        let Some(event_type) = resolve_event_type(&message.event) else {
            counter!(TRANSFORM_UNROUTABLE_TOTAL).increment(1);
            let err = TransformError::Unroutable {
                message_id: message.id.clone(),
            };
            warn!(message_id = %message.id, error = %err, "no resolvable event type");
            // 라우팅 불가 메시지는 활성화된 모든 형식이 실패로 기록됩니다
            for format in OutputFormat::all() {
                if self.enabled.is_enabled(format) {
                    batch.transform_entries.push(BatchResultEntry {
                        message_id: message.id.clone(),
                        format,
                        outcome: FormatOutcome::ValidationFailed {
                            reason: err.to_string(),
                        },
                    });
                }
            }
            return;
        };

        for format in OutputFormat::all() {
            if !self.enabled.is_enabled(format) {
                batch.transform_entries.push(BatchResultEntry {
                    message_id: message.id.clone(),
                    format,
                    outcome: FormatOutcome::SkippedDisabled,
                });
                continue;
            }

            match self.transform_one(message, &event_type, format) {
                Ok(record) => {
                    counter!(TRANSFORM_RECORDS_RENDERED_TOTAL, LABEL_FORMAT => format.as_str())
                        .increment(1);
                    let destined = DestinedRecord {
                        message_id: message.id.clone(),
                        record,
                    };
                    match format {
                        OutputFormat::AuditLog => batch.audit_records.push(destined),
                        OutputFormat::Schema => batch.schema_records.push(destined),
                        OutputFormat::Findings => batch.findings_records.push(destined),
                    }
                }
                Err(e) => {
                    counter!(TRANSFORM_VALIDATION_FAILURES_TOTAL, LABEL_FORMAT => format.as_str())
                        .increment(1);
                    debug!(
                        message_id = %message.id,
                        format = %format,
                        error = %e,
                        "transform failed for (message, format)"
                    );
                    batch.transform_entries.push(BatchResultEntry {
                        message_id: message.id.clone(),
                        format,
                        outcome: FormatOutcome::ValidationFailed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }
    }

    /// 하나의 (메시지, 형식)에 대해 추출 -> 렌더링 -> 검증을 수행합니다.
    fn transform_one(
        &self,
        message: &QueueMessage,
        event_type: &str,
        format: OutputFormat,
    ) -> Result<Value, TransformError> {
        let template =
            self.store
                .get(event_type, format)
                .ok_or_else(|| TransformError::TemplateMissing {
                    event_type: event_type.to_owned(),
                    format: format.to_string(),
                })?;

        let fields = FieldExtractor::extract(&message.event, &template.extractors);
        let candidate = self.renderer.render(&template, &fields)?;
        let record = self.validator.validate(format, candidate)?;
        record.to_value()
    }
}

/// 이벤트 타입을 결정합니다.
///
/// 명시적 `eventType` 필드가 있으면 그 값을 사용합니다. 없으면
/// 이벤트 형태에 대한 고정 우선순위 휴리스틱을 적용합니다:
/// 1. `alertId` 존재 -> `security_alert`
/// 2. `assessmentId` 존재 -> `assessment`
/// 3. `findingId` 또는 `complianceStandard` 존재 -> `compliance`
/// 4. `flowRecords` 또는 `srcAddr` 존재 -> `network_flow`
///
/// 어느 것에도 해당하지 않으면 `None` (라우팅 불가)입니다.
pub fn resolve_event_type(event: &RawEvent) -> Option<String> {
    let data = &event.event_data;

    if let Some(explicit) = data.get("eventType").and_then(Value::as_str) {
        if !explicit.is_empty() {
            return Some(explicit.to_owned());
        }
    }

    if data.get("alertId").is_some() {
        return Some("security_alert".to_owned());
    }
    if data.get("assessmentId").is_some() {
        return Some("assessment".to_owned());
    }
    if data.get("findingId").is_some() || data.get("complianceStandard").is_some() {
        return Some("compliance".to_owned());
    }
    if data.get("flowRecords").is_some() || data.get("srcAddr").is_some() {
        return Some("network_flow".to_owned());
    }

    None
}
