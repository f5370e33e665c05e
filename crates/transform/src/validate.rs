//! 출력 레코드 검증 -- 렌더링 결과를 형식별 타입 레코드로 확정합니다.
//!
//! 필수 필드 존재, 필드 타입, 열거값, 문자열 길이 제한을 검사합니다.
//! Description 길이 초과는 거부가 아니라 잘라내기로 처리합니다
//! (잘라내기는 변환이지 실패가 아님). 검증 실패는 구조화된 에러
//! {필드 경로, 제약, 실제 값}로 보고되며 panic하지 않습니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;
use crate::template::OutputFormat;

/// Findings 레코드 고정 스키마 버전
pub const FINDINGS_SCHEMA_VERSION: &str = "2018-10-08";

/// 검증을 통과한 출력 레코드
///
/// 세 가지 형식 변형 중 하나이며, 생성 이후 전달 디스패처로
/// 넘겨질 때까지 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    /// 감사 로그 레코드
    AuditLog(AuditLogRecord),
    /// OCSF 스타일 스키마 레코드
    Schema(SchemaRecord),
    /// Findings 레코드
    Findings(FindingsRecord),
}

impl OutputRecord {
    /// 레코드의 출력 형식을 반환합니다.
    pub fn format(&self) -> OutputFormat {
        match self {
            OutputRecord::AuditLog(_) => OutputFormat::AuditLog,
            OutputRecord::Schema(_) => OutputFormat::Schema,
            OutputRecord::Findings(_) => OutputFormat::Findings,
        }
    }

    /// 전달용 JSON 값으로 직렬화합니다.
    pub fn to_value(&self) -> Result<Value, TransformError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// 감사 로그 레코드
///
/// 스트리밍 감사 채널로 전달되는 CloudTrail 스타일 레코드입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogRecord {
    /// 레코드 버전
    pub event_version: String,
    /// 행위자 신원
    pub user_identity: UserIdentity,
    /// 이벤트 발생 시각 (ISO-8601)
    pub event_time: String,
    /// 이벤트 소스
    pub event_source: String,
    /// 이벤트 이름
    pub event_name: String,
    /// 리전
    pub aws_region: String,
    /// 요청 소스 IP
    #[serde(rename = "sourceIPAddress")]
    pub source_ip_address: String,
    /// 관련 리소스 목록
    pub resources: Vec<AuditResource>,
    /// 자유 형식 추가 데이터
    pub additional_event_data: Value,
    /// 템플릿이 추가한 비필수 필드
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// 감사 레코드 행위자 신원
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// 신원 유형 (AWSService, IAMUser 등)
    #[serde(rename = "type")]
    pub identity_type: String,
    /// 주체 식별자
    pub principal_id: String,
    /// 계정 식별자
    pub account_id: String,
}

/// 감사 레코드 리소스 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResource {
    /// 리소스 소유 계정
    pub account_id: String,
    /// 리소스 유형
    #[serde(rename = "type")]
    pub resource_type: String,
    /// 리소스 ARN
    #[serde(rename = "ARN")]
    pub arn: String,
}

/// OCSF 스타일 스키마 레코드
///
/// 컬럼 저장소로 전달되는 분석용 레코드입니다. 이벤트 타입에 따라
/// 선택 블록(connection_info, src/dst_endpoint, traffic, cloud)이
/// 포함됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// 이벤트 시각 (epoch 밀리초)
    pub time: i64,
    /// 클래스 식별자
    pub class_uid: i64,
    /// 클래스 이름
    pub class_name: String,
    /// 카테고리 식별자
    pub category_uid: i64,
    /// 카테고리 이름
    pub category_name: String,
    /// 활동 식별자
    pub activity_id: i64,
    /// 활동 이름
    pub activity_name: String,
    /// 심각도 식별자 (1-5)
    pub severity_id: i64,
    /// 심각도 이름
    pub severity: String,
    /// 스키마 메타데이터
    pub metadata: SchemaMetadata,
    /// 네트워크 연결 정보 (network_flow 이벤트)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<Value>,
    /// 출발 엔드포인트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_endpoint: Option<Value>,
    /// 도착 엔드포인트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_endpoint: Option<Value>,
    /// 트래픽 통계
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<Value>,
    /// 클라우드 컨텍스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<Value>,
    /// 템플릿이 추가한 비필수 필드
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// 스키마 레코드 메타데이터 블록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// 스키마 버전
    pub version: String,
    /// 생산 제품 정보
    pub product: SchemaProduct,
}

/// 스키마 레코드 제품 블록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProduct {
    /// 제품 이름
    pub name: String,
    /// 벤더 이름
    pub vendor_name: String,
    /// 제품 버전
    pub version: String,
}

/// Findings 레코드
///
/// findings 큐로 전달되는 보안 발견 사항 레코드입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindingsRecord {
    /// 고정 스키마 버전 ("2018-10-08")
    pub schema_version: String,
    /// 발견 사항 고유 식별자
    pub id: String,
    /// 생산 제품 ARN
    pub product_arn: String,
    /// 생성기 식별자
    pub generator_id: String,
    /// 계정 식별자
    pub aws_account_id: String,
    /// 발견 사항 분류 목록
    pub types: Vec<String>,
    /// 생성 시각 (ISO-8601)
    pub created_at: String,
    /// 갱신 시각 (ISO-8601)
    pub updated_at: String,
    /// 심각도
    pub severity: FindingsSeverity,
    /// 제목
    pub title: String,
    /// 설명 (최대 1024자, 초과 시 잘라냄)
    pub description: String,
    /// 관련 리소스 목록
    pub resources: Vec<FindingsResource>,
    /// 워크플로 상태 (항상 "NEW")
    pub workflow_state: String,
    /// 레코드 상태 (ACTIVE 또는 ARCHIVED)
    pub record_state: String,
    /// 템플릿이 추가한 비필수 필드 (Compliance, Remediation 등)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Findings 심각도 블록
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindingsSeverity {
    /// 5단계 대문자 레이블
    pub label: String,
    /// 0-100 정규화 점수
    pub normalized: i64,
}

/// Findings 리소스 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindingsResource {
    /// 리소스 유형
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// 리소스 식별자
    pub id: String,
    /// 파티션
    pub partition: String,
    /// 리전
    pub region: String,
}

/// 허용되는 심각도 레이블
const SEVERITY_LABELS: &[&str] = &["INFORMATIONAL", "LOW", "MEDIUM", "HIGH", "CRITICAL"];
/// 허용되는 레코드 상태
const RECORD_STATES: &[&str] = &["ACTIVE", "ARCHIVED"];

/// 출력 레코드 검증기
#[derive(Debug, Clone)]
pub struct Validator {
    /// Description 최대 길이 (문자)
    description_max_chars: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            description_max_chars: 1024,
        }
    }
}

impl Validator {
    /// 기본 제한값으로 검증기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// Description 최대 길이를 설정합니다.
    pub fn with_description_max_chars(mut self, max: usize) -> Self {
        self.description_max_chars = max;
        self
    }

    /// 렌더링된 후보 레코드를 검증하여 타입 레코드로 확정합니다.
    ///
    /// 길이 초과 필드는 잘라낸 후 검증합니다.
    pub fn validate(
        &self,
        format: OutputFormat,
        mut candidate: Value,
    ) -> Result<OutputRecord, TransformError> {
        match format {
            OutputFormat::AuditLog => {
                self.check_audit_log(&candidate)?;
                let record: AuditLogRecord = deserialize_record(candidate)?;
                Ok(OutputRecord::AuditLog(record))
            }
            OutputFormat::Schema => {
                self.check_schema(&candidate)?;
                let record: SchemaRecord = deserialize_record(candidate)?;
                Ok(OutputRecord::Schema(record))
            }
            OutputFormat::Findings => {
                self.truncate_description(&mut candidate);
                self.check_findings(&candidate)?;
                let record: FindingsRecord = deserialize_record(candidate)?;
                Ok(OutputRecord::Findings(record))
            }
        }
    }

    /// Description이 제한을 초과하면 잘라냅니다.
    fn truncate_description(&self, candidate: &mut Value) {
        if let Some(Value::String(description)) = candidate.get_mut("Description") {
            if description.chars().count() > self.description_max_chars {
                *description = description
                    .chars()
                    .take(self.description_max_chars)
                    .collect();
            }
        }
    }

    fn check_audit_log(&self, candidate: &Value) -> Result<(), TransformError> {
        require_string(candidate, "eventVersion")?;
        require_string(candidate, "eventTime")?;
        require_string(candidate, "eventSource")?;
        require_string(candidate, "eventName")?;
        require_string(candidate, "awsRegion")?;
        require_string(candidate, "sourceIPAddress")?;
        require_present(candidate, "additionalEventData")?;

        let identity = require_object(candidate, "userIdentity")?;
        require_string(identity, "userIdentity.type")?;
        require_string(identity, "userIdentity.principalId")?;
        require_string(identity, "userIdentity.accountId")?;

        let resources = require_array(candidate, "resources")?;
        for (index, resource) in resources.iter().enumerate() {
            require_string(resource, &format!("resources.{index}.accountId"))?;
            require_string(resource, &format!("resources.{index}.type"))?;
            require_string(resource, &format!("resources.{index}.ARN"))?;
        }

        Ok(())
    }

    fn check_schema(&self, candidate: &Value) -> Result<(), TransformError> {
        require_integer(candidate, "time")?;
        require_integer(candidate, "class_uid")?;
        require_string(candidate, "class_name")?;
        require_integer(candidate, "category_uid")?;
        require_string(candidate, "category_name")?;
        require_integer(candidate, "activity_id")?;
        require_string(candidate, "activity_name")?;
        require_string(candidate, "severity")?;

        let severity_id = require_integer(candidate, "severity_id")?;
        if !(1..=5).contains(&severity_id) {
            return Err(validation_error(
                "severity_id",
                "must be 1-5",
                &severity_id.to_string(),
            ));
        }

        let metadata = require_object(candidate, "metadata")?;
        require_string(metadata, "metadata.version")?;
        let product = require_object(metadata, "metadata.product")?;
        require_string(product, "metadata.product.name")?;
        require_string(product, "metadata.product.vendor_name")?;
        require_string(product, "metadata.product.version")?;

        Ok(())
    }

    fn check_findings(&self, candidate: &Value) -> Result<(), TransformError> {
        let schema_version = require_string(candidate, "SchemaVersion")?;
        if schema_version != FINDINGS_SCHEMA_VERSION {
            return Err(validation_error(
                "SchemaVersion",
                &format!("must be '{FINDINGS_SCHEMA_VERSION}'"),
                schema_version,
            ));
        }

        require_string(candidate, "Id")?;
        require_string(candidate, "ProductArn")?;
        require_string(candidate, "GeneratorId")?;
        require_string(candidate, "AwsAccountId")?;
        require_string(candidate, "CreatedAt")?;
        require_string(candidate, "UpdatedAt")?;
        require_string(candidate, "Title")?;
        require_string(candidate, "Description")?;
        require_array(candidate, "Types")?;

        let severity = require_object(candidate, "Severity")?;
        let label = require_string(severity, "Severity.Label")?;
        if !SEVERITY_LABELS.contains(&label) {
            return Err(validation_error(
                "Severity.Label",
                "must be one of INFORMATIONAL, LOW, MEDIUM, HIGH, CRITICAL",
                label,
            ));
        }
        let normalized = require_integer(severity, "Severity.Normalized")?;
        if !(0..=100).contains(&normalized) {
            return Err(validation_error(
                "Severity.Normalized",
                "must be 0-100",
                &normalized.to_string(),
            ));
        }

        let workflow_state = require_string(candidate, "WorkflowState")?;
        if workflow_state != "NEW" {
            return Err(validation_error(
                "WorkflowState",
                "must be 'NEW'",
                workflow_state,
            ));
        }

        let record_state = require_string(candidate, "RecordState")?;
        if !RECORD_STATES.contains(&record_state) {
            return Err(validation_error(
                "RecordState",
                "must be ACTIVE or ARCHIVED",
                record_state,
            ));
        }

        let resources = require_array(candidate, "Resources")?;
        for (index, resource) in resources.iter().enumerate() {
            require_string(resource, &format!("Resources.{index}.Type"))?;
            require_string(resource, &format!("Resources.{index}.Id"))?;
            require_string(resource, &format!("Resources.{index}.Partition"))?;
            require_string(resource, &format!("Resources.{index}.Region"))?;
        }

        Ok(())
    }
}

fn deserialize_record<T: serde::de::DeserializeOwned>(
    candidate: Value,
) -> Result<T, TransformError> {
    serde_json::from_value(candidate).map_err(|e| TransformError::Validation {
        field: "(record)".to_owned(),
        constraint: "must conform to record shape".to_owned(),
        actual: e.to_string(),
    })
}

fn validation_error(field: &str, constraint: &str, actual: &str) -> TransformError {
    TransformError::Validation {
        field: field.to_owned(),
        constraint: constraint.to_owned(),
        actual: actual.to_owned(),
    }
}

fn field_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "(missing)".to_owned(),
        Some(Value::Null) => "null".to_owned(),
        Some(Value::String(s)) => {
            let mut summary: String = s.chars().take(64).collect();
            if s.chars().count() > 64 {
                summary.push_str("...");
            }
            summary
        }
        Some(other) => {
            let serialized = other.to_string();
            serialized.chars().take(64).collect()
        }
    }
}

fn require_present<'a>(parent: &'a Value, path: &str) -> Result<&'a Value, TransformError> {
    parent
        .get(field_name(path))
        .ok_or_else(|| validation_error(path, "required field", "(missing)"))
}

fn require_string<'a>(parent: &'a Value, path: &str) -> Result<&'a str, TransformError> {
    let value = parent.get(field_name(path));
    value
        .and_then(Value::as_str)
        .ok_or_else(|| validation_error(path, "must be a string", &describe(value)))
}

fn require_integer(parent: &Value, path: &str) -> Result<i64, TransformError> {
    let value = parent.get(field_name(path));
    value
        .and_then(Value::as_i64)
        .ok_or_else(|| validation_error(path, "must be an integer", &describe(value)))
}

fn require_object<'a>(parent: &'a Value, path: &str) -> Result<&'a Value, TransformError> {
    let value = parent.get(field_name(path));
    match value {
        Some(v) if v.is_object() => Ok(v),
        _ => Err(validation_error(path, "must be an object", &describe(value))),
    }
}

fn require_array<'a>(parent: &'a Value, path: &str) -> Result<&'a Vec<Value>, TransformError> {
    let value = parent.get(field_name(path));
    value
        .and_then(Value::as_array)
        .ok_or_else(|| validation_error(path, "must be an array", &describe(value)))
}
