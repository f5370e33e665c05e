//! 매핑 템플릿 데이터 타입
//!
//! YAML 템플릿 파일에서 역직렬화되는 구조체들을 정의합니다.

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// 출력 형식 -- 하나의 이벤트가 변환될 수 있는 세 가지 레코드 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// 감사 로그 레코드 (스트리밍 채널로 전달)
    AuditLog,
    /// OCSF 스타일 스키마 레코드 (컬럼 저장소로 전달)
    Schema,
    /// Findings 레코드 (findings 큐로 전달)
    Findings,
}

impl OutputFormat {
    /// 메트릭 레이블 및 로그용 소문자 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::AuditLog => "audit_log",
            OutputFormat::Schema => "schema",
            OutputFormat::Findings => "findings",
        }
    }

    /// 세 형식 전체를 순서대로 반환합니다.
    pub fn all() -> [OutputFormat; 3] {
        [
            OutputFormat::AuditLog,
            OutputFormat::Schema,
            OutputFormat::Findings,
        ]
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 매핑 템플릿 -- 하나의 YAML 템플릿 파일에 대응합니다.
///
/// (이벤트 타입, 출력 형식) 쌍마다 하나의 템플릿이 존재하며,
/// 필드 추출 사양과 플레이스홀더가 포함된 본문으로 구성됩니다.
///
/// # YAML 스키마
/// ```yaml
/// id: security_alert_findings
/// event_type: security_alert
/// format: findings
/// extractors:
///   - name: alert_id
///     path: alertId
///   - name: region
///     paths: [region, awsRegion]
///     default: "unknown"
/// body:
///   Title: "${rule_name}"
///   Severity:
///     Label: "${severity|severity_label}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingTemplate {
    /// 템플릿 고유 ID
    pub id: String,
    /// 대상 이벤트 타입 (security_alert, assessment 등)
    pub event_type: String,
    /// 출력 형식
    pub format: OutputFormat,
    /// 필드 추출 사양 목록
    #[serde(default)]
    pub extractors: Vec<FieldExtractorSpec>,
    /// 플레이스홀더가 포함된 출력 본문
    pub body: serde_json::Value,
}

impl MappingTemplate {
    /// 템플릿의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.id.is_empty() {
            return Err(TransformError::TemplateInvalid {
                template_id: "(empty)".to_owned(),
                reason: "template id must not be empty".to_owned(),
            });
        }

        if self.id.len() > 256 {
            return Err(TransformError::TemplateInvalid {
                template_id: self.id.clone(),
                reason: "template id must not exceed 256 characters".to_owned(),
            });
        }

        if self.event_type.is_empty() {
            return Err(TransformError::TemplateInvalid {
                template_id: self.id.clone(),
                reason: "event_type must not be empty".to_owned(),
            });
        }

        if !self.body.is_object() {
            return Err(TransformError::TemplateInvalid {
                template_id: self.id.clone(),
                reason: "body must be a mapping".to_owned(),
            });
        }

        let mut seen_names = std::collections::HashSet::new();
        for extractor in &self.extractors {
            extractor.validate(&self.id)?;
            if !seen_names.insert(extractor.name.as_str()) {
                return Err(TransformError::TemplateInvalid {
                    template_id: self.id.clone(),
                    reason: format!("duplicate extractor name '{}'", extractor.name),
                });
            }
        }

        Ok(())
    }

    /// 템플릿 저장소 키 (이벤트 타입, 형식) 쌍을 반환합니다.
    pub fn key(&self) -> (String, OutputFormat) {
        (self.event_type.clone(), self.format)
    }
}

/// 필드 추출 사양
///
/// 원본 이벤트에서 하나의 이름 있는 값을 추출하는 방법을 정의합니다.
/// `path` 단일 경로 또는 `paths` 후보 경로 목록(첫 번째 비어있지 않은
/// 값 채택) 중 정확히 하나를 지정해야 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldExtractorSpec {
    /// 추출된 값의 이름 (본문 플레이스홀더에서 참조)
    pub name: String,
    /// 단일 점 표기 경로
    #[serde(default)]
    pub path: Option<String>,
    /// 후보 경로 목록 (첫 번째 비어있지 않은 값 채택)
    #[serde(default)]
    pub paths: Vec<String>,
    /// 모든 경로가 실패했을 때 사용할 기본값
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl FieldExtractorSpec {
    /// 추출 사양의 유효성을 검증합니다.
    pub fn validate(&self, template_id: &str) -> Result<(), TransformError> {
        if self.name.is_empty() {
            return Err(TransformError::TemplateInvalid {
                template_id: template_id.to_owned(),
                reason: "extractor name must not be empty".to_owned(),
            });
        }

        match (&self.path, self.paths.is_empty()) {
            (Some(_), false) => Err(TransformError::TemplateInvalid {
                template_id: template_id.to_owned(),
                reason: format!(
                    "extractor '{}' must specify either path or paths, not both",
                    self.name
                ),
            }),
            (None, true) => Err(TransformError::TemplateInvalid {
                template_id: template_id.to_owned(),
                reason: format!("extractor '{}' must specify path or paths", self.name),
            }),
            _ => Ok(()),
        }
    }

    /// 시도할 경로를 순서대로 반환합니다.
    pub fn candidate_paths(&self) -> impl Iterator<Item = &str> {
        self.path
            .as_deref()
            .into_iter()
            .chain(self.paths.iter().map(String::as_str))
    }
}
