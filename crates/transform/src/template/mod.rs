//! 매핑 템플릿 -- YAML 기반 이벤트-레코드 변환 정의
//!
//! (이벤트 타입, 출력 형식) 쌍마다 하나의 매핑 템플릿을 로드하여
//! 원본 이벤트에서 출력 레코드를 생성하는 방법을 기술합니다.
//!
//! # 템플릿 형식
//! ```yaml
//! id: security_alert_findings
//! event_type: security_alert
//! format: findings
//! extractors:
//!   - name: alert_id
//!     path: alertId
//!   - name: severity
//!     path: severity
//!     default: "Informational"
//! body:
//!   Title: "${rule_name}"
//!   Severity:
//!     Label: "${severity|severity_label}"
//!     Normalized: "${severity|severity_score}"
//! ```
//!
//! # 아키텍처
//! - [`TemplateStore`]: (이벤트 타입, 형식) -> 템플릿 조회 저장소
//! - [`loader`]: YAML 파일 로딩 및 유효성 검증
//! - [`types`]: 템플릿 데이터 구조 정의

pub mod loader;
pub mod types;

pub use loader::TemplateLoader;
pub use types::{FieldExtractorSpec, MappingTemplate, OutputFormat};

use std::collections::HashMap;
use std::sync::Arc;

use metrics::gauge;
use relayforge_core::metrics::TRANSFORM_TEMPLATES_LOADED;

use crate::error::TransformError;

/// 템플릿 저장소 -- (이벤트 타입, 출력 형식)으로 템플릿을 조회합니다.
///
/// 동일 키의 중복 템플릿은 먼저 로드된 것이 유지되고
/// 나중 것은 경고 후 건너뜁니다.
///
/// # 사용 예시
/// ```ignore
/// let mut store = TemplateStore::new();
/// store
///     .load_from_dir("/etc/relayforge/templates", 64 * 1024)
///     .await?;
///
/// let template = store.get("security_alert", OutputFormat::Findings);
/// ```
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<(String, OutputFormat), Arc<MappingTemplate>>,
}

impl TemplateStore {
    /// 빈 템플릿 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 디렉토리에서 YAML 템플릿 파일을 로드합니다.
    ///
    /// `max_file_bytes`는 템플릿 파일 1개의 크기 상한입니다
    /// (설정의 `template_max_file_bytes`). 로드된 템플릿 수를
    /// 반환합니다.
    pub async fn load_from_dir(
        &mut self,
        dir: impl AsRef<std::path::Path>,
        max_file_bytes: usize,
    ) -> Result<usize, TransformError> {
        let templates = TemplateLoader::new(max_file_bytes).load_directory(dir).await?;
        let mut added = 0;
        for template in templates {
            if self.add_template(template)? {
                added += 1;
            }
        }
        gauge!(TRANSFORM_TEMPLATES_LOADED).set(self.templates.len() as f64);
        Ok(added)
    }

    /// 단일 템플릿을 추가합니다.
    ///
    /// 동일한 (이벤트 타입, 형식) 키가 이미 존재하면 경고를 남기고
    /// `false`를 반환합니다 (기존 템플릿 유지).
    pub fn add_template(&mut self, template: MappingTemplate) -> Result<bool, TransformError> {
        template.validate()?;
        let key = template.key();
        if self.templates.contains_key(&key) {
            tracing::warn!(
                template_id = %template.id,
                event_type = %key.0,
                format = %key.1,
                "duplicate template for (event_type, format), skipping"
            );
            return Ok(false);
        }
        self.templates.insert(key, Arc::new(template));
        Ok(true)
    }

    /// (이벤트 타입, 형식)에 해당하는 템플릿을 조회합니다.
    pub fn get(&self, event_type: &str, format: OutputFormat) -> Option<Arc<MappingTemplate>> {
        self.templates
            .get(&(event_type.to_owned(), format))
            .cloned()
    }

    /// 현재 로드된 템플릿 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// 저장소가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// 특정 이벤트 타입에 대해 템플릿이 존재하는 형식 목록을 반환합니다.
    pub fn formats_for(&self, event_type: &str) -> Vec<OutputFormat> {
        OutputFormat::all()
            .into_iter()
            .filter(|format| {
                self.templates
                    .contains_key(&(event_type.to_owned(), *format))
            })
            .collect()
    }
}
