//! 템플릿 파일 로더 -- YAML 매핑 템플릿을 디스크에서 로드합니다.
//!
//! 템플릿 디렉토리 내의 `.yml`/`.yaml` 파일을 스캔하고 파싱합니다.
//! 개별 파일 파싱 실패는 경고 로그를 남기고 건너뜁니다.

use std::path::Path;

use crate::error::TransformError;

use super::types::MappingTemplate;

/// 템플릿 파일 1개 기본 최대 크기 (바이트)
pub const DEFAULT_MAX_TEMPLATE_FILE_BYTES: usize = 64 * 1024;
const MAX_TEMPLATES_COUNT: usize = 1_000;

/// 템플릿 파일 로더
///
/// 파일 크기 상한은 설정의 `template_max_file_bytes`에서 전달받습니다.
pub struct TemplateLoader {
    max_file_bytes: u64,
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEMPLATE_FILE_BYTES)
    }
}

impl TemplateLoader {
    /// 파일 크기 상한을 지정하여 로더를 생성합니다.
    pub fn new(max_file_bytes: usize) -> Self {
        Self {
            max_file_bytes: max_file_bytes as u64,
        }
    }

    /// 디렉토리에서 모든 YAML 템플릿 파일을 로드합니다.
    ///
    /// `.yml` 또는 `.yaml` 확장자를 가진 파일만 처리합니다.
    /// 개별 파일 로딩 실패는 경고 로그를 남기고 건너뜁니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 템플릿 수가 `MAX_TEMPLATES_COUNT`를 초과하는 경우
    pub async fn load_directory(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<Vec<MappingTemplate>, TransformError> {
        let dir = dir.as_ref();

        let mut entries =
            tokio::fs::read_dir(dir)
                .await
                .map_err(|e| TransformError::TemplateLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory: {e}"),
                })?;

        let mut templates = Vec::new();

        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|e| TransformError::TemplateLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory entry: {e}"),
                })?
        {
            let path = entry.path();

            // .yml / .yaml 확장자만 처리
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");

            if !is_yaml {
                continue;
            }

            match self.load_file(&path).await {
                Ok(template) => templates.push(template),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load template file, skipping"
                    );
                }
            }

            if templates.len() > MAX_TEMPLATES_COUNT {
                return Err(TransformError::TemplateLoad {
                    path: dir.display().to_string(),
                    reason: format!("too many templates: max {MAX_TEMPLATES_COUNT}"),
                });
            }
        }

        tracing::info!(
            dir = %dir.display(),
            count = templates.len(),
            "loaded mapping templates"
        );

        Ok(templates)
    }

    /// 단일 YAML 파일에서 템플릿을 로드합니다.
    pub async fn load_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<MappingTemplate, TransformError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| TransformError::TemplateLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file metadata: {e}"),
                })?;

        if metadata.len() > self.max_file_bytes {
            return Err(TransformError::TemplateLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {})",
                    metadata.len(),
                    self.max_file_bytes
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| TransformError::TemplateLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 템플릿을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<MappingTemplate, TransformError> {
        let template: MappingTemplate =
            serde_yaml::from_str(yaml_str).map_err(|e| TransformError::TemplateLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        // 유효성 검증
        template.validate()?;

        Ok(template)
    }
}
