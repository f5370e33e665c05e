//! 변환 파이프라인 설정
//!
//! [`TransformConfig`]는 core의 [`RelayforgeConfig`](relayforge_core::config::RelayforgeConfig)의
//! 여러 섹션을 합쳐 변환 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use relayforge_core::config::RelayforgeConfig;
//! use relayforge_transform::config::TransformConfig;
//!
//! let core_config = RelayforgeConfig::default();
//! let config = TransformConfig::from_core(&core_config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// 변환 파이프라인 설정
///
/// core 설정의 formats / templates / destinations / delivery 섹션에서
/// 파생되며, 파이프라인 내부에서 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// 감사 로그 형식 활성화
    pub audit_log_enabled: bool,
    /// 스키마 레코드 형식 활성화
    pub schema_enabled: bool,
    /// Findings 형식 활성화
    pub findings_enabled: bool,
    /// 매핑 템플릿 디렉토리 경로
    pub template_dir: String,
    /// 감사 로그 채널 식별자
    pub audit_channel: String,
    /// 컬럼 저장소 버킷
    pub columnar_bucket: String,
    /// 컬럼 저장소 키 접두어
    pub columnar_prefix: String,
    /// Findings 큐 식별자
    pub findings_queue: String,
    /// Dead-letter 큐 식별자
    pub dead_letter_queue: String,
    /// 목적지 호출 타임아웃 (초)
    pub delivery_timeout_secs: u64,
    /// Findings 큐 전송 최대 시도 횟수
    pub findings_max_attempts: u32,
    /// 감사 배치 호출당 최대 레코드 수
    pub audit_max_records: usize,
    /// 감사 배치 호출당 최대 바이트
    pub audit_max_bytes: usize,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 템플릿 파일 1개 최대 크기 (바이트)
    pub template_max_file_bytes: usize,
    /// Description 필드 최대 길이 (문자)
    pub description_max_chars: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            audit_log_enabled: true,
            schema_enabled: true,
            findings_enabled: true,
            template_dir: "/etc/relayforge/templates".to_owned(),
            audit_channel: "relayforge-audit".to_owned(),
            columnar_bucket: "relayforge-lake".to_owned(),
            columnar_prefix: "events".to_owned(),
            findings_queue: "relayforge-findings".to_owned(),
            dead_letter_queue: "relayforge-dlq".to_owned(),
            delivery_timeout_secs: 30,
            findings_max_attempts: 3,
            audit_max_records: 100,
            audit_max_bytes: 256 * 1024,
            template_max_file_bytes: 64 * 1024,
            description_max_chars: 1024,
        }
    }
}

impl TransformConfig {
    /// core의 `RelayforgeConfig`에서 변환 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &relayforge_core::config::RelayforgeConfig) -> Self {
        Self {
            audit_log_enabled: core.formats.audit_log,
            schema_enabled: core.formats.schema,
            findings_enabled: core.formats.findings,
            template_dir: core.templates.dir.clone(),
            audit_channel: core.destinations.audit_channel.clone(),
            columnar_bucket: core.destinations.columnar_bucket.clone(),
            columnar_prefix: core.destinations.columnar_prefix.clone(),
            findings_queue: core.destinations.findings_queue.clone(),
            dead_letter_queue: core.destinations.dead_letter_queue.clone(),
            delivery_timeout_secs: core.delivery.timeout_secs,
            findings_max_attempts: core.delivery.findings_max_attempts,
            audit_max_records: core.delivery.audit_max_records,
            audit_max_bytes: core.delivery.audit_max_bytes,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TransformError> {
        if !self.audit_log_enabled && !self.schema_enabled && !self.findings_enabled {
            return Err(TransformError::Config {
                field: "formats".to_owned(),
                reason: "at least one output format must be enabled".to_owned(),
            });
        }

        if self.template_dir.is_empty() {
            return Err(TransformError::Config {
                field: "template_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.dead_letter_queue.is_empty() {
            return Err(TransformError::Config {
                field: "dead_letter_queue".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.audit_max_records == 0 || self.audit_max_records > 100 {
            return Err(TransformError::Config {
                field: "audit_max_records".to_owned(),
                reason: "must be 1-100 (destination hard cap)".to_owned(),
            });
        }

        if self.audit_max_bytes == 0 || self.audit_max_bytes > 256 * 1024 {
            return Err(TransformError::Config {
                field: "audit_max_bytes".to_owned(),
                reason: "must be 1-262144 (destination hard cap)".to_owned(),
            });
        }

        if self.findings_max_attempts == 0 {
            return Err(TransformError::Config {
                field: "findings_max_attempts".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.delivery_timeout_secs == 0 {
            return Err(TransformError::Config {
                field: "delivery_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.template_max_file_bytes == 0 {
            return Err(TransformError::Config {
                field: "template_max_file_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.description_max_chars == 0 {
            return Err(TransformError::Config {
                field: "description_max_chars".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 변환 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct TransformConfigBuilder {
    config: TransformConfig,
}

impl TransformConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감사 로그 형식 활성화 여부를 설정합니다.
    pub fn audit_log_enabled(mut self, enabled: bool) -> Self {
        self.config.audit_log_enabled = enabled;
        self
    }

    /// 스키마 레코드 형식 활성화 여부를 설정합니다.
    pub fn schema_enabled(mut self, enabled: bool) -> Self {
        self.config.schema_enabled = enabled;
        self
    }

    /// Findings 형식 활성화 여부를 설정합니다.
    pub fn findings_enabled(mut self, enabled: bool) -> Self {
        self.config.findings_enabled = enabled;
        self
    }

    /// 템플릿 디렉토리를 설정합니다.
    pub fn template_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.template_dir = dir.into();
        self
    }

    /// 감사 로그 채널을 설정합니다.
    pub fn audit_channel(mut self, channel: impl Into<String>) -> Self {
        self.config.audit_channel = channel.into();
        self
    }

    /// 컬럼 저장소 버킷을 설정합니다.
    pub fn columnar_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.columnar_bucket = bucket.into();
        self
    }

    /// Findings 큐를 설정합니다.
    pub fn findings_queue(mut self, queue: impl Into<String>) -> Self {
        self.config.findings_queue = queue.into();
        self
    }

    /// Dead-letter 큐를 설정합니다.
    pub fn dead_letter_queue(mut self, queue: impl Into<String>) -> Self {
        self.config.dead_letter_queue = queue.into();
        self
    }

    /// 전달 타임아웃(초)을 설정합니다.
    pub fn delivery_timeout_secs(mut self, secs: u64) -> Self {
        self.config.delivery_timeout_secs = secs;
        self
    }

    /// Findings 최대 시도 횟수를 설정합니다.
    pub fn findings_max_attempts(mut self, attempts: u32) -> Self {
        self.config.findings_max_attempts = attempts;
        self
    }

    /// 감사 배치 최대 레코드 수를 설정합니다.
    pub fn audit_max_records(mut self, records: usize) -> Self {
        self.config.audit_max_records = records;
        self
    }

    /// 감사 배치 최대 바이트를 설정합니다.
    pub fn audit_max_bytes(mut self, bytes: usize) -> Self {
        self.config.audit_max_bytes = bytes;
        self
    }

    /// 설정을 검증하고 `TransformConfig`를 생성합니다.
    pub fn build(self) -> Result<TransformConfig, TransformError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
