//! 설정 관리 — relayforge.toml 파싱 및 런타임 설정
//!
//! [`RelayforgeConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`RELAYFORGE_FORMATS_FINDINGS=false` 형식)
//! 3. 설정 파일 (`relayforge.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), relayforge_core::error::RelayforgeError> {
//! use relayforge_core::config::RelayforgeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RelayforgeConfig::load("relayforge.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RelayforgeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, RelayforgeError};

/// Relayforge 통합 설정
///
/// `relayforge.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayforgeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 출력 형식 활성화 플래그
    #[serde(default)]
    pub formats: FormatsConfig,
    /// 매핑 템플릿 설정
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// 입력 큐 설정
    #[serde(default)]
    pub queue: QueueConfig,
    /// 전달 목적지 설정
    #[serde(default)]
    pub destinations: DestinationsConfig,
    /// 전달 동작 설정
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl RelayforgeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RelayforgeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RelayforgeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelayforgeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RelayforgeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RelayforgeError> {
        toml::from_str(toml_str).map_err(|e| {
            RelayforgeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `RELAYFORGE_{SECTION}_{FIELD}`
    /// 예: `RELAYFORGE_FORMATS_FINDINGS=false`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "RELAYFORGE_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "RELAYFORGE_GENERAL_LOG_FORMAT",
        );

        // Formats
        override_bool(&mut self.formats.audit_log, "RELAYFORGE_FORMATS_AUDIT_LOG");
        override_bool(&mut self.formats.schema, "RELAYFORGE_FORMATS_SCHEMA");
        override_bool(&mut self.formats.findings, "RELAYFORGE_FORMATS_FINDINGS");

        // Templates
        override_string(&mut self.templates.dir, "RELAYFORGE_TEMPLATES_DIR");

        // Queue
        override_string(&mut self.queue.source_id, "RELAYFORGE_QUEUE_SOURCE_ID");
        override_usize(&mut self.queue.batch_size, "RELAYFORGE_QUEUE_BATCH_SIZE");

        // Destinations
        override_string(
            &mut self.destinations.audit_channel,
            "RELAYFORGE_DESTINATIONS_AUDIT_CHANNEL",
        );
        override_string(
            &mut self.destinations.columnar_bucket,
            "RELAYFORGE_DESTINATIONS_COLUMNAR_BUCKET",
        );
        override_string(
            &mut self.destinations.columnar_prefix,
            "RELAYFORGE_DESTINATIONS_COLUMNAR_PREFIX",
        );
        override_string(
            &mut self.destinations.findings_queue,
            "RELAYFORGE_DESTINATIONS_FINDINGS_QUEUE",
        );
        override_string(
            &mut self.destinations.dead_letter_queue,
            "RELAYFORGE_DESTINATIONS_DEAD_LETTER_QUEUE",
        );

        // Delivery
        override_u64(
            &mut self.delivery.timeout_secs,
            "RELAYFORGE_DELIVERY_TIMEOUT_SECS",
        );
        override_u32(
            &mut self.delivery.findings_max_attempts,
            "RELAYFORGE_DELIVERY_FINDINGS_MAX_ATTEMPTS",
        );
        override_usize(
            &mut self.delivery.audit_max_records,
            "RELAYFORGE_DELIVERY_AUDIT_MAX_RECORDS",
        );
        override_usize(
            &mut self.delivery.audit_max_bytes,
            "RELAYFORGE_DELIVERY_AUDIT_MAX_BYTES",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RelayforgeError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 최소 한 개의 출력 형식은 활성화되어야 함
        if !self.formats.audit_log && !self.formats.schema && !self.formats.findings {
            return Err(ConfigError::InvalidValue {
                field: "formats".to_owned(),
                reason: "at least one output format must be enabled".to_owned(),
            }
            .into());
        }

        // 활성화된 형식의 목적지 식별자 검증
        if self.formats.audit_log && self.destinations.audit_channel.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "destinations.audit_channel".to_owned(),
                reason: "must not be empty when formats.audit_log is enabled".to_owned(),
            }
            .into());
        }
        if self.formats.schema && self.destinations.columnar_bucket.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "destinations.columnar_bucket".to_owned(),
                reason: "must not be empty when formats.schema is enabled".to_owned(),
            }
            .into());
        }
        if self.formats.findings && self.destinations.findings_queue.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "destinations.findings_queue".to_owned(),
                reason: "must not be empty when formats.findings is enabled".to_owned(),
            }
            .into());
        }

        const MAX_BATCH_SIZE: usize = 10_000;
        if self.queue.batch_size == 0 || self.queue.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "queue.batch_size".to_owned(),
                reason: format!("must be 1-{MAX_BATCH_SIZE}"),
            }
            .into());
        }

        const MAX_TIMEOUT_SECS: u64 = 300;
        if self.delivery.timeout_secs == 0 || self.delivery.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "delivery.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.delivery.findings_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "delivery.findings_max_attempts".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.delivery.audit_max_records == 0 || self.delivery.audit_max_records > 100 {
            return Err(ConfigError::InvalidValue {
                field: "delivery.audit_max_records".to_owned(),
                reason: "must be 1-100 (destination hard cap)".to_owned(),
            }
            .into());
        }

        if self.delivery.audit_max_bytes == 0 || self.delivery.audit_max_bytes > 256 * 1024 {
            return Err(ConfigError::InvalidValue {
                field: "delivery.audit_max_bytes".to_owned(),
                reason: "must be 1-262144 (destination hard cap)".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 출력 형식 활성화 플래그
///
/// 비활성화된 형식은 렌더링도 전달도 수행하지 않습니다
/// (배치 결과에는 skipped-disabled로 기록).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    /// 감사 로그 형식
    pub audit_log: bool,
    /// OCSF 스키마 레코드 형식
    pub schema: bool,
    /// Findings 형식
    pub findings: bool,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            schema: true,
            findings: true,
        }
    }
}

/// 매핑 템플릿 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// 템플릿 YAML 디렉토리 경로
    pub dir: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "/etc/relayforge/templates".to_owned(),
        }
    }
}

/// 입력 큐 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 입력 큐 식별자
    pub source_id: String,
    /// 개발용 파일 큐 경로 (로컬 소스 사용 시)
    pub file_path: String,
    /// 1회 수신 배치 크기
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            source_id: "relayforge-ingest".to_owned(),
            file_path: "/var/lib/relayforge/queue.jsonl".to_owned(),
            batch_size: 100,
        }
    }
}

/// 전달 목적지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
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
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self {
            audit_channel: "relayforge-audit".to_owned(),
            columnar_bucket: "relayforge-lake".to_owned(),
            columnar_prefix: "events".to_owned(),
            findings_queue: "relayforge-findings".to_owned(),
            dead_letter_queue: "relayforge-dlq".to_owned(),
        }
    }
}

/// 전달 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 목적지 호출 타임아웃 (초)
    pub timeout_secs: u64,
    /// Findings 큐 전송 최대 시도 횟수
    pub findings_max_attempts: u32,
    /// 감사 배치 호출당 최대 레코드 수
    pub audit_max_records: usize,
    /// 감사 배치 호출당 최대 바이트
    pub audit_max_bytes: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            findings_max_attempts: 3,
            audit_max_records: 100,
            audit_max_bytes: 256 * 1024, // 256KB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
