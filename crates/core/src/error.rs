//! 에러 타입 — 도메인별 에러 정의

/// Relayforge 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RelayforgeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 전달(delivery) 에러
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 변환 단계 실패 (추출/렌더링/검증)
    #[error("transform failed: {0}")]
    Transform(String),
}

/// 전달 목적지 에러
///
/// 싱크 trait 구현체가 반환하는 에러입니다.
/// Transient/Timeout은 재시도 가능, Permanent는 재시도 불가로 분류됩니다.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// 일시적 실패 (스로틀링, 일시적 네트워크 장애 등)
    #[error("transient delivery failure at {destination}: {reason}")]
    Transient { destination: String, reason: String },

    /// 영구적 실패 (인증 거부, 스키마 거부 등)
    #[error("permanent delivery failure at {destination}: {reason}")]
    Permanent { destination: String, reason: String },

    /// 호출 타임아웃
    #[error("delivery to {destination} timed out after {timeout_secs}s")]
    Timeout {
        destination: String,
        timeout_secs: u64,
    },
}

impl DeliveryError {
    /// 재시도 가능한 실패인지 반환합니다.
    ///
    /// Timeout은 항상 일시적 실패로 취급합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }

    /// 실패한 목적지 이름을 반환합니다.
    pub fn destination(&self) -> &str {
        match self {
            Self::Transient { destination, .. }
            | Self::Permanent { destination, .. }
            | Self::Timeout { destination, .. } => destination,
        }
    }
}
