//! 변환 파이프라인 에러 타입
//!
//! [`TransformError`]는 변환 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<TransformError> for RelayforgeError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use relayforge_core::error::{PipelineError, RelayforgeError};

/// 변환 파이프라인 도메인 에러
///
/// 이벤트 타입 결정, 템플릿 로딩, 렌더링, 검증 등 변환 단계의
/// 에러 상황을 포괄합니다. 전달 실패는 별도로
/// `relayforge_core::error::DeliveryError`가 표현합니다.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// 이벤트 타입을 결정할 수 없음
    #[error("unroutable message {message_id}: no event type resolved")]
    Unroutable {
        /// 메시지 ID
        message_id: String,
    },

    /// (이벤트 타입, 형식)에 해당하는 템플릿 없음
    #[error("no template for event type '{event_type}' format '{format}'")]
    TemplateMissing {
        /// 이벤트 타입
        event_type: String,
        /// 출력 형식
        format: String,
    },

    /// 템플릿 파일 로딩 실패
    #[error("template load error: {path}: {reason}")]
    TemplateLoad {
        /// 템플릿 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 템플릿 유효성 검증 실패
    #[error("template validation error: template '{template_id}': {reason}")]
    TemplateInvalid {
        /// 문제가 된 템플릿 ID
        template_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 플레이스홀더 렌더링 실패
    #[error("render error: placeholder '{placeholder}': {reason}")]
    Render {
        /// 문제가 된 플레이스홀더
        placeholder: String,
        /// 실패 사유
        reason: String,
    },

    /// 렌더링된 레코드 검증 실패
    #[error("validation error: field '{field}': {constraint} (actual: {actual})")]
    Validation {
        /// 검증에 실패한 필드명
        field: String,
        /// 위반된 제약
        constraint: String,
        /// 실제 값 요약
        actual: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// JSON 직렬화/역직렬화 에러
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<TransformError> for RelayforgeError {
    fn from(err: TransformError) -> Self {
        RelayforgeError::Pipeline(PipelineError::Transform(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unroutable_error_display() {
        let err = TransformError::Unroutable {
            message_id: "msg-42".to_owned(),
        };
        assert!(err.to_string().contains("msg-42"));
    }

    #[test]
    fn template_missing_display() {
        let err = TransformError::TemplateMissing {
            event_type: "security_alert".to_owned(),
            format: "findings".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("security_alert"));
        assert!(msg.contains("findings"));
    }

    #[test]
    fn validation_error_display() {
        let err = TransformError::Validation {
            field: "Severity.Normalized".to_owned(),
            constraint: "must be 0-100".to_owned(),
            actual: "250".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Severity.Normalized"));
        assert!(msg.contains("250"));
    }

    #[test]
    fn converts_to_relayforge_error() {
        let err = TransformError::Unroutable {
            message_id: "m-1".to_owned(),
        };
        let top: RelayforgeError = err.into();
        assert!(matches!(top, RelayforgeError::Pipeline(_)));
    }
}
