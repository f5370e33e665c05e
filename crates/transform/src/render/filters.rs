//! 값 변환 필터 -- 플레이스홀더에 적용되는 닫힌 필터 집합
//!
//! 필터는 고정된 레지스트리에서 이름으로 파싱됩니다. 임의 스크립트
//! 실행은 없습니다. 모든 필터는 전체 함수(total)이며 멱등입니다:
//! 어떤 입력 타입(null 포함)에도 정의되고, 두 번 적용해도 한 번
//! 적용한 것과 같은 결과를 냅니다.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use relayforge_core::types::Severity;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::TransformError;

/// 값 변환 필터
///
/// # 필터 문법
/// - `lowercase` / `uppercase` -- 문자열 대소문자 변환
/// - `replace:<pattern>:<with>` -- 정규식 치환 (치환 결과가 패턴과
///   다시 매칭되지 않아야 멱등이 유지됩니다)
/// - `iso8601` -- epoch 밀리초 숫자를 ISO-8601 문자열로 변환
/// - `severity_label` -- 공급자 심각도를 5단계 대문자 레이블로 정규화
/// - `severity_score` -- 공급자 심각도를 0-100 정규화 점수로 변환
/// - `to_json` -- 구조화된 값을 JSON 문자열로 직렬화 (한 번만)
/// - `stable_id` -- 값에서 결정적 식별자를 파생 (SHA-256)
#[derive(Debug, Clone)]
pub enum Filter {
    /// 문자열 소문자 변환
    Lowercase,
    /// 문자열 대문자 변환
    Uppercase,
    /// 정규식 치환
    Replace {
        /// 컴파일된 패턴
        pattern: Regex,
        /// 치환 문자열
        with: String,
    },
    /// epoch 밀리초 -> ISO-8601
    Iso8601,
    /// 심각도 레이블 정규화
    SeverityLabel,
    /// 심각도 점수 정규화
    SeverityScore,
    /// JSON 문자열 직렬화
    ToJson,
    /// 결정적 식별자 파생
    StableId,
}

impl Filter {
    /// 필터 이름을 파싱합니다.
    ///
    /// 레지스트리에 없는 이름은 렌더링 에러입니다.
    pub fn parse(name: &str) -> Result<Self, TransformError> {
        match name {
            "lowercase" => Ok(Filter::Lowercase),
            "uppercase" => Ok(Filter::Uppercase),
            "iso8601" => Ok(Filter::Iso8601),
            "severity_label" => Ok(Filter::SeverityLabel),
            "severity_score" => Ok(Filter::SeverityScore),
            "to_json" => Ok(Filter::ToJson),
            "stable_id" => Ok(Filter::StableId),
            other => {
                if let Some(spec) = other.strip_prefix("replace:") {
                    return Self::parse_replace(spec);
                }
                Err(TransformError::Render {
                    placeholder: other.to_owned(),
                    reason: "unknown filter".to_owned(),
                })
            }
        }
    }

    fn parse_replace(spec: &str) -> Result<Self, TransformError> {
        let Some((pattern_str, with)) = spec.split_once(':') else {
            return Err(TransformError::Render {
                placeholder: format!("replace:{spec}"),
                reason: "replace filter requires replace:<pattern>:<with>".to_owned(),
            });
        };
        let pattern = Regex::new(pattern_str).map_err(|e| TransformError::Render {
            placeholder: format!("replace:{spec}"),
            reason: format!("invalid pattern: {e}"),
        })?;
        Ok(Filter::Replace {
            pattern,
            with: with.to_owned(),
        })
    }

    /// 필터를 값에 적용합니다.
    ///
    /// 필터가 의미를 갖지 않는 입력 타입은 값을 그대로 돌려줍니다.
    pub fn apply(&self, value: Value) -> Value {
        match self {
            Filter::Lowercase => map_string(value, |s| s.to_lowercase()),
            Filter::Uppercase => map_string(value, |s| s.to_uppercase()),
            Filter::Replace { pattern, with } => {
                map_string(value, |s| pattern.replace_all(&s, with.as_str()).into_owned())
            }
            Filter::Iso8601 => to_iso8601(value),
            Filter::SeverityLabel => severity_label(value),
            Filter::SeverityScore => severity_score(value),
            Filter::ToJson => to_json_string(value),
            Filter::StableId => stable_id(value),
        }
    }
}

fn map_string(value: Value, f: impl FnOnce(String) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other,
    }
}

/// epoch 밀리초를 ISO-8601 (RFC 3339, UTC, 밀리초 정밀도)로 변환합니다.
///
/// 이미 ISO-8601 문자열인 입력은 그대로 유지합니다 (멱등).
fn to_iso8601(value: Value) -> Value {
    let epoch_ms = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            if DateTime::parse_from_rfc3339(s).is_ok() {
                return value;
            }
            s.parse::<i64>().ok()
        }
        _ => None,
    };

    match epoch_ms.and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => value,
    }
}

/// 공급자 심각도를 파싱합니다.
///
/// 문자열 레이블 또는 GuardDuty 스타일 0-8.9 숫자 스케일을 지원합니다.
fn parse_severity(value: &Value) -> Option<Severity> {
    match value {
        Value::String(s) => Severity::from_str_loose(s),
        Value::Number(n) => {
            let score = n.as_f64()?;
            Some(if score < 1.0 {
                Severity::Informational
            } else if score < 4.0 {
                Severity::Low
            } else if score < 7.0 {
                Severity::Medium
            } else if score < 9.0 {
                Severity::High
            } else {
                Severity::Critical
            })
        }
        _ => None,
    }
}

fn severity_label(value: Value) -> Value {
    match parse_severity(&value) {
        Some(severity) => Value::String(severity.label().to_owned()),
        // 파싱 불가 값은 Informational로 수렴 (null 포함)
        None => Value::String(Severity::Informational.label().to_owned()),
    }
}

fn severity_score(value: Value) -> Value {
    // 이미 정규화된 점수는 그대로 유지 (멱등)
    if let Value::Number(n) = &value {
        if let Some(score) = n.as_u64() {
            if matches!(score, 0 | 30 | 60 | 80 | 100) {
                return value;
            }
        }
    }
    let severity = parse_severity(&value).unwrap_or_default();
    Value::Number(severity.normalized().into())
}

/// 구조화된 값을 JSON 문자열로 직렬화합니다.
///
/// 이미 문자열인 값은 그대로 유지합니다. 문자열을 다시 직렬화하면
/// 이중 이스케이프가 발생하므로 멱등 보장의 핵심입니다.
fn to_json_string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

/// 값에서 결정적 식별자를 파생합니다.
///
/// 같은 입력은 항상 같은 식별자를 냅니다. 이미 파생된 식별자
/// (64자 소문자 16진수)는 그대로 유지합니다 (멱등).
fn stable_id(value: Value) -> Value {
    if let Value::String(s) = &value {
        if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return value;
        }
    }
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    Value::String(hex::encode(hasher.finalize()))
}
