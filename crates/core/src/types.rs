//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// 제공자별 이벤트의 심각도를 표준 5단계로 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다
/// (`Informational < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Informational,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Informational),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Findings 레코드용 대문자 레이블을 반환합니다.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Informational => "INFORMATIONAL",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// 0-100 정규화 점수를 반환합니다.
    ///
    /// Informational=0, Low=30, Medium=60, High=80, Critical=100.
    pub fn normalized(&self) -> u8 {
        match self {
            Self::Informational => 0,
            Self::Low => 30,
            Self::Medium => 60,
            Self::High => 80,
            Self::Critical => 100,
        }
    }

    /// OCSF severity_id를 반환합니다 (Informational=1 ... Critical=5).
    pub fn ocsf_id(&self) -> u8 {
        match self {
            Self::Informational => 1,
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
            Self::Critical => 5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informational => write!(f, "Informational"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 전달 목적지 종류
///
/// 출력 레코드가 전달되는 세 가지 싱크와 dead-letter 경로를 구분합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    /// 감사 로그 저장소 (통합 이벤트 스토어)
    Audit,
    /// 컬럼 저장소 (장기 분석용)
    Columnar,
    /// Findings 대시보드 큐
    Findings,
    /// Dead-letter 목적지
    DeadLetter,
}

impl DestinationKind {
    /// 메트릭 레이블로 사용되는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Columnar => "columnar",
            Self::Findings => "findings",
            Self::DeadLetter => "dead_letter",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
