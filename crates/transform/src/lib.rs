#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`template`]: YAML 매핑 템플릿 타입, 로더, 저장소
//! - [`extract`]: 점 표기 경로 기반 필드 추출
//! - [`render`]: `${name|filter}` 플레이스홀더 렌더링 및 필터 체인
//! - [`validate`]: 형식별 레코드 검증 및 타입 변환
//! - [`batch`]: 배치 변환 오케스트레이션 (메시지 x 형식 실패 격리)
//! - [`dispatch`]: 목적지별 배치 전달 (감사 채널, 컬럼 저장소, findings 큐)
//! - [`dlq`]: 실패 분류 및 dead-letter 상태 머신
//! - [`config`]: 변환 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! QueueMessages -> TemplateStore -> FieldExtractor -> Renderer -> Validator
//!                       |                                            |
//!                  YAML templates                             typed records
//!                                                                  |
//!                  DlqController <- DeliveryDispatcher <- BatchProcessor
//! ```

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod dlq;
pub mod error;
pub mod extract;
pub mod render;
pub mod template;
pub mod validate;

// --- 주요 타입 re-export ---

// 배치 오케스트레이션
pub use batch::{BatchProcessor, BatchResultEntry, BatchSummary, FormatOutcome};

// 설정
pub use config::{TransformConfig, TransformConfigBuilder};

// 에러
pub use error::TransformError;

// 템플릿
pub use template::{FieldExtractorSpec, MappingTemplate, OutputFormat, TemplateStore};

// 추출
pub use extract::FieldExtractor;

// 렌더링
pub use render::Renderer;

// 검증
pub use validate::{AuditLogRecord, FindingsRecord, OutputRecord, SchemaRecord, Validator};

// 전달
pub use dispatch::DeliveryDispatcher;

// DLQ
pub use dlq::{DlqController, MessageState};
