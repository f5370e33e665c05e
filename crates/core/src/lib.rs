#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod sink;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, DeliveryError, PipelineError, RelayforgeError};

// 설정
pub use config::RelayforgeConfig;

// 이벤트
pub use event::{EventMetadata, ProcessingMetadata, QueueMessage, RawEvent};

// 싱크 trait
pub use sink::{AuditSink, ColumnarStore, DeadLetterQueue, FindingsQueue, PartitionKey};

// 도메인 타입
pub use types::{DestinationKind, Severity};
