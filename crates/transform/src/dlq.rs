//! Dead-letter 분류기
//!
//! 배치 처리 결과를 메시지 단위 최종 상태로 분류합니다. 모든 형식이
//! 전달(또는 비활성화로 스킵)된 메시지는 완료, 일시적 실패가 하나라도
//! 있으면 재시도 대상, 영구 실패만 남은 메시지는 dead-letter 큐로
//! 발행됩니다.
//!
//! DLQ에서 재주입된 메시지는 다시 DLQ로 발행하지 않습니다(사이클 방지).

use std::collections::HashMap;

use metrics::counter;
use relayforge_core::event::QueueMessage;
use relayforge_core::metrics::{
    DLQ_CYCLES_PREVENTED_TOTAL, DLQ_MESSAGES_PUBLISHED_TOTAL, DLQ_RETRYABLE_TOTAL,
};
use relayforge_core::sink::DeadLetterQueue;
use tracing::{info, warn};

use crate::batch::{BatchResultEntry, BatchSummary, FormatOutcome};

/// 메시지 처리 상태
///
/// `Received` -> `Routing` -> {`Delivered` | `Retryable` | `Dead`}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// 큐에서 수신됨
    Received,
    /// 이벤트 타입 판별 및 변환 진행 중
    Routing,
    /// 활성화된 모든 형식이 전달 완료됨 (ack 대상)
    Delivered,
    /// 일시적 실패 포함 (ack하지 않음, 큐 재전달로 재시도)
    Retryable,
    /// 영구 실패만 남음 (DLQ 발행 후 ack)
    Dead,
}

impl MessageState {
    /// 원본 큐에서 ack해도 되는 상태인지 반환합니다.
    pub fn is_terminal_ack(&self) -> bool {
        matches!(self, Self::Delivered | Self::Dead)
    }
}

/// 배치 결과를 메시지 상태로 분류하고 dead-letter 발행을 수행합니다.
pub struct DlqController<D> {
    dead_letter: D,
    dead_letter_queue_id: String,
}

impl<D: DeadLetterQueue> DlqController<D> {
    /// 새 분류기를 생성합니다.
    ///
    /// `dead_letter_queue_id`는 사이클 방지에 사용됩니다. 메시지의
    /// 소스 큐가 이 값과 같으면 재발행을 거부합니다.
    pub fn new(dead_letter: D, dead_letter_queue_id: impl Into<String>) -> Self {
        Self {
            dead_letter,
            dead_letter_queue_id: dead_letter_queue_id.into(),
        }
    }

    /// 배치의 각 메시지를 최종 상태로 분류합니다.
    ///
    /// Dead로 분류된 메시지는 dead-letter 큐로 발행됩니다. 발행 자체가
    /// 실패하면 메시지 유실을 막기 위해 Retryable로 되돌립니다.
    pub async fn classify(
        &self,
        messages: &[QueueMessage],
        summary: &BatchSummary,
    ) -> HashMap<String, MessageState> {
        let mut states = HashMap::with_capacity(messages.len());

        for message in messages {
            let entries: Vec<&BatchResultEntry> =
                summary.entries_for(&message.id).collect();
            let state = match initial_state(&entries) {
                MessageState::Dead => self.handle_dead(message, &entries).await,
                MessageState::Retryable => {
                    counter!(DLQ_RETRYABLE_TOTAL).increment(1);
                    MessageState::Retryable
                }
                other => other,
            };
            states.insert(message.id.clone(), state);
        }

        states
    }

    async fn handle_dead(
        &self,
        message: &QueueMessage,
        entries: &[&BatchResultEntry],
    ) -> MessageState {
        // 사이클 방지: DLQ에서 온 메시지는 다시 발행하지 않음
        if message.source_queue == self.dead_letter_queue_id {
            counter!(DLQ_CYCLES_PREVENTED_TOTAL).increment(1);
            warn!(
                message_id = %message.id,
                source = %message.source_queue,
                "refusing to re-publish message that originated from the dead-letter queue"
            );
            return MessageState::Dead;
        }

        let reason = dead_reason(entries);
        match self.dead_letter.publish(message, &reason).await {
            Ok(()) => {
                counter!(DLQ_MESSAGES_PUBLISHED_TOTAL).increment(1);
                info!(message_id = %message.id, reason = %reason, "message dead-lettered");
                MessageState::Dead
            }
            Err(e) => {
                warn!(
                    message_id = %message.id,
                    error = %e,
                    "dead-letter publish failed, keeping message retryable"
                );
                MessageState::Retryable
            }
        }
    }
}

/// 전달 결과만으로 상태를 결정합니다 (사이클/발행 고려 이전).
fn initial_state(entries: &[&BatchResultEntry]) -> MessageState {
    if entries.is_empty() {
        // 엔트리가 없으면 처리할 형식이 없던 메시지
        return MessageState::Delivered;
    }

    let mut any_transient = false;
    let mut any_permanent = false;
    for entry in entries {
        match &entry.outcome {
            FormatOutcome::Delivered | FormatOutcome::SkippedDisabled => {}
            FormatOutcome::ValidationFailed { .. } => any_permanent = true,
            FormatOutcome::DeliveryFailed { transient, .. } => {
                if *transient {
                    any_transient = true;
                } else {
                    any_permanent = true;
                }
            }
        }
    }

    // 일시적 실패가 하나라도 있으면 메시지 전체를 재시도 대상으로 취급.
    // 변환과 전달이 결정적/멱등이므로 재처리가 안전함.
    if any_transient {
        MessageState::Retryable
    } else if any_permanent {
        MessageState::Dead
    } else {
        MessageState::Delivered
    }
}

/// 영구 실패 엔트리에서 dead-letter 사유 문자열을 만듭니다.
fn dead_reason(entries: &[&BatchResultEntry]) -> String {
    let mut parts = Vec::new();
    for entry in entries {
        match &entry.outcome {
            FormatOutcome::ValidationFailed { reason } => {
                parts.push(format!("{}: {reason}", entry.format));
            }
            FormatOutcome::DeliveryFailed {
                transient: false,
                reason,
            } => {
                parts.push(format!("{}: {reason}", entry.format));
            }
            _ => {}
        }
    }
    if parts.is_empty() {
        "permanent failure".to_owned()
    } else {
        parts.join("; ")
    }
}
