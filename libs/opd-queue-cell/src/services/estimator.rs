use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{Doctor, Priority, QueueMetrics, Token, TokenStatus};
use crate::services::ranker::rank_queue;

/// Displayed until the first recompute pass reaches an emergency token.
pub const IMMEDIATE: &str = "IMMEDIATE";

/// Derived queue fields for one token, recomputed on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEstimate {
    pub token_id: Uuid,
    pub position_in_queue: i32,
    pub patients_ahead: i32,
    pub estimated_wait_minutes: i32,
    pub estimated_consultation_time: String,
}

/// Linear model: no variance, no learning from actual consultation
/// durations. Whole minutes; negative estimates clamp to zero.
pub fn linear_wait(patients_ahead: i32, average_minutes: i32, delay_buffer: i32) -> i32 {
    (patients_ahead * average_minutes + delay_buffer).max(0)
}

pub fn format_consultation_time(now: DateTime<Utc>, wait_minutes: i32) -> String {
    (now + Duration::minutes(wait_minutes as i64))
        .format("%I:%M %p")
        .to_string()
}

/// Recompute queue positions and time estimates for one doctor's tokens.
///
/// Only `waiting` tokens take part in the batch: the ranker places any
/// emergency token at position 1, where the linear model reduces its wait
/// to the bare delay buffer. Completed, in-consultation, checked-in and
/// delayed tokens are passed through unchanged - their displayed values
/// freeze at the last computed estimate (a delayed token keeps its
/// inflated one until it re-enters `waiting`).
pub fn estimate_queue(doctor: &Doctor, tokens: &[Token], now: DateTime<Utc>) -> Vec<QueueEstimate> {
    let waiting: Vec<Token> = tokens
        .iter()
        .filter(|t| t.status == TokenStatus::Waiting)
        .cloned()
        .collect();

    rank_queue(waiting)
        .iter()
        .enumerate()
        .map(|(index, token)| {
            let position = index as i32 + 1;
            let patients_ahead = position - 1;
            let wait = linear_wait(
                patients_ahead,
                doctor.average_consultation_minutes,
                doctor.delay_buffer_minutes,
            );

            QueueEstimate {
                token_id: token.id,
                position_in_queue: position,
                patients_ahead,
                estimated_wait_minutes: wait,
                estimated_consultation_time: format_consultation_time(now, wait),
            }
        })
        .collect()
}

/// Overlay freshly computed estimates onto a token list for display.
pub fn apply_estimates(tokens: &mut [Token], estimates: &[QueueEstimate]) {
    for token in tokens.iter_mut() {
        if let Some(estimate) = estimates.iter().find(|e| e.token_id == token.id) {
            token.position_in_queue = estimate.position_in_queue;
            token.patients_ahead = estimate.patients_ahead;
            token.estimated_wait_minutes = estimate.estimated_wait_minutes;
            token.estimated_consultation_time =
                Some(estimate.estimated_consultation_time.clone());
        }
    }
}

pub fn queue_metrics(tokens: &[Token]) -> QueueMetrics {
    let total_patients = tokens.len();
    let patients_completed = tokens
        .iter()
        .filter(|t| t.status == TokenStatus::Completed)
        .count();
    let patients_in_consultation = tokens
        .iter()
        .filter(|t| t.status == TokenStatus::InConsultation)
        .count();
    let average_wait_minutes = if tokens.is_empty() {
        0
    } else {
        tokens.iter().map(|t| t.estimated_wait_minutes).sum::<i32>() / tokens.len() as i32
    };
    let emergency_count = tokens
        .iter()
        .filter(|t| t.priority.is_emergency())
        .count();
    let high_priority_count = tokens
        .iter()
        .filter(|t| matches!(t.priority, Priority::Urgent | Priority::High))
        .count();

    QueueMetrics {
        total_patients,
        patients_in_consultation,
        patients_completed,
        average_wait_minutes,
        emergency_count,
        high_priority_count,
    }
}
