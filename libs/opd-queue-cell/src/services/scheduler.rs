use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::OpdQueueError;
use crate::models::TokenUpdate;
use crate::services::estimator::estimate_queue;
use crate::services::store::{DoctorRegistry, TokenStore};

/// Periodic queue recompute. Every doctor's queue is re-derived from
/// scratch on a fixed interval and whenever a mutating handler signals a
/// change - a polling/re-derive model, not incremental. Both triggers run
/// the same idempotent pass, so their relative order does not matter.
pub struct QueueScheduler {
    tokens: Arc<dyn TokenStore>,
    doctors: Arc<dyn DoctorRegistry>,
    changes: Arc<Notify>,
    interval: Duration,
}

impl QueueScheduler {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        doctors: Arc<dyn DoctorRegistry>,
        changes: Arc<Notify>,
        interval: Duration,
    ) -> Self {
        Self {
            tokens,
            doctors,
            changes,
            interval,
        }
    }

    /// Runs until the task is dropped. A failed pass only logs; stale
    /// estimates are preferred over no estimates.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.changes.notified() => {}
            }

            match self.recompute_pass().await {
                Ok(updated) => {
                    if updated > 0 {
                        debug!("Recompute pass updated {} tokens", updated);
                    }
                }
                Err(e) => warn!("Recompute pass failed: {}", e),
            }
        }
    }

    /// One full re-derivation. Writes back only tokens whose derived
    /// numeric fields changed; returns the number written.
    pub async fn recompute_pass(&self) -> Result<usize, OpdQueueError> {
        let doctors = self.doctors.get_doctors().await?;
        let all_tokens = self.tokens.get_tokens().await?;
        let now = Utc::now();

        let mut updated = 0;

        for doctor in &doctors {
            let doctor_tokens: Vec<_> = all_tokens
                .iter()
                .filter(|t| t.doctor_id == doctor.id)
                .cloned()
                .collect();

            for estimate in estimate_queue(doctor, &doctor_tokens, now) {
                let Some(current) = doctor_tokens.iter().find(|t| t.id == estimate.token_id)
                else {
                    continue;
                };

                let unchanged = current.position_in_queue == estimate.position_in_queue
                    && current.patients_ahead == estimate.patients_ahead
                    && current.estimated_wait_minutes == estimate.estimated_wait_minutes;
                if unchanged {
                    continue;
                }

                self.tokens
                    .update_token(
                        estimate.token_id,
                        TokenUpdate {
                            position_in_queue: Some(estimate.position_in_queue),
                            patients_ahead: Some(estimate.patients_ahead),
                            estimated_wait_minutes: Some(estimate.estimated_wait_minutes),
                            estimated_consultation_time: Some(
                                estimate.estimated_consultation_time,
                            ),
                            ..Default::default()
                        },
                    )
                    .await?;
                updated += 1;
            }
        }

        Ok(updated)
    }
}
