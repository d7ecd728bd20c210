use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::OpdQueueError;
use crate::models::{
    ConsultationDecision, Doctor, DoctorUpdate, NotificationKind, Token, TokenNotification,
    TokenStatus, TokenUpdate,
};
use crate::services::ranker::rank_queue;
use crate::services::store::{DoctorRegistry, TokenStore};

/// Consultation lifecycle: waiting/checked-in -> in-consultation ->
/// completed, with `delayed` as a re-entrant side branch.
///
/// The backing store offers no conditional writes, so the at-most-one
/// in-consultation invariant is enforced by serializing each doctor's
/// start transitions through a per-doctor async mutex.
pub struct ConsultationService {
    tokens: Arc<dyn TokenStore>,
    doctors: Arc<dyn DoctorRegistry>,
    doctor_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ConsultationService {
    pub fn new(tokens: Arc<dyn TokenStore>, doctors: Arc<dyn DoctorRegistry>) -> Self {
        Self {
            tokens,
            doctors,
            doctor_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the doctor for exclusive consultation of this token.
    pub async fn start_consultation(&self, token_id: Uuid) -> Result<Token, OpdQueueError> {
        let token = self.require_token(token_id).await?;

        let lock = self.doctor_lock(token.doctor_id).await;
        let _guard = lock.lock().await;

        // Re-read under the lock; another session may have started a
        // consultation for this doctor in the meantime.
        let token = self.require_token(token_id).await?;

        if !token.status.can_transition_to(&TokenStatus::InConsultation) {
            return Err(OpdQueueError::InvalidStateTransition {
                from: token.status,
                to: TokenStatus::InConsultation,
            });
        }

        let all_tokens = self.tokens.get_tokens().await?;
        let busy = all_tokens.iter().any(|t| {
            t.doctor_id == token.doctor_id && t.status == TokenStatus::InConsultation
        });
        if busy {
            return Err(OpdQueueError::DoctorBusy {
                doctor_id: token.doctor_id,
            });
        }

        let now = Utc::now();
        let updated = self
            .tokens
            .update_token(
                token_id,
                TokenUpdate {
                    status: Some(TokenStatus::InConsultation),
                    actual_consultation_time: Some(now),
                    ..Default::default()
                },
            )
            .await?;

        self.doctors
            .update_doctor(
                token.doctor_id,
                DoctorUpdate {
                    is_available: Some(false),
                    current_patient: Some(Some(token.patient_name.clone())),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "Consultation started for token {} (doctor {})",
            updated.token_number, updated.doctor_id
        );
        Ok(updated)
    }

    /// Record the doctor's decision and release the doctor. Requires the
    /// token to actually be in consultation.
    pub async fn complete_consultation(
        &self,
        token_id: Uuid,
        decision: ConsultationDecision,
    ) -> Result<Token, OpdQueueError> {
        let token = self.require_token(token_id).await?;

        if token.status != TokenStatus::InConsultation {
            return Err(OpdQueueError::InvalidStateTransition {
                from: token.status,
                to: TokenStatus::Completed,
            });
        }

        let doctor = self
            .doctors
            .get_doctor(token.doctor_id)
            .await?
            .ok_or(OpdQueueError::DoctorNotFound(token.doctor_id))?;

        let mut notifications = token.notifications.clone();
        notifications.push(decision_notification(decision, &doctor));

        let now = Utc::now();
        let updated = self
            .tokens
            .update_token(
                token_id,
                TokenUpdate {
                    status: Some(TokenStatus::Completed),
                    doctor_decision: Some(decision),
                    decision_time: Some(now),
                    notifications: Some(notifications),
                    ..Default::default()
                },
            )
            .await?;

        self.doctors
            .update_doctor(
                doctor.id,
                DoctorUpdate {
                    is_available: Some(true),
                    current_patient: Some(None),
                    total_patients_seen: Some(doctor.total_patients_seen + 1),
                },
            )
            .await?;

        info!(
            "Consultation completed for token {} with decision {}",
            updated.token_number, decision
        );
        Ok(updated)
    }

    /// Push a waiting patient back: the displayed estimate inflates, but
    /// priority and rank stay as they were.
    pub async fn delay_patient(
        &self,
        token_id: Uuid,
        delay_minutes: i32,
    ) -> Result<Token, OpdQueueError> {
        if delay_minutes <= 0 {
            return Err(OpdQueueError::ValidationError(format!(
                "Delay must be positive, got {}",
                delay_minutes
            )));
        }

        let token = self.require_token(token_id).await?;

        if token.status != TokenStatus::Waiting {
            return Err(OpdQueueError::InvalidStateTransition {
                from: token.status,
                to: TokenStatus::Delayed,
            });
        }

        let updated = self
            .tokens
            .update_token(
                token_id,
                TokenUpdate {
                    status: Some(TokenStatus::Delayed),
                    estimated_wait_minutes: Some(token.estimated_wait_minutes + delay_minutes),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "Token {} delayed by {} minutes",
            updated.token_number, delay_minutes
        );
        Ok(updated)
    }

    /// Start a consultation for the doctor's highest-ranked waiting token.
    /// Returns `Ok(None)` when nobody is waiting.
    pub async fn call_next(&self, doctor_id: Uuid) -> Result<Option<Token>, OpdQueueError> {
        let all_tokens = self.tokens.get_tokens().await?;
        let waiting: Vec<Token> = all_tokens
            .into_iter()
            .filter(|t| t.doctor_id == doctor_id && t.status == TokenStatus::Waiting)
            .collect();

        let ranked = rank_queue(waiting);
        match ranked.first() {
            Some(next) => {
                debug!(
                    "Calling next patient {} for doctor {}",
                    next.token_number, doctor_id
                );
                self.start_consultation(next.id).await.map(Some)
            }
            None => {
                info!("No patients waiting for doctor {}", doctor_id);
                Ok(None)
            }
        }
    }

    async fn require_token(&self, token_id: Uuid) -> Result<Token, OpdQueueError> {
        self.tokens
            .get_token(token_id)
            .await?
            .ok_or(OpdQueueError::TokenNotFound(token_id))
    }

    async fn doctor_lock(&self, doctor_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.doctor_locks.lock().await;
        locks
            .entry(doctor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn decision_notification(decision: ConsultationDecision, doctor: &Doctor) -> TokenNotification {
    let (message, kind) = match decision {
        ConsultationDecision::Discharge => (
            format!(
                "Your consultation with Dr. {} is complete. You have been discharged. \
                 Take your prescribed medicines and rest well.",
                doctor.name
            ),
            NotificationKind::Success,
        ),
        ConsultationDecision::AdmissionRequired => (
            "Your consultation is complete. Admission is required. \
             Our staff will assist you with the admission process."
                .to_string(),
            NotificationKind::Warning,
        ),
        ConsultationDecision::FollowUp => (
            "Your consultation is complete. Please schedule a follow-up \
             appointment within 7 days."
                .to_string(),
            NotificationKind::Success,
        ),
        ConsultationDecision::Referral => (
            "Your consultation is complete. You have been referred to a \
             specialist for further evaluation."
                .to_string(),
            NotificationKind::Success,
        ),
    };

    TokenNotification::new(message, kind)
}
