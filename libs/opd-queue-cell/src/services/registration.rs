use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::OpdQueueError;
use crate::models::{
    CreateTokenRequest, EmergencyTokenRequest, NotificationKind, Priority, Token,
    TokenNotification, TokenStatus,
};
use crate::services::estimator::{format_consultation_time, linear_wait, IMMEDIATE};
use crate::services::store::{DoctorRegistry, TokenStore};

/// Fixed initial estimate for an emergency token; it skips the queue.
const EMERGENCY_WAIT_MINUTES: i32 = 5;

/// Issues tokens: human-readable number, denormalized department and an
/// initial linear estimate. The recompute pass takes over the derived
/// fields from there.
pub struct RegistrationService {
    tokens: Arc<dyn TokenStore>,
    doctors: Arc<dyn DoctorRegistry>,
}

impl RegistrationService {
    pub fn new(tokens: Arc<dyn TokenStore>, doctors: Arc<dyn DoctorRegistry>) -> Self {
        Self { tokens, doctors }
    }

    pub async fn register(&self, request: CreateTokenRequest) -> Result<Token, OpdQueueError> {
        validate_patient(&request.patient_name, request.age, &request.phone)?;

        let doctor = self
            .doctors
            .get_doctor(request.doctor_id)
            .await?
            .ok_or(OpdQueueError::DoctorNotFound(request.doctor_id))?;

        let now = Utc::now();
        let waiting_ahead = self.waiting_count(doctor.id).await?;

        let position = waiting_ahead as i32 + 1;
        let patients_ahead = position - 1;
        let wait = linear_wait(
            patients_ahead,
            doctor.average_consultation_minutes,
            doctor.delay_buffer_minutes,
        );

        let token = Token {
            id: Uuid::new_v4(),
            token_number: issue_token_number(request.priority),
            patient_name: request.patient_name,
            age: request.age,
            phone: request.phone,
            email: request.email,
            doctor_id: doctor.id,
            department: doctor.department.clone(),
            status: TokenStatus::Waiting,
            priority: request.priority,
            position_in_queue: position,
            patients_ahead,
            estimated_wait_minutes: wait,
            estimated_consultation_time: Some(format_consultation_time(now, wait)),
            symptoms: request.symptoms,
            medical_history: request.medical_history,
            allergies: request.allergies,
            registration_time: now,
            check_in_time: Some(now),
            actual_consultation_time: None,
            doctor_decision: None,
            decision_time: None,
            notifications: Vec::new(),
        };

        let created = self.tokens.create_token(token).await?;
        info!(
            "Registered token {} for doctor {} at position {}",
            created.token_number, doctor.name, created.position_in_queue
        );

        Ok(created)
    }

    /// Emergency fast path: enters `waiting` at the head of the queue with
    /// a fixed estimate and an informational notification.
    pub async fn register_emergency(
        &self,
        request: EmergencyTokenRequest,
    ) -> Result<Token, OpdQueueError> {
        validate_patient(&request.patient_name, request.age, &request.phone)?;

        if request.reason.trim().is_empty() {
            return Err(OpdQueueError::ValidationError(
                "Emergency reason is required".to_string(),
            ));
        }

        let doctor = self
            .doctors
            .get_doctor(request.doctor_id)
            .await?
            .ok_or(OpdQueueError::DoctorNotFound(request.doctor_id))?;

        let now = Utc::now();
        let token = Token {
            id: Uuid::new_v4(),
            token_number: issue_token_number(Priority::Emergency),
            patient_name: request.patient_name,
            age: request.age,
            phone: request.phone,
            email: None,
            doctor_id: doctor.id,
            department: doctor.department.clone(),
            status: TokenStatus::Waiting,
            priority: Priority::Emergency,
            position_in_queue: 1,
            patients_ahead: 0,
            estimated_wait_minutes: EMERGENCY_WAIT_MINUTES,
            estimated_consultation_time: Some(IMMEDIATE.to_string()),
            symptoms: Some(request.reason),
            medical_history: None,
            allergies: None,
            registration_time: now,
            check_in_time: Some(now),
            actual_consultation_time: None,
            doctor_decision: None,
            decision_time: None,
            notifications: vec![TokenNotification::new(
                "Emergency request received. Medical team will be notified immediately."
                    .to_string(),
                NotificationKind::Urgent,
            )],
        };

        let created = self.tokens.create_token(token).await?;
        info!(
            "Emergency token {} registered for doctor {}",
            created.token_number, doctor.name
        );

        Ok(created)
    }

    async fn waiting_count(&self, doctor_id: Uuid) -> Result<usize, OpdQueueError> {
        let tokens = self.tokens.get_tokens().await?;
        let count = tokens
            .iter()
            .filter(|t| t.doctor_id == doctor_id && t.status.is_rankable())
            .count();

        debug!("Doctor {} has {} tokens in queue", doctor_id, count);
        Ok(count)
    }
}

/// Human-readable token number, unique within the store's retention
/// window: `TKN` plus the last six digits of the epoch milliseconds,
/// `EMG` prefix for emergencies.
pub fn issue_token_number(priority: Priority) -> String {
    let prefix = if priority.is_emergency() { "EMG" } else { "TKN" };
    let suffix = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    format!("{}{:06}", prefix, suffix)
}

fn validate_patient(name: &str, age: i32, phone: &str) -> Result<(), OpdQueueError> {
    if name.trim().is_empty() {
        return Err(OpdQueueError::ValidationError(
            "Patient name is required".to_string(),
        ));
    }
    if !(0..=130).contains(&age) {
        return Err(OpdQueueError::ValidationError(format!(
            "Invalid patient age: {}",
            age
        )));
    }
    if phone.trim().is_empty() {
        return Err(OpdQueueError::ValidationError(
            "Patient phone is required".to_string(),
        ));
    }
    Ok(())
}
