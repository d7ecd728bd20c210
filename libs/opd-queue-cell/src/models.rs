use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Five-level urgency classification governing queue rank.
/// Emergency always ranks first regardless of arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Emergency,
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    /// Fixed weight table; lower weight sorts earlier.
    pub fn weight(&self) -> u8 {
        match self {
            Priority::Emergency => 0,
            Priority::Urgent => 1,
            Priority::High => 2,
            Priority::Normal => 3,
            Priority::Low => 4,
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, Priority::Emergency)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Emergency => "emergency",
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStatus {
    CheckedIn,
    Waiting,
    InConsultation,
    Completed,
    Delayed,
}

impl TokenStatus {
    /// `completed` is terminal; no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed)
    }

    /// A token in one of these states occupies a queue slot.
    pub fn is_rankable(&self) -> bool {
        matches!(
            self,
            TokenStatus::CheckedIn | TokenStatus::Waiting | TokenStatus::Delayed
        )
    }

    pub fn can_transition_to(&self, target: &TokenStatus) -> bool {
        use TokenStatus::*;
        match (self, target) {
            (CheckedIn, Waiting) => true,
            (CheckedIn, InConsultation) => true,
            (Waiting, InConsultation) => true,
            (Waiting, Delayed) => true,
            (Delayed, Waiting) => true,
            (Delayed, InConsultation) => true,
            (InConsultation, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenStatus::CheckedIn => "checked-in",
            TokenStatus::Waiting => "waiting",
            TokenStatus::InConsultation => "in-consultation",
            TokenStatus::Completed => "completed",
            TokenStatus::Delayed => "delayed",
        };
        write!(f, "{}", s)
    }
}

/// Disposition recorded when a consultation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsultationDecision {
    #[serde(rename = "DISCHARGE")]
    Discharge,
    #[serde(rename = "ADMISSION_REQUIRED")]
    AdmissionRequired,
    #[serde(rename = "FOLLOW_UP")]
    FollowUp,
    #[serde(rename = "REFERRAL")]
    Referral,
}

impl fmt::Display for ConsultationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsultationDecision::Discharge => "DISCHARGE",
            ConsultationDecision::AdmissionRequired => "ADMISSION_REQUIRED",
            ConsultationDecision::FollowUp => "FOLLOW_UP",
            ConsultationDecision::Referral => "REFERRAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Info,
    Urgent,
}

/// Informational message appended to a token's log; not further scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenNotification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl TokenNotification {
    pub fn new(message: String, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            kind,
            timestamp: Utc::now(),
            read: false,
        }
    }
}

/// One queued patient visit, tracked through check-in, waiting,
/// consultation and completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub token_number: String,
    pub patient_name: String,
    pub age: i32,
    pub phone: String,
    pub email: Option<String>,
    pub doctor_id: Uuid,
    /// Denormalized copy of the doctor's department at assignment time.
    pub department: String,
    pub status: TokenStatus,
    pub priority: Priority,
    pub position_in_queue: i32,
    pub patients_ahead: i32,
    pub estimated_wait_minutes: i32,
    pub estimated_consultation_time: Option<String>,
    pub symptoms: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub registration_time: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub actual_consultation_time: Option<DateTime<Utc>>,
    pub doctor_decision: Option<ConsultationDecision>,
    pub decision_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notifications: Vec<TokenNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub specialization: String,
    pub room: String,
    /// Used by the wait-time estimator's linear model.
    pub average_consultation_minutes: i32,
    /// Fixed slack added to every wait estimate.
    pub delay_buffer_minutes: i32,
    pub is_available: bool,
    pub current_patient: Option<String>,
    pub total_patients_seen: i32,
}

/// Partial update written back to the token store. `None` fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TokenStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_in_queue: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patients_ahead: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_consultation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_consultation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_decision: Option<ConsultationDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<TokenNotification>>,
}

/// Partial update for a doctor record. `current_patient` is doubly
/// optional: `Some(None)` clears the field, `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_patient: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_patients_seen: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub patient_name: String,
    pub age: i32,
    pub phone: String,
    pub email: Option<String>,
    pub doctor_id: Uuid,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub symptoms: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

fn default_priority() -> Priority {
    Priority::Normal
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmergencyTokenRequest {
    pub patient_name: String,
    pub age: i32,
    pub phone: String,
    pub doctor_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteConsultationRequest {
    pub decision: ConsultationDecision,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelayPatientRequest {
    pub delay_minutes: i32,
}

/// Aggregates shown on the doctor's queue dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMetrics {
    pub total_patients: usize,
    pub patients_in_consultation: usize,
    pub patients_completed: usize,
    pub average_wait_minutes: i32,
    pub emergency_count: usize,
    pub high_priority_count: usize,
}
