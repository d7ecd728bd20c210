use thiserror::Error;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::TokenStatus;

#[derive(Error, Debug)]
pub enum OpdQueueError {
    #[error("Token not found: {0}")]
    TokenNotFound(Uuid),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: TokenStatus, to: TokenStatus },

    #[error("Doctor {doctor_id} already has a patient in consultation")]
    DoctorBusy { doctor_id: Uuid },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for OpdQueueError {
    fn from(err: anyhow::Error) -> Self {
        OpdQueueError::Store(err.to_string())
    }
}

impl From<OpdQueueError> for AppError {
    fn from(err: OpdQueueError) -> Self {
        match err {
            OpdQueueError::TokenNotFound(_) | OpdQueueError::DoctorNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            OpdQueueError::InvalidStateTransition { .. } | OpdQueueError::DoctorBusy { .. } => {
                AppError::Conflict(err.to_string())
            }
            OpdQueueError::ValidationError(msg) => AppError::ValidationError(msg),
            OpdQueueError::Store(msg) => AppError::Internal(msg),
        }
    }
}
