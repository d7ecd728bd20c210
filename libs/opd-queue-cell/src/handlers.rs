use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    CompleteConsultationRequest, CreateTokenRequest, DelayPatientRequest, Doctor,
    EmergencyTokenRequest, Priority, Token, TokenStatus,
};
use crate::services::estimator::{apply_estimates, estimate_queue, queue_metrics};
use crate::services::ranker::rank_queue;
use crate::OpdState;

#[axum::debug_handler]
pub async fn register_token(
    State(state): State<Arc<OpdState>>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<Json<Value>, AppError> {
    if request.priority == Priority::Emergency {
        return Err(AppError::BadRequest(
            "Use the emergency endpoint for emergency registrations".to_string(),
        ));
    }

    let token = state.registration.register(request).await?;
    state.changes.notify_one();

    Ok(Json(json!({ "token": token })))
}

#[axum::debug_handler]
pub async fn register_emergency(
    State(state): State<Arc<OpdState>>,
    Json(request): Json<EmergencyTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let token = state.registration.register_emergency(request).await?;
    state.changes.notify_one();

    Ok(Json(json!({ "token": token })))
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<OpdState>>) -> Result<Json<Value>, AppError> {
    let doctors = state.doctors.get_doctors().await.map_err(AppError::from)?;
    let total = doctors.len();

    Ok(Json(json!({
        "doctors": doctors,
        "total": total
    })))
}

/// Ranked queue for one doctor with estimates recomputed on read, so the
/// view is fresh even between scheduler passes.
#[axum::debug_handler]
pub async fn get_queue(
    State(state): State<Arc<OpdState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let (doctor, doctor_tokens) = doctor_view(&state, doctor_id).await?;

    let estimates = estimate_queue(&doctor, &doctor_tokens, chrono::Utc::now());
    let mut tokens = doctor_tokens;
    apply_estimates(&mut tokens, &estimates);

    let in_consultation: Vec<Token> = tokens
        .iter()
        .filter(|t| t.status == TokenStatus::InConsultation)
        .cloned()
        .collect();
    let queue = rank_queue(tokens);

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "in_consultation": in_consultation,
        "queue": queue
    })))
}

#[axum::debug_handler]
pub async fn get_queue_metrics(
    State(state): State<Arc<OpdState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let (_, doctor_tokens) = doctor_view(&state, doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "metrics": queue_metrics(&doctor_tokens)
    })))
}

#[axum::debug_handler]
pub async fn call_next(
    State(state): State<Arc<OpdState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    match state.consultation.call_next(doctor_id).await? {
        Some(token) => {
            state.changes.notify_one();
            Ok(Json(json!({ "called": true, "token": token })))
        }
        None => Ok(Json(json!({
            "called": false,
            "message": "No patients waiting"
        }))),
    }
}

#[axum::debug_handler]
pub async fn start_consultation(
    State(state): State<Arc<OpdState>>,
    Path(token_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = state.consultation.start_consultation(token_id).await?;
    state.changes.notify_one();

    info!("Consultation started for token {}", token.token_number);
    Ok(Json(json!({ "token": token })))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(state): State<Arc<OpdState>>,
    Path(token_id): Path<Uuid>,
    Json(request): Json<CompleteConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let token = state
        .consultation
        .complete_consultation(token_id, request.decision)
        .await?;
    state.changes.notify_one();

    Ok(Json(json!({ "token": token })))
}

#[axum::debug_handler]
pub async fn delay_patient(
    State(state): State<Arc<OpdState>>,
    Path(token_id): Path<Uuid>,
    Json(request): Json<DelayPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let token = state
        .consultation
        .delay_patient(token_id, request.delay_minutes)
        .await?;
    state.changes.notify_one();

    Ok(Json(json!({ "token": token })))
}

async fn doctor_view(
    state: &OpdState,
    doctor_id: Uuid,
) -> Result<(Doctor, Vec<Token>), AppError> {
    let doctor = state
        .doctors
        .get_doctor(doctor_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Doctor not found: {}", doctor_id)))?;

    let tokens = state.tokens.get_tokens().await.map_err(AppError::from)?;
    let doctor_tokens = tokens
        .into_iter()
        .filter(|t| t.doctor_id == doctor_id)
        .collect();

    Ok((doctor, doctor_tokens))
}
