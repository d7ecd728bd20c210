use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::OpdQueueError;
use crate::models::{Doctor, DoctorUpdate, Token, TokenUpdate};

/// Persistence contract for tokens. The scheduler owns no state of its own;
/// every operation round-trips through this store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create_token(&self, token: Token) -> Result<Token, OpdQueueError>;

    async fn get_token(&self, token_id: Uuid) -> Result<Option<Token>, OpdQueueError>;

    /// Full current token collection; callers filter per doctor.
    async fn get_tokens(&self) -> Result<Vec<Token>, OpdQueueError>;

    async fn update_token(
        &self,
        token_id: Uuid,
        update: TokenUpdate,
    ) -> Result<Token, OpdQueueError>;
}

/// Read/update contract for the doctor registry. Doctor creation belongs to
/// hospital-staff onboarding and is out of scope here.
#[async_trait]
pub trait DoctorRegistry: Send + Sync {
    async fn get_doctors(&self) -> Result<Vec<Doctor>, OpdQueueError>;

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, OpdQueueError>;

    async fn update_doctor(
        &self,
        doctor_id: Uuid,
        update: DoctorUpdate,
    ) -> Result<Doctor, OpdQueueError>;
}

pub struct SupabaseTokenStore {
    supabase: SupabaseClient,
}

impl SupabaseTokenStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl TokenStore for SupabaseTokenStore {
    async fn create_token(&self, token: Token) -> Result<Token, OpdQueueError> {
        debug!("Creating token {} for doctor {}", token.token_number, token.doctor_id);

        let row = serde_json::to_value(&token)
            .map_err(|e| OpdQueueError::Store(e.to_string()))?;

        let result: Vec<Token> = self.supabase.insert("/rest/v1/opd_tokens", row).await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| OpdQueueError::Store("Failed to create token".to_string()))
    }

    async fn get_token(&self, token_id: Uuid) -> Result<Option<Token>, OpdQueueError> {
        let path = format!("/rest/v1/opd_tokens?id=eq.{}", token_id);
        let result: Vec<Token> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn get_tokens(&self) -> Result<Vec<Token>, OpdQueueError> {
        let path = "/rest/v1/opd_tokens?order=registration_time.asc";
        let result: Vec<Token> = self.supabase.request(Method::GET, path, None).await?;

        Ok(result)
    }

    async fn update_token(
        &self,
        token_id: Uuid,
        update: TokenUpdate,
    ) -> Result<Token, OpdQueueError> {
        let fields: Value = serde_json::to_value(&update)
            .map_err(|e| OpdQueueError::Store(e.to_string()))?;

        let path = format!("/rest/v1/opd_tokens?id=eq.{}", token_id);
        let result: Vec<Token> = self.supabase.update(&path, fields).await?;

        result
            .into_iter()
            .next()
            .ok_or(OpdQueueError::TokenNotFound(token_id))
    }
}

pub struct SupabaseDoctorRegistry {
    supabase: SupabaseClient,
}

impl SupabaseDoctorRegistry {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl DoctorRegistry for SupabaseDoctorRegistry {
    async fn get_doctors(&self) -> Result<Vec<Doctor>, OpdQueueError> {
        let path = "/rest/v1/opd_doctors?order=name.asc";
        let result: Vec<Doctor> = self.supabase.request(Method::GET, path, None).await?;

        Ok(result)
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, OpdQueueError> {
        let path = format!("/rest/v1/opd_doctors?id=eq.{}", doctor_id);
        let result: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn update_doctor(
        &self,
        doctor_id: Uuid,
        update: DoctorUpdate,
    ) -> Result<Doctor, OpdQueueError> {
        let fields: Value = serde_json::to_value(&update)
            .map_err(|e| OpdQueueError::Store(e.to_string()))?;

        let path = format!("/rest/v1/opd_doctors?id=eq.{}", doctor_id);
        let result: Vec<Doctor> = self.supabase.update(&path, fields).await?;

        result
            .into_iter()
            .next()
            .ok_or(OpdQueueError::DoctorNotFound(doctor_id))
    }
}
