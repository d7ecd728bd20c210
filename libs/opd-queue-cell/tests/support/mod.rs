// Shared fixtures for the OPD cell tests: in-memory implementations of the
// store traits plus record builders.
#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use opd_queue_cell::models::{
    Doctor, DoctorUpdate, Priority, Token, TokenStatus, TokenUpdate,
};
use opd_queue_cell::services::{DoctorRegistry, TokenStore};
use opd_queue_cell::OpdQueueError;

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, Token>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, tokens: Vec<Token>) {
        let mut map = self.tokens.write().await;
        for token in tokens {
            map.insert(token.id, token);
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create_token(&self, token: Token) -> Result<Token, OpdQueueError> {
        let mut map = self.tokens.write().await;
        map.insert(token.id, token.clone());
        Ok(token)
    }

    async fn get_token(&self, token_id: Uuid) -> Result<Option<Token>, OpdQueueError> {
        let map = self.tokens.read().await;
        Ok(map.get(&token_id).cloned())
    }

    async fn get_tokens(&self) -> Result<Vec<Token>, OpdQueueError> {
        let map = self.tokens.read().await;
        let mut tokens: Vec<Token> = map.values().cloned().collect();
        tokens.sort_by_key(|t| t.registration_time);
        Ok(tokens)
    }

    async fn update_token(
        &self,
        token_id: Uuid,
        update: TokenUpdate,
    ) -> Result<Token, OpdQueueError> {
        let mut map = self.tokens.write().await;
        let token = map
            .get_mut(&token_id)
            .ok_or(OpdQueueError::TokenNotFound(token_id))?;

        if let Some(status) = update.status {
            token.status = status;
        }
        if let Some(position) = update.position_in_queue {
            token.position_in_queue = position;
        }
        if let Some(ahead) = update.patients_ahead {
            token.patients_ahead = ahead;
        }
        if let Some(wait) = update.estimated_wait_minutes {
            token.estimated_wait_minutes = wait;
        }
        if let Some(time) = update.estimated_consultation_time {
            token.estimated_consultation_time = Some(time);
        }
        if let Some(actual) = update.actual_consultation_time {
            token.actual_consultation_time = Some(actual);
        }
        if let Some(decision) = update.doctor_decision {
            token.doctor_decision = Some(decision);
        }
        if let Some(decision_time) = update.decision_time {
            token.decision_time = Some(decision_time);
        }
        if let Some(notifications) = update.notifications {
            token.notifications = notifications;
        }

        Ok(token.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDoctorRegistry {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl InMemoryDoctorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, doctor: Doctor) {
        let mut map = self.doctors.write().await;
        map.insert(doctor.id, doctor);
    }
}

#[async_trait]
impl DoctorRegistry for InMemoryDoctorRegistry {
    async fn get_doctors(&self) -> Result<Vec<Doctor>, OpdQueueError> {
        let map = self.doctors.read().await;
        let mut doctors: Vec<Doctor> = map.values().cloned().collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, OpdQueueError> {
        let map = self.doctors.read().await;
        Ok(map.get(&doctor_id).cloned())
    }

    async fn update_doctor(
        &self,
        doctor_id: Uuid,
        update: DoctorUpdate,
    ) -> Result<Doctor, OpdQueueError> {
        let mut map = self.doctors.write().await;
        let doctor = map
            .get_mut(&doctor_id)
            .ok_or(OpdQueueError::DoctorNotFound(doctor_id))?;

        if let Some(is_available) = update.is_available {
            doctor.is_available = is_available;
        }
        if let Some(current_patient) = update.current_patient {
            doctor.current_patient = current_patient;
        }
        if let Some(seen) = update.total_patients_seen {
            doctor.total_patients_seen = seen;
        }

        Ok(doctor.clone())
    }
}

pub fn test_doctor(average_minutes: i32, delay_buffer: i32) -> Doctor {
    Doctor {
        id: Uuid::new_v4(),
        name: "Asha Rao".to_string(),
        email: "asha.rao@medisync.example".to_string(),
        department: "General Medicine".to_string(),
        specialization: "General Physician".to_string(),
        room: "204".to_string(),
        average_consultation_minutes: average_minutes,
        delay_buffer_minutes: delay_buffer,
        is_available: true,
        current_patient: None,
        total_patients_seen: 0,
    }
}

pub fn waiting_token(doctor_id: Uuid, priority: Priority, position: i32) -> Token {
    let mut token = base_token(doctor_id, priority, position);
    token.status = TokenStatus::Waiting;
    token
}

pub fn token_with_status(
    doctor_id: Uuid,
    priority: Priority,
    position: i32,
    status: TokenStatus,
) -> Token {
    let mut token = base_token(doctor_id, priority, position);
    token.status = status;
    token
}

fn base_token(doctor_id: Uuid, priority: Priority, position: i32) -> Token {
    Token {
        id: Uuid::new_v4(),
        token_number: format!("TKN{:06}", position),
        patient_name: format!("Patient {}", position),
        age: 34,
        phone: "555-0100".to_string(),
        email: None,
        doctor_id,
        department: "General Medicine".to_string(),
        status: TokenStatus::Waiting,
        priority,
        position_in_queue: position,
        patients_ahead: position - 1,
        estimated_wait_minutes: 0,
        estimated_consultation_time: None,
        symptoms: None,
        medical_history: None,
        allergies: None,
        // Stagger registration times so arrival order matches position.
        registration_time: Utc::now() + chrono::Duration::milliseconds(position as i64),
        check_in_time: Some(Utc::now()),
        actual_consultation_time: None,
        doctor_decision: None,
        decision_time: None,
        notifications: Vec::new(),
    }
}
