pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use tokio::sync::Notify;

pub use error::OpdQueueError;
pub use models::*;
pub use router::opd_routes;
pub use services::{
    ConsultationService, DoctorRegistry, QueueScheduler, RegistrationService, TokenStore,
};

/// Shared state for the OPD cell: the two external stores, the services
/// built over them, and the change signal that wakes the recompute pass.
pub struct OpdState {
    pub tokens: Arc<dyn TokenStore>,
    pub doctors: Arc<dyn DoctorRegistry>,
    pub registration: RegistrationService,
    pub consultation: ConsultationService,
    pub changes: Arc<Notify>,
}

impl OpdState {
    pub fn new(tokens: Arc<dyn TokenStore>, doctors: Arc<dyn DoctorRegistry>) -> Self {
        Self {
            registration: RegistrationService::new(tokens.clone(), doctors.clone()),
            consultation: ConsultationService::new(tokens.clone(), doctors.clone()),
            changes: Arc::new(Notify::new()),
            tokens,
            doctors,
        }
    }
}
