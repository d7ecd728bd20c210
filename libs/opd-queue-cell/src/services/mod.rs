pub mod consultation;
pub mod estimator;
pub mod ranker;
pub mod registration;
pub mod scheduler;
pub mod store;

pub use consultation::ConsultationService;
pub use registration::RegistrationService;
pub use scheduler::QueueScheduler;
pub use store::{DoctorRegistry, SupabaseDoctorRegistry, SupabaseTokenStore, TokenStore};
