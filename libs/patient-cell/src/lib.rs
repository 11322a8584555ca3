pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Gender, MedicalHistoryEntry, Patient, PatientError};
pub use services::PatientService;
