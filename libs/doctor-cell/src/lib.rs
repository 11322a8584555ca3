pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{DayAvailability, DayOfWeek, Doctor, DoctorError, RosterEntry, TimeSlot};
pub use services::{AvailabilityService, DoctorService};
