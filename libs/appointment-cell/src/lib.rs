pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentError, AppointmentPatch, AppointmentStatus, BookAppointmentRequest};
pub use services::{
    AppointmentLifecycleService, BatchSweepService, BookingService, ConflictDetectionService,
    SchedulingLockService,
};
