pub mod booking;
pub mod conflict;
pub mod consistency;
pub mod lifecycle;
pub mod sweeper;

pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use consistency::SchedulingLockService;
pub use lifecycle::AppointmentLifecycleService;
pub use sweeper::BatchSweepService;
