pub mod sink;

pub use sink::{NotificationService, NotificationSink};
