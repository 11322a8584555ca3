pub mod authorization;
pub mod validation;

pub use authorization::{clinic_capabilities, CapabilityTable};
pub use validation::ValidationService;
