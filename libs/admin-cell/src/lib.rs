pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Admin, AdminError};
pub use services::AdminService;
