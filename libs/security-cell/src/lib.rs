// =====================================================================================
// SECURITY CELL - AUTHORIZATION & INPUT VALIDATION
// =====================================================================================
//
// - Capability table keyed by (resource type, action) deciding whether a
//   verified requester may act on a record
// - Time-of-day and free-text validation shared by the scheduling cells
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{Action, AuthorizationError, ResourceOwners, ResourceType, ValidationIssue};
pub use services::{clinic_capabilities, CapabilityTable, ValidationService};
