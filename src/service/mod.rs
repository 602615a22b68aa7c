//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod attendance;
mod identity;

pub use attendance::{AttendanceLedger, ToggleOutcome, format_duration, validate_lab_id};
pub use identity::{IdentityResolver, ProviderProfile};
