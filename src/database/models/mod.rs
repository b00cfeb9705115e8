pub mod auth;
pub mod employee;
pub mod leave;
mod macros;
pub mod timesheet;
pub mod user;

// Re-export all models for easy importing
pub use auth::*;
pub use employee::*;
pub use leave::*;
pub use timesheet::*;
pub use user::*;
