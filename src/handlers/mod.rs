pub mod auth;
pub mod employee;
pub mod leave;
pub mod shared;
pub mod timesheet;
