pub mod employee;
pub mod leave_request;
pub mod timesheet;
pub mod user;

use std::sync::Arc;

use sqlx::PgPool;

// Re-export all repositories for easy importing
pub use employee::{EmployeeRepository, EmployeeStore};
pub use leave_request::{LeaveRequestRepository, LeaveRequestStore};
pub use timesheet::{TimesheetRepository, TimesheetStore};
pub use user::{UserRepository, UserStore};

/// The directory store handed to services, one trait object per entity.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub employees: Arc<dyn EmployeeStore>,
    pub leave_requests: Arc<dyn LeaveRequestStore>,
    pub timesheets: Arc<dyn TimesheetStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            employees: Arc::new(EmployeeRepository::new(pool.clone())),
            leave_requests: Arc::new(LeaveRequestRepository::new(pool.clone())),
            timesheets: Arc::new(TimesheetRepository::new(pool)),
        }
    }
}
