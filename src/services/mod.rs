pub mod actor;
pub mod auth;
pub mod employee;
pub mod leave;
pub mod lookup_cache;
pub mod notifier;
pub mod policy;
pub mod provisioning;
pub mod timesheet;

pub use actor::{Actor, ActorResolver, EmployeeActor};
pub use auth::{AuthService, Claims};
pub use employee::EmployeeService;
pub use leave::LeaveService;
pub use lookup_cache::LookupCache;
pub use notifier::{LogNotifier, NotificationError, Notifier, OutgoingEmail, SmtpNotifier};
pub use provisioning::ProvisioningService;
pub use timesheet::TimesheetService;
