pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use std::sync::Arc;

pub use config::Config;
pub use database::repositories::Stores;
pub use error::AppError;
pub use services::{
    ActorResolver, AuthService, EmployeeService, LeaveService, LookupCache, Notifier,
    ProvisioningService, TimesheetService,
};

pub struct AppState {
    pub auth: AuthService,
    pub actors: ActorResolver,
    pub provisioning: ProvisioningService,
    pub employees: EmployeeService,
    pub leave: LeaveService,
    pub timesheets: TimesheetService,
}

impl AppState {
    /// Wires every service over one set of stores and one lookup cache.
    pub fn new(
        stores: Stores,
        cache: LookupCache,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self {
            auth: AuthService::new(stores.clone(), cache.clone(), config.clone()),
            actors: ActorResolver::new(stores.users.clone(), stores.employees.clone()),
            provisioning: ProvisioningService::new(
                stores.clone(),
                cache.clone(),
                notifier,
                config,
            ),
            employees: EmployeeService::new(stores.clone(), cache),
            leave: LeaveService::new(stores.clone()),
            timesheets: TimesheetService::new(stores),
        }
    }
}
