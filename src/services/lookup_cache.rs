//! Time-bounded cache for the two lookups on the provisioning path:
//! a user's department and the resolution of a manager identifier.
//!
//! Manager resolutions are keyed by the lower-cased identifier and cache
//! negative results too. Writes to an employee invalidate the department
//! entry and every resolution whose key starts with the employee's email or
//! username.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use moka::future::Cache;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{EmployeeRef, User};
use crate::database::repositories::EmployeeStore;

#[derive(Clone)]
pub struct LookupCache {
    departments: Arc<Cache<Uuid, String>>,
    managers: Arc<Cache<String, Option<EmployeeRef>>>,
}

fn manager_key(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

impl LookupCache {
    pub fn new(max_capacity: u64, department_ttl_secs: u64, manager_ttl_secs: u64) -> Self {
        let departments = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(department_ttl_secs))
            .build();

        let managers = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(manager_ttl_secs))
            .support_invalidation_closures()
            .build();

        Self {
            departments: Arc::new(departments),
            managers: Arc::new(managers),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.lookup_cache_capacity,
            config.department_cache_ttl_secs,
            config.manager_cache_ttl_secs,
        )
    }

    pub async fn get_department(&self, user_id: Uuid) -> Option<String> {
        self.departments.get(&user_id).await
    }

    pub async fn set_department(&self, user_id: Uuid, department: String) {
        self.departments.insert(user_id, department).await;
    }

    /// Department of `user_id`, read through the cache. `None` for accounts
    /// without an employee profile; those are not cached.
    pub async fn department_of(
        &self,
        user_id: Uuid,
        employees: &dyn EmployeeStore,
    ) -> Result<Option<String>> {
        if let Some(department) = self.get_department(user_id).await {
            log::debug!("Department cache hit for user {}", user_id);
            return Ok(Some(department));
        }

        let department = employees
            .find_by_user_id(user_id)
            .await?
            .map(|employee| employee.department);

        if let Some(department) = &department {
            self.set_department(user_id, department.clone()).await;
        }

        Ok(department)
    }

    /// Resolves an email or username to an employee allowed to manage
    /// others (ADMIN or MANAGER). Misses are cached as `None`.
    pub async fn resolve_manager(
        &self,
        identifier: &str,
        employees: &dyn EmployeeStore,
    ) -> Result<Option<EmployeeRef>> {
        let key = manager_key(identifier);

        if let Some(cached) = self.managers.get(&key).await {
            log::debug!("Manager cache hit for '{}'", key);
            return Ok(cached);
        }

        let resolved = employees
            .find_by_email_or_username(identifier.trim())
            .await?
            .and_then(|(_, employee)| employee)
            .filter(|employee| employee.role.can_manage())
            .map(|employee| employee.to_ref());

        self.managers.insert(key, resolved.clone()).await;

        Ok(resolved)
    }

    /// Drops everything cached about one employee.
    pub async fn invalidate_employee(&self, user_id: Uuid, email: &str, username: &str) {
        self.departments.invalidate(&user_id).await;

        let email = manager_key(email);
        let username = manager_key(username);
        let result = self.managers.invalidate_entries_if(move |key, _| {
            (!email.is_empty() && key.starts_with(&email))
                || (!username.is_empty() && key.starts_with(&username))
        });

        if let Err(err) = result {
            log::warn!(
                "Pattern invalidation of manager cache failed ({}); clearing it",
                err
            );
            self.managers.invalidate_all();
        }
    }

    pub async fn invalidate_user(&self, user: &User) {
        self.invalidate_employee(user.id, &user.email, &user.username)
            .await;
    }

    #[cfg(test)]
    async fn sync(&self) {
        self.departments.run_pending_tasks().await;
        self.managers.run_pending_tasks().await;
    }
}
