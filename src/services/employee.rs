use uuid::Uuid;

use crate::database::models::{
    AdminEmployeeUpdateInput, Employee, EmployeeChanges, EmployeeProfile, UpdateProfileInput,
};
use crate::database::repositories::Stores;
use crate::error::AppError;
use crate::services::actor::Actor;
use crate::services::lookup_cache::LookupCache;
use crate::services::policy;

/// Upper bound on reporting-line walks; longer chains are treated as cycles.
const MAX_REPORTING_DEPTH: usize = 64;

#[derive(Clone)]
pub struct EmployeeService {
    stores: Stores,
    cache: LookupCache,
}

impl EmployeeService {
    pub fn new(stores: Stores, cache: LookupCache) -> Self {
        Self { stores, cache }
    }

    pub async fn profile(&self, actor: &Actor) -> Result<EmployeeProfile, AppError> {
        let user = self
            .stores
            .users
            .find_by_id(actor.user_id())
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;
        let employee = self.stores.employees.find_by_user_id(user.id).await?;

        Ok(EmployeeProfile {
            user: user.into(),
            employee,
        })
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        input: UpdateProfileInput,
    ) -> Result<EmployeeProfile, AppError> {
        if input.job_title.is_some() && actor.employee().is_none() {
            return Err(AppError::validation(
                "job_title",
                "Only employees have a job title.",
            ));
        }

        let user = self
            .stores
            .users
            .update_names(
                actor.user_id(),
                input.first_name.as_deref().map(str::trim),
                input.last_name.as_deref().map(str::trim),
            )
            .await?;

        let employee = match (actor.employee(), input.job_title) {
            (Some(employee), Some(job_title)) => {
                let changes = EmployeeChanges {
                    job_title: Some(job_title.trim().to_string()),
                    ..Default::default()
                };
                self.stores
                    .employees
                    .update(employee.employee_id, &changes)
                    .await?
            }
            _ => self.stores.employees.find_by_user_id(user.id).await?,
        };

        self.cache.invalidate_user(&user).await;

        Ok(EmployeeProfile {
            user: user.into(),
            employee,
        })
    }

    /// Admin update of role, department, job title and reporting line.
    pub async fn admin_update(
        &self,
        actor: &Actor,
        employee_id: Uuid,
        input: AdminEmployeeUpdateInput,
    ) -> Result<Employee, AppError> {
        policy::require_admin(actor)?;

        let employee = self
            .stores
            .employees
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        let department = match input.department {
            Some(department) if department.trim().is_empty() => {
                return Err(AppError::validation(
                    "department",
                    "This field may not be blank.",
                ));
            }
            other => other.map(|department| department.trim().to_string()),
        };

        let manager_id = match input.manager_email_or_username.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(identifier) => {
                let manager = self
                    .cache
                    .resolve_manager(identifier, self.stores.employees.as_ref())
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(
                            "manager_email_or_username",
                            "No valid manager found with this email/username",
                        )
                    })?;
                self.check_reporting_line(employee.id, manager.id).await?;
                Some(Some(manager.id))
            }
        };

        let changes = EmployeeChanges {
            role: input.role,
            department,
            job_title: input.job_title.map(|title| title.trim().to_string()),
            manager_id,
        };

        let updated = self
            .stores
            .employees
            .update(employee.id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        self.invalidate(updated.user_id).await?;
        log::info!(
            "Admin {} updated employee {}",
            actor.user_id(),
            updated.id
        );

        Ok(updated)
    }

    /// Removes the employee profile and deactivates the account.
    pub async fn remove(&self, actor: &Actor, employee_id: Uuid) -> Result<Employee, AppError> {
        let admin = policy::require_admin(actor)?;

        let employee = self
            .stores
            .employees
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        if employee.user_id == admin.user_id {
            return Err(AppError::permission_denied(
                "You cannot delete your own employee profile.",
            ));
        }

        let removed = self
            .stores
            .employees
            .delete(employee.id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;
        self.stores.users.set_active(removed.user_id, false).await?;

        self.invalidate(removed.user_id).await?;
        log::info!(
            "Admin {} removed employee {} and deactivated user {}",
            actor.user_id(),
            removed.id,
            removed.user_id
        );

        Ok(removed)
    }

    /// Fails if `employee_id` already sits above `manager_id` in the
    /// reporting line.
    async fn check_reporting_line(&self, employee_id: Uuid, manager_id: Uuid) -> Result<(), AppError> {
        let cycle = || {
            AppError::validation(
                "manager_email_or_username",
                "This assignment would create a reporting cycle.",
            )
        };

        let mut current = Some(manager_id);
        for _ in 0..MAX_REPORTING_DEPTH {
            let Some(id) = current else {
                return Ok(());
            };
            if id == employee_id {
                return Err(cycle());
            }
            current = self
                .stores
                .employees
                .find_by_id(id)
                .await?
                .and_then(|employee| employee.manager_id);
        }

        Err(cycle())
    }

    async fn invalidate(&self, user_id: Uuid) -> Result<(), AppError> {
        if let Some(user) = self.stores.users.find_by_id(user_id).await? {
            self.cache.invalidate_user(&user).await;
        }
        Ok(())
    }
}
