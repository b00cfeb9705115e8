//! Authorization decisions. Everything here is pure; callers load whatever
//! the decision needs beforehand.

use uuid::Uuid;

use crate::database::models::{Role, TeamScope};
use crate::error::AppError;
use crate::services::actor::{Actor, EmployeeActor};

/// Only admins and managers may provision accounts at all. Checked before
/// any lookup so other callers learn nothing about existing users.
pub fn require_account_creator(actor_role: Option<Role>) -> Result<(), AppError> {
    match actor_role {
        Some(Role::Admin | Role::Manager) => Ok(()),
        Some(Role::Employee) | None => Err(AppError::permission_denied(
            "You do not have permission to create accounts.",
        )),
    }
}

pub fn check_account_creation(
    actor_role: Option<Role>,
    actor_department: Option<&str>,
    target_role: Role,
    target_department: &str,
) -> Result<(), AppError> {
    match actor_role {
        Some(Role::Admin) => Ok(()),
        Some(Role::Manager) => {
            if target_role != Role::Employee {
                return Err(AppError::permission_denied(
                    "Manager creation is restricted to Admins only.",
                ));
            }

            match actor_department {
                Some(department) if department == target_department => Ok(()),
                Some(department) => Err(AppError::validation(
                    "department",
                    format!("Employee creation restricted to {}", department),
                )),
                None => Err(AppError::permission_denied(
                    "Your employee profile has no department.",
                )),
            }
        }
        Some(Role::Employee) | None => require_account_creator(actor_role),
    }
}

/// ADMIN, or the requester's direct manager.
pub fn can_decide_leave(actor: &Actor, requester_manager_id: Option<Uuid>) -> bool {
    match actor.employee() {
        Some(employee) if employee.role == Role::Admin => true,
        Some(employee) => requester_manager_id == Some(employee.employee_id),
        None => false,
    }
}

pub fn check_leave_decision(
    actor: &Actor,
    requester_manager_id: Option<Uuid>,
) -> Result<(), AppError> {
    if can_decide_leave(actor, requester_manager_id) {
        Ok(())
    } else {
        Err(AppError::permission_denied(
            "Only an admin or the employee's manager can approve or reject this request.",
        ))
    }
}

/// Records a team listing may show. Direct reports only; not transitive.
pub fn team_scope(actor: &Actor) -> Result<TeamScope, AppError> {
    match actor.employee() {
        Some(employee) if employee.role == Role::Admin => Ok(TeamScope::All),
        Some(employee) if employee.role == Role::Manager => Ok(TeamScope::DirectReports {
            manager_id: employee.employee_id,
        }),
        _ => Err(AppError::permission_denied(
            "Only managers and admins can view team records.",
        )),
    }
}

pub fn require_admin(actor: &Actor) -> Result<&EmployeeActor, AppError> {
    match actor.employee() {
        Some(employee) if employee.role == Role::Admin => Ok(employee),
        _ => Err(AppError::permission_denied(
            "This action is restricted to admins.",
        )),
    }
}
