use std::sync::Arc;

use uuid::Uuid;

use crate::database::models::Role;
use crate::database::repositories::{EmployeeStore, UserStore};
use crate::error::AppError;
use crate::services::auth::Claims;

/// Authenticated caller, resolved once per request from its bearer token.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    /// Account without an employee profile.
    Unregistered { user_id: Uuid },
    Employee(EmployeeActor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeActor {
    pub user_id: Uuid,
    pub employee_id: Uuid,
    pub role: Role,
    pub department: String,
    pub manager_id: Option<Uuid>,
}

impl Actor {
    pub fn user_id(&self) -> Uuid {
        match self {
            Actor::Unregistered { user_id } => *user_id,
            Actor::Employee(employee) => employee.user_id,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.employee().map(|employee| employee.role)
    }

    pub fn employee(&self) -> Option<&EmployeeActor> {
        match self {
            Actor::Unregistered { .. } => None,
            Actor::Employee(employee) => Some(employee),
        }
    }
}

#[derive(Clone)]
pub struct ActorResolver {
    users: Arc<dyn UserStore>,
    employees: Arc<dyn EmployeeStore>,
}

impl ActorResolver {
    pub fn new(users: Arc<dyn UserStore>, employees: Arc<dyn EmployeeStore>) -> Self {
        Self { users, employees }
    }

    /// Role and department always come from the store, never from the token.
    pub async fn resolve(&self, claims: &Claims) -> Result<Actor, AppError> {
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is no longer active".to_string()))?;

        let actor = match self.employees.find_by_user_id(user.id).await? {
            Some(employee) => Actor::Employee(EmployeeActor {
                user_id: user.id,
                employee_id: employee.id,
                role: employee.role,
                department: employee.department,
                manager_id: employee.manager_id,
            }),
            None => Actor::Unregistered { user_id: user.id },
        };

        Ok(actor)
    }
}
