use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Role {
        Employee => "EMPLOYEE",
        Manager => "MANAGER",
        Admin => "ADMIN",
    }
}

impl Role {
    /// Roles that may act as someone's manager.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub department: String,
    pub job_title: Option<String>,
    pub hire_date: NaiveDate,
    pub leave_balance: i32,
    pub manager_id: Option<Uuid>,
    pub password_reset_required: bool,
    #[serde(skip_serializing)]
    pub temp_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub role: Role,
    pub department: String,
    pub job_title: Option<String>,
    pub hire_date: NaiveDate,
    pub manager_id: Option<Uuid>,
    pub password_reset_required: bool,
    pub temp_password: Option<String>,
}

/// Partial update applied by administrators. `manager_id: Some(None)` clears
/// the reporting line.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub manager_id: Option<Option<Uuid>>,
}

/// Lightweight employee reference kept in the lookup cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRef {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: Uuid,
    pub role: Role,
    pub department: String,
    pub job_title: Option<String>,
}

/// Which employees' records a team listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamScope {
    All,
    DirectReports { manager_id: Uuid },
}

impl TeamScope {
    /// Manager filter to bind into team queries; `None` means everyone.
    pub fn manager_filter(&self) -> Option<Uuid> {
        match self {
            TeamScope::All => None,
            TeamScope::DirectReports { manager_id } => Some(*manager_id),
        }
    }

    pub fn includes(&self, employee_manager_id: Option<Uuid>) -> bool {
        match self {
            TeamScope::All => true,
            TeamScope::DirectReports { manager_id } => employee_manager_id == Some(*manager_id),
        }
    }
}

impl Employee {
    pub fn new(user_id: Uuid, input: NewEmployee) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            role: input.role,
            department: input.department,
            job_title: input.job_title,
            hire_date: input.hire_date,
            leave_balance: 0,
            manager_id: input.manager_id,
            password_reset_required: input.password_reset_required,
            temp_password: input.temp_password,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_ref(&self) -> EmployeeRef {
        EmployeeRef {
            id: self.id,
            user_id: self.user_id,
            role: self.role,
            department: self.department.clone(),
        }
    }

    pub fn summary(&self) -> EmployeeSummary {
        EmployeeSummary {
            id: self.id,
            role: self.role,
            department: self.department.clone(),
            job_title: self.job_title.clone(),
        }
    }

    pub fn apply(&mut self, changes: &EmployeeChanges) {
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(department) = &changes.department {
            self.department = department.clone();
        }
        if let Some(job_title) = &changes.job_title {
            self.job_title = Some(job_title.clone());
        }
        if let Some(manager_id) = changes.manager_id {
            self.manager_id = manager_id;
        }
        self.updated_at = Utc::now();
    }
}
