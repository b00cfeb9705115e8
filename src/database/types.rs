use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::models::{
    EmployeeSummary, LeaveRequest, LeaveStatus, Role, TeamLeaveRequest, TeamTimesheetEntry,
    TimesheetEntry, UserInfo,
};

// Joined row types for team listings; employee columns are nullable because
// accounts without an employee profile still own records.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamLeaveRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: Option<Uuid>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamTimesheetRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clock_in_time: DateTime<Utc>,
    pub clock_out_time: Option<DateTime<Utc>>,
    pub working_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: Option<Uuid>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

fn summary(
    employee_id: Option<Uuid>,
    role: Option<Role>,
    department: Option<String>,
    job_title: Option<String>,
) -> Option<EmployeeSummary> {
    match (employee_id, role, department) {
        (Some(id), Some(role), Some(department)) => Some(EmployeeSummary {
            id,
            role,
            department,
            job_title,
        }),
        _ => None,
    }
}

impl From<TeamLeaveRow> for TeamLeaveRequest {
    fn from(row: TeamLeaveRow) -> Self {
        Self {
            requester: UserInfo {
                id: row.user_id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            employee: summary(row.employee_id, row.role, row.department, row.job_title),
            request: LeaveRequest {
                id: row.id,
                user_id: row.user_id,
                start_date: row.start_date,
                end_date: row.end_date,
                reason: row.reason,
                status: row.status,
                approved_by: row.approved_by,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl From<TeamTimesheetRow> for TeamTimesheetEntry {
    fn from(row: TeamTimesheetRow) -> Self {
        Self {
            requester: UserInfo {
                id: row.user_id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            employee: summary(row.employee_id, row.role, row.department, row.job_title),
            entry: TimesheetEntry {
                id: row.id,
                user_id: row.user_id,
                clock_in_time: row.clock_in_time,
                clock_out_time: row.clock_out_time,
                working_seconds: row.working_seconds,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }
            .into(),
        }
    }
}
