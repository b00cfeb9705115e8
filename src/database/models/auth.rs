use serde::{Deserialize, Serialize};

use super::employee::{EmployeeSummary, Role};
use super::user::UserInfo;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// JWT authentication token
    pub token: String,
    pub user: UserInfo,
    pub employee: Option<EmployeeSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetInitialPasswordInput {
    pub username: String,
    pub temporary_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountInput {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    pub manager_email_or_username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub hire_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub user: UserInfo,
    pub employee: EmployeeSummary,
    pub manager_id: Option<uuid::Uuid>,
    pub password_reset_required: bool,
    /// False when the credentials email could not be handed to the mail server.
    pub notification_sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminEmployeeUpdateInput {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    /// Email or username of the new manager; an empty string clears it.
    pub manager_email_or_username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub user: UserInfo,
    pub employee: Option<super::employee::Employee>,
}
