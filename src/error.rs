use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Password reset required before logging in")]
    PasswordResetRequired { reset_url: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::validation(NON_FIELD_ERRORS, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        AppError::PermissionDenied(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    /// Field name or error category reported to clients.
    pub fn error_key(&self) -> &str {
        match self {
            AppError::Validation { field, .. } => field,
            AppError::NotFound(_) => "not_found",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::Conflict(_) => "conflict",
            AppError::PasswordResetRequired { .. } => "password_reset_required",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::NotFound(message)
            | AppError::PermissionDenied(message)
            | AppError::Conflict(message)
            | AppError::Unauthorized(message) => message.clone(),
            AppError::PasswordResetRequired { .. } => self.to_string(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PasswordResetRequired { .. } => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            log::error!("Request failed with status {}: {}", status_code, self);
        } else {
            log::warn!("Request rejected with status {}: {}", status_code, self);
        }

        let message = self.client_message();
        match self {
            AppError::PasswordResetRequired { reset_url } => HttpResponse::build(status_code)
                .json(
                    ApiResponse::error_with_data(
                        json!({ "requires_password_reset": true, "reset_url": reset_url }),
                        &message,
                    )
                    .with_error_key(self.error_key()),
                ),
            _ => HttpResponse::build(status_code)
                .json(ApiResponse::error(&message).with_error_key(self.error_key())),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                let constraint = db_error.constraint().unwrap_or_default().to_string();
                log::warn!("Unique constraint violated: {}", constraint);
                return unique_violation(&constraint);
            }
        }

        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

fn unique_violation(constraint: &str) -> AppError {
    if constraint.contains("username") {
        AppError::validation("username", "This username is already taken.")
    } else if constraint.contains("email") {
        AppError::validation("email", "This email is already registered.")
    } else if constraint.contains("open_shift") {
        AppError::invalid("You have already clocked in.")
    } else {
        AppError::conflict("A record with the same details already exists")
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Stores report through anyhow; recover the sqlx error when there is one
        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(original_error) => match original_error.downcast::<AppError>() {
                Ok(app_err) => app_err,
                Err(other) => {
                    log::error!("Unexpected error: {}", other);
                    AppError::InternalServerError(Some(other.to_string()))
                }
            },
        }
    }
}
