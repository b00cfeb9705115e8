use actix_web::{HttpRequest, web};

use crate::error::{AppError, NON_FIELD_ERRORS};

pub mod auth;
pub mod employee;
pub mod leave;
pub mod timesheet;

/// Malformed JSON bodies get the same envelope as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::validation(NON_FIELD_ERRORS, err.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req: &HttpRequest| AppError::not_found(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(path_config()).service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(employee::configure)
            .configure(leave::configure)
            .configure(timesheet::configure),
    );
}
