use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::{CreateAccountInput, LoginInput, ResetInitialPasswordInput};
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

/// Exchange username and password for a JWT.
pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let response = state.auth.login(input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub async fn refresh(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = state.auth.refresh(&claims).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Provision an account with a temporary password (admins and managers).
pub async fn create_account(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<CreateAccountInput>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let response = state
        .provisioning
        .create_account(&actor, input.into_inner())
        .await?;

    let message = if response.notification_sent {
        "Account created; credentials were emailed to the employee"
    } else {
        "Account created, but the credentials email could not be sent"
    };

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        Some(response),
        message,
    )))
}

pub async fn reset_initial_password(
    state: web::Data<AppState>,
    input: web::Json<ResetInitialPasswordInput>,
) -> Result<HttpResponse> {
    state
        .auth
        .reset_initial_password(input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Password has been reset. You can now log in.",
    )))
}
