use actix_web::{HttpResponse, Result, web};
use serde::de::DeserializeOwned;

use crate::AppState;
use crate::database::models::{ClockInInput, ClockOutInput};
use crate::error::{AppError, NON_FIELD_ERRORS};
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

/// Both clock endpoints accept an empty body, which means "now". Anything
/// else must be valid JSON for the input type.
fn optional_body<T: DeserializeOwned + Default>(body: &web::Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|err| {
        AppError::validation(NON_FIELD_ERRORS, format!("Json deserialize error: {}", err))
    })
}

pub async fn clock_in(
    claims: Claims,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let input: ClockInInput = optional_body(&body)?;
    let actor = state.actors.resolve(&claims).await?;
    let entry = state.timesheets.clock_in(&actor, input).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(entry)))
}

pub async fn clock_out(
    claims: Claims,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let input: ClockOutInput = optional_body(&body)?;
    let actor = state.actors.resolve(&claims).await?;
    let entry = state.timesheets.clock_out(&actor, input).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn my_timesheet(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let entries = state.timesheets.list_mine(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}

pub async fn team_timesheet(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let entries = state.timesheets.list_team(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}
