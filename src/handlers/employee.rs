use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{AdminEmployeeUpdateInput, UpdateProfileInput};
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn get_me(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let profile = state.employees.profile(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(profile)))
}

pub async fn update_me(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<UpdateProfileInput>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let profile = state
        .employees
        .update_profile(&actor, input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(profile)))
}

pub async fn update_employee(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<AdminEmployeeUpdateInput>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let employee = state
        .employees
        .admin_update(&actor, path.into_inner(), input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(employee)))
}

pub async fn delete_employee(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let employee = state.employees.remove(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(employee),
        "Employee removed and account deactivated",
    )))
}
