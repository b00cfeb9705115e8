use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::LeaveRequestInput;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn create_leave_request(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<LeaveRequestInput>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let request = state.leave.create(&actor, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(request)))
}

pub async fn my_leave_requests(
    claims: Claims,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let requests = state.leave.list_mine(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

/// Requests of the caller's direct reports (everyone, for admins).
pub async fn team_leave_requests(
    claims: Claims,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let requests = state.leave.list_team(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn approve_leave_request(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let request = state.leave.approve(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(request),
        "Leave request approved",
    )))
}

pub async fn reject_leave_request(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = state.actors.resolve(&claims).await?;
    let request = state.leave.reject(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        Some(request),
        "Leave request rejected",
    )))
}
