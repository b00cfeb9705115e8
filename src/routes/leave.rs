use actix_web::web;

use crate::handlers::leave;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave-request")
            .route("", web::post().to(leave::create_leave_request))
            .route("/me", web::get().to(leave::my_leave_requests))
            .route("/team", web::get().to(leave::team_leave_requests))
            .route(
                "/{id}/approve",
                web::patch().to(leave::approve_leave_request),
            )
            .route("/{id}/reject", web::patch().to(leave::reject_leave_request)),
    );
}
