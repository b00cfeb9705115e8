use actix_web::web;

use crate::handlers::timesheet;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/timesheet")
            .route("/clock-in", web::post().to(timesheet::clock_in))
            .route("/clock-out", web::post().to(timesheet::clock_out))
            .route("/me", web::get().to(timesheet::my_timesheet))
            .route("/team", web::get().to(timesheet::team_timesheet)),
    );
}
