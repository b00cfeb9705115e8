use actix_web::web;

use crate::handlers::auth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/token", web::post().to(auth::login))
        .route("/token/refresh", web::post().to(auth::refresh))
        .route("/create/account", web::post().to(auth::create_account))
        .route(
            "/reset-initial-password",
            web::post().to(auth::reset_initial_password),
        );
}
