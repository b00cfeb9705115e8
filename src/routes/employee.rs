use actix_web::web;

use crate::handlers::employee;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employee")
            .route("/me", web::get().to(employee::get_me))
            .route("/me", web::put().to(employee::update_me))
            .route("/{id}", web::patch().to(employee::update_employee))
            .route("/{id}", web::delete().to(employee::delete_employee)),
    );
}
