use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use hrdesk::database::init_database;
use hrdesk::middleware::RequestIdMiddleware;
use hrdesk::services::notifier::notifier_from_config;
use hrdesk::{AppState, Config, LookupCache, Stores, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("HR Desk API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting HR Desk API server...");

    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {})",
        config.environment
    );

    let pool = init_database(&config).await?;
    log::info!("Database initialized");

    let stores = Stores::postgres(pool);
    let cache = LookupCache::from_config(&config);
    let notifier = notifier_from_config(&config)?;

    let app_state = web::Data::new(AppState::new(
        stores,
        cache,
        notifier,
        config.clone(),
    ));

    if let Some(admin) = app_state.auth.ensure_bootstrap_admin().await? {
        log::info!("Bootstrap admin '{}' is ready", admin.username);
    }

    let config_data = web::Data::new(config.clone());
    let allowed_origin = config.client_base_url.clone();
    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&allowed_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Request-ID",
                    ])
                    .expose_headers(vec!["X-Request-ID"])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T request_id=%{x-request-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
