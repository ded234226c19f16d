use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::io;
use tracing_actix_web::TracingLogger;

use pulse_service::app_state::AppState;
use pulse_service::config::Config;
use pulse_service::logging::init_tracing;
use pulse_service::routes::configure_routes;
use pulse_service::security::jwt;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {e:#}");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    jwt::initialize_secret(&config.jwt_secret).map_err(|e| {
        tracing::error!("Failed to initialize JWT secret: {e:#}");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);

    let state = AppState::initialize(config).await.map_err(|e| {
        tracing::error!("Failed to initialize application state: {e:#}");
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    tracing::info!("Starting pulse-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Listening on {bind_address}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
