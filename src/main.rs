//Third-party-dependencies
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

// Crate imports:
use convene_service::config::AppConfig;
use convene_service::routes;
use convene_service::utils::auth_middleware::Authentication;
use convene_service::AppState;

fn cors_for(origin: Option<&str>) -> Cors {
    let cors = match origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let address = config.bind_address.clone();

    let state = web::Data::new(AppState::new(config)?);
    info!("📁 Storage at {}", state.store.root().display());
    info!("🚀 Server started at {}", address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Authentication::new(&state.config.jwt_secret))
            .wrap(cors_for(state.config.cors_origin.as_deref()))
            .wrap(Logger::default())
            .configure(routes::init_routes)
    })
    .bind(address)?
    .run()
    .await
}
