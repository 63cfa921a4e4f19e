// src/routes/mod.rs
use crate::models::ServiceError;
use crate::AppState;
use actix_web::web;
use log::error;

pub mod auth_routes;
pub mod event_routes;
pub mod invitation_routes;
pub mod team_routes;
pub mod thread_routes;
pub mod user_routes;

// Registers every endpoint; used by the server and the API tests
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and query strings get the same JSON error shape as everything else
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| ServiceError::BadRequest(err.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _| ServiceError::BadRequest(err.to_string()).into()));

    auth_routes::init_routes(cfg);
    user_routes::init_routes(cfg);
    team_routes::init_routes(cfg);
    invitation_routes::init_routes(cfg);
    event_routes::init_routes(cfg);
    thread_routes::init_routes(cfg);
}

/// Run a service call on the blocking thread pool. Services do file I/O and
/// may wait on the store lock, neither of which should stall an async worker.
pub async fn run_blocking<F, T>(state: &web::Data<AppState>, call: F) -> Result<T, ServiceError>
where
    F: FnOnce(&AppState) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    web::block(move || call(&state)).await.map_err(|e| {
        error!("❌ Blocking task failed: {:?}", e);
        ServiceError::InternalServerError
    })?
}
