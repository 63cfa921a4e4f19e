// src/routes/auth_routes.rs
use crate::models::{ServiceError, UserCredentials};
use crate::routes::run_blocking;
use crate::services::user_service;
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::{debug, info};
use serde_json::json;

#[post("/auth/register")]
async fn register(
    state: web::Data<AppState>,
    credentials: web::Json<UserCredentials>,
) -> Result<HttpResponse, ServiceError> {
    info!("📝 Register request for email: {}", credentials.email);

    let profile = run_blocking(&state, move |state| {
        user_service::register(&state.store, &state.config, credentials.into_inner())
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user_id": profile.user_id
    })))
}

#[post("/auth/login")]
async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<UserCredentials>,
) -> Result<HttpResponse, ServiceError> {
    info!("🔑 Login request for email: {}", credentials.email);

    let response = run_blocking(&state, move |state| {
        user_service::login(&state.store, &state.config, &credentials)
    })
    .await?;

    Ok(HttpResponse::Ok()
        .append_header(("Authorization", format!("Bearer {}", response.token)))
        .json(response))
}

#[get("/auth/me")]
async fn me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    debug!("👤 Get user info request");
    let user_id = get_user_id_from_request(&req)?;

    let profile = run_blocking(&state, move |state| {
        user_service::me(&state.store, &user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login).service(me);
}
