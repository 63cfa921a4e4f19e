// src/routes/user_routes.rs
use crate::models::{ServiceError, UpdateProfileRequest};
use crate::routes::run_blocking;
use crate::services::user_service;
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{get, put, web, HttpRequest, HttpResponse};
use log::info;

#[put("/users/me")]
async fn update_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    data: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    info!("✏️ Updating profile for user: {}", user_id);

    let profile = run_blocking(&state, move |state| {
        user_service::update_profile(&state.store, &user_id, data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/users/{user_id}")]
async fn get_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let target_user_id = path.into_inner();

    let profile = run_blocking(&state, move |state| {
        user_service::get_user(&state.store, &user_id, &target_user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(update_profile).service(get_user);
}
