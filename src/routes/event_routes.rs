// src/routes/event_routes.rs
use crate::models::{
    CreateEventRequest, EventStatus, RegisterForEventRequest, ServiceError, UpdateEventRequest,
    UpdateEventStatusRequest,
};
use crate::routes::run_blocking;
use crate::services::{event_service, registration_service};
use crate::utils::{get_user_id_from_request, optional_user_id};
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct EventFilter {
    status: Option<EventStatus>,
}

#[post("/teams/{team_id}/events")]
async fn create_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let event = run_blocking(&state, move |state| {
        event_service::create_event(&state.store, &user_id, &path.into_inner(), data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(event))
}

#[get("/teams/{team_id}/events")]
async fn get_team_events(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    filter: web::Query<EventFilter>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let events = run_blocking(&state, move |state| {
        event_service::list_team_events(&state.store, &user_id, &path.into_inner(), filter.status)
    })
    .await?;
    Ok(HttpResponse::Ok().json(events))
}

#[get("/events/public")]
async fn get_public_events(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let events = run_blocking(&state, move |state| {
        event_service::list_public_events(&state.store)
    })
    .await?;
    Ok(HttpResponse::Ok().json(events))
}

#[get("/events/public/{slug}")]
async fn get_public_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let event = run_blocking(&state, move |state| {
        event_service::get_public_event(&state.store, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

#[get("/events/{event_id}")]
async fn get_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let event = run_blocking(&state, move |state| {
        event_service::get_event(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

#[put("/events/{event_id}")]
async fn update_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let event = run_blocking(&state, move |state| {
        event_service::update_event(&state.store, &user_id, &path.into_inner(), data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

#[put("/events/{event_id}/status")]
async fn update_event_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<UpdateEventStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let event_id = path.into_inner();
    info!("🔄 Setting event: {} to {:?}", event_id, data.status);

    let event = run_blocking(&state, move |state| {
        event_service::set_event_status(&state.store, &user_id, &event_id, data.status)
    })
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

#[delete("/events/{event_id}")]
async fn delete_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let event_id = path.into_inner();

    run_blocking(&state, {
        let event_id = event_id.clone();
        move |state| event_service::delete_event(&state.store, &user_id, &event_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Event deleted successfully",
        "event_id": event_id
    })))
}

// Open to anonymous visitors; a bearer token links the registration to the account
#[post("/events/{event_id}/registrations")]
async fn register_for_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<RegisterForEventRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = optional_user_id(&req);

    let registration = run_blocking(&state, move |state| {
        registration_service::register_for_event(
            &state.store,
            user_id.as_deref(),
            &path.into_inner(),
            data.into_inner(),
        )
    })
    .await?;
    Ok(HttpResponse::Created().json(registration))
}

#[get("/events/{event_id}/registrations")]
async fn get_event_registrations(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let registrations = run_blocking(&state, move |state| {
        registration_service::list_event_registrations(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(registrations))
}

#[get("/registrations")]
async fn get_user_registrations(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let registrations = run_blocking(&state, move |state| {
        registration_service::list_my_registrations(&state.store, &user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(registrations))
}

#[delete("/registrations/{registration_id}")]
async fn cancel_registration(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let registration_id = path.into_inner();

    run_blocking(&state, {
        let registration_id = registration_id.clone();
        move |state| registration_service::cancel_registration(&state.store, &user_id, &registration_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Registration cancelled",
        "registration_id": registration_id
    })))
}

// `/events/public` must match before `/events/{event_id}`
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_event)
        .service(get_team_events)
        .service(get_public_events)
        .service(get_public_event)
        .service(get_event)
        .service(update_event)
        .service(update_event_status)
        .service(delete_event)
        .service(register_for_event)
        .service(get_event_registrations)
        .service(get_user_registrations)
        .service(cancel_registration);
}
