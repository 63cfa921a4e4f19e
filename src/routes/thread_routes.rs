// src/routes/thread_routes.rs
use crate::models::{CreateThreadRequest, MessageRequest, ParticipantRequest, ServiceError};
use crate::routes::run_blocking;
use crate::services::thread_service;
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde_json::json;

#[post("/teams/{team_id}/threads")]
async fn create_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<CreateThreadRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let thread = run_blocking(&state, move |state| {
        thread_service::create_thread(&state.store, &user_id, &path.into_inner(), data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(thread))
}

#[get("/teams/{team_id}/threads")]
async fn get_team_threads(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let threads = run_blocking(&state, move |state| {
        thread_service::list_team_threads(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(threads))
}

#[get("/events/{event_id}/threads")]
async fn get_event_threads(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let threads = run_blocking(&state, move |state| {
        thread_service::list_event_threads(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(threads))
}

#[get("/threads/{thread_id}")]
async fn get_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let thread = run_blocking(&state, move |state| {
        thread_service::get_thread(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[delete("/threads/{thread_id}")]
async fn delete_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let thread_id = path.into_inner();

    run_blocking(&state, {
        let thread_id = thread_id.clone();
        move |state| thread_service::delete_thread(&state.store, &user_id, &thread_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Thread deleted",
        "thread_id": thread_id
    })))
}

#[get("/threads/{thread_id}/participants")]
async fn get_participants(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let participants = run_blocking(&state, move |state| {
        thread_service::list_participants(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(participants))
}

#[post("/threads/{thread_id}/participants")]
async fn add_participant(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<ParticipantRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let participant = run_blocking(&state, move |state| {
        thread_service::add_participant(&state.store, &user_id, &path.into_inner(), &data.user_id)
    })
    .await?;
    Ok(HttpResponse::Created().json(participant))
}

#[delete("/threads/{thread_id}/participants/{user_id}")]
async fn remove_participant(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let (thread_id, target_user_id) = path.into_inner();

    run_blocking(&state, {
        let thread_id = thread_id.clone();
        let target_user_id = target_user_id.clone();
        move |state| thread_service::remove_participant(&state.store, &user_id, &thread_id, &target_user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Participant removed",
        "thread_id": thread_id,
        "user_id": target_user_id
    })))
}

#[get("/threads/{thread_id}/messages")]
async fn get_messages(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let messages = run_blocking(&state, move |state| {
        thread_service::list_messages(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[post("/threads/{thread_id}/messages")]
async fn post_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<MessageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let message = run_blocking(&state, move |state| {
        thread_service::post_message(&state.store, &user_id, &path.into_inner(), &data.body)
    })
    .await?;
    Ok(HttpResponse::Created().json(message))
}

#[post("/threads/{thread_id}/read")]
async fn mark_read(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let thread = run_blocking(&state, move |state| {
        thread_service::mark_thread_read(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[put("/messages/{message_id}")]
async fn edit_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<MessageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let message = run_blocking(&state, move |state| {
        thread_service::edit_message(&state.store, &user_id, &path.into_inner(), &data.body)
    })
    .await?;
    Ok(HttpResponse::Ok().json(message))
}

#[delete("/messages/{message_id}")]
async fn delete_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let message_id = path.into_inner();

    run_blocking(&state, {
        let message_id = message_id.clone();
        move |state| thread_service::delete_message(&state.store, &user_id, &message_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Message deleted",
        "message_id": message_id
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_thread)
        .service(get_team_threads)
        .service(get_event_threads)
        .service(get_thread)
        .service(delete_thread)
        .service(get_participants)
        .service(add_participant)
        .service(remove_participant)
        .service(get_messages)
        .service(post_message)
        .service(mark_read)
        .service(edit_message)
        .service(delete_message);
}
