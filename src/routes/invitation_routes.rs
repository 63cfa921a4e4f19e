// src/routes/invitation_routes.rs
use crate::models::{CreateInvitationRequest, IssuedInvitation, ServiceError};
use crate::routes::run_blocking;
use crate::services::{invitation_service, notification_service};
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use chrono::Duration;
use log::info;
use serde_json::json;

// Queue the invitation email once the invitation has been stored
fn send_invitation_email(state: &AppState, issued: &IssuedInvitation) {
    let email = notification_service::invitation_email(&issued.invitation, &issued.token, &state.config.app_base_url);
    notification_service::schedule(state.mailer.clone(), email);
}

#[post("/teams/{team_id}/invitations")]
async fn create_invitation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    invite: web::Json<CreateInvitationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let team_id = path.into_inner();
    info!("📨 Creating invitation for {} to team: {}", invite.email, team_id);

    let ttl = Duration::days(state.config.invitation_ttl_days);
    let issued = run_blocking(&state, move |state| {
        invitation_service::create_invitation(&state.store, &user_id, &team_id, invite.into_inner(), ttl)
    })
    .await?;
    send_invitation_email(&state, &issued);

    Ok(HttpResponse::Created().json(issued))
}

#[get("/teams/{team_id}/invitations")]
async fn get_team_invitations(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let invitations = run_blocking(&state, move |state| {
        invitation_service::list_team_invitations(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(invitations))
}

#[get("/invitations")]
async fn get_user_invitations(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let invitations = run_blocking(&state, move |state| {
        invitation_service::list_my_invitations(&state.store, &user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(invitations))
}

// Public: lets the invite page render before the visitor signs in
#[get("/invitations/token/{token}")]
async fn preview_invitation(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let preview = run_blocking(&state, move |state| {
        invitation_service::preview_invitation(&state.store, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(preview))
}

#[post("/invitations/token/{token}/accept")]
async fn accept_invitation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        invitation_service::accept_invitation(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

#[post("/invitations/token/{token}/decline")]
async fn decline_invitation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    run_blocking(&state, move |state| {
        invitation_service::decline_invitation(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Invitation declined" })))
}

#[post("/invitations/{invitation_id}/resend")]
async fn resend_invitation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let ttl = Duration::days(state.config.invitation_ttl_days);
    let issued = run_blocking(&state, move |state| {
        invitation_service::resend_invitation(&state.store, &user_id, &path.into_inner(), ttl)
    })
    .await?;
    send_invitation_email(&state, &issued);

    Ok(HttpResponse::Ok().json(issued))
}

#[delete("/invitations/{invitation_id}")]
async fn cancel_invitation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let invitation_id = path.into_inner();

    run_blocking(&state, {
        let invitation_id = invitation_id.clone();
        move |state| invitation_service::cancel_invitation(&state.store, &user_id, &invitation_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Invitation cancelled",
        "invitation_id": invitation_id
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_invitation)
        .service(get_team_invitations)
        .service(get_user_invitations)
        .service(preview_invitation)
        .service(accept_invitation)
        .service(decline_invitation)
        .service(resend_invitation)
        .service(cancel_invitation);
}
