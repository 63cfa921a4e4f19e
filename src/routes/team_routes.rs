// src/routes/team_routes.rs
use crate::models::{CreateTeamRequest, ServiceError, TransferOwnershipRequest, UpdateRoleRequest, UpdateTeamRequest};
use crate::routes::run_blocking;
use crate::services::team_service;
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use log::info;
use serde_json::json;

#[post("/teams")]
async fn create_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    team_data: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        team_service::create_team(&state.store, &user_id, team_data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(team))
}

#[get("/teams")]
async fn get_user_teams(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    info!("📋 Fetching teams for user: {}", user_id);

    let teams = run_blocking(&state, move |state| {
        team_service::list_my_teams(&state.store, &user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(teams))
}

#[get("/teams/current")]
async fn get_current_team(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let current = run_blocking(&state, move |state| {
        team_service::get_current_team(&state.store, &user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(current))
}

#[get("/teams/by-slug/{slug}")]
async fn get_team_by_slug(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        team_service::get_team_by_slug(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

#[get("/teams/{team_id}")]
async fn get_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let team_id = path.into_inner();
    info!("🔍 Fetching team: {} for user: {}", team_id, user_id);

    let team = run_blocking(&state, move |state| {
        team_service::get_team(&state.store, &user_id, &team_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

#[put("/teams/{team_id}")]
async fn update_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<UpdateTeamRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        team_service::update_team(&state.store, &user_id, &path.into_inner(), data.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

#[delete("/teams/{team_id}")]
async fn delete_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let team_id = path.into_inner();

    run_blocking(&state, {
        let team_id = team_id.clone();
        move |state| team_service::delete_team(&state.store, &user_id, &team_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Team deleted successfully",
        "team_id": team_id
    })))
}

// Switch active team
#[post("/teams/{team_id}/activate")]
async fn activate_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        team_service::switch_team(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

#[get("/teams/{team_id}/members")]
async fn get_team_members(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let members = run_blocking(&state, move |state| {
        team_service::list_members(&state.store, &user_id, &path.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(members))
}

#[put("/teams/{team_id}/members/{user_id}")]
async fn update_team_member_role(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    data: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, ServiceError> {
    let current_user_id = get_user_id_from_request(&req)?;
    let (team_id, target_user_id) = path.into_inner();
    info!("🔄 Updating role for user: {} in team: {}", target_user_id, team_id);

    let member = run_blocking(&state, move |state| {
        team_service::update_member_role(&state.store, &current_user_id, &team_id, &target_user_id, data.role)
    })
    .await?;
    Ok(HttpResponse::Ok().json(member))
}

#[delete("/teams/{team_id}/members/{user_id}")]
async fn remove_team_member(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let current_user_id = get_user_id_from_request(&req)?;
    let (team_id, target_user_id) = path.into_inner();

    run_blocking(&state, {
        let team_id = team_id.clone();
        let target_user_id = target_user_id.clone();
        move |state| team_service::remove_member(&state.store, &current_user_id, &team_id, &target_user_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User removed from team successfully",
        "user_id": target_user_id,
        "team_id": team_id
    })))
}

#[post("/teams/{team_id}/leave")]
async fn leave_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let team_id = path.into_inner();

    run_blocking(&state, {
        let team_id = team_id.clone();
        move |state| team_service::leave_team(&state.store, &user_id, &team_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "You left the team",
        "team_id": team_id
    })))
}

#[post("/teams/{team_id}/transfer")]
async fn transfer_ownership(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Json<TransferOwnershipRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let team = run_blocking(&state, move |state| {
        team_service::transfer_ownership(&state.store, &user_id, &path.into_inner(), &data.new_owner_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(team))
}

// Literal paths are registered ahead of `/teams/{team_id}`
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_team)
        .service(get_user_teams)
        .service(get_current_team)
        .service(get_team_by_slug)
        .service(get_team)
        .service(update_team)
        .service(delete_team)
        .service(activate_team)
        .service(get_team_members)
        .service(update_team_member_role)
        .service(remove_team_member)
        .service(leave_team)
        .service(transfer_ownership);
}
