// src/services/access.rs
//
// Authorization helpers shared by every service: resolve the caller, resolve
// their current team, and check membership or a minimum role.
use crate::models::{Event, ServiceError, Team, TeamMember, TeamRole, Thread, User};
use crate::utils::Store;
use log::error;

// A token can outlive its user row; treat that as signed out
pub fn require_user(store: &Store, user_id: &str) -> Result<User, ServiceError> {
    store.find_user_by_id(user_id)?.ok_or_else(|| {
        error!("❌ Authenticated user no longer exists: {}", user_id);
        ServiceError::Unauthorized
    })
}

pub fn require_team(store: &Store, team_id: &str) -> Result<Team, ServiceError> {
    store
        .find_team_by_id(team_id)?
        .ok_or_else(|| ServiceError::not_found("Team"))
}

pub fn require_member(store: &Store, user_id: &str, team_id: &str) -> Result<TeamMember, ServiceError> {
    require_team(store, team_id)?;
    store.find_team_member(user_id, team_id)?.ok_or_else(|| {
        error!("❌ User: {} doesn't have access to team: {}", user_id, team_id);
        ServiceError::Forbidden
    })
}

pub fn require_role(
    store: &Store,
    user_id: &str,
    team_id: &str,
    min_role: TeamRole,
) -> Result<TeamMember, ServiceError> {
    let member = require_member(store, user_id, team_id)?;
    if member.role < min_role {
        error!(
            "❌ User: {} has role {} in team: {}, {} required",
            user_id, member.role, team_id, min_role
        );
        return Err(ServiceError::Forbidden);
    }
    Ok(member)
}

// Event plus the caller's membership in the owning team
pub fn require_event_member(
    store: &Store,
    user_id: &str,
    event_id: &str,
) -> Result<(Event, TeamMember), ServiceError> {
    let event = store
        .find_event_by_id(event_id)?
        .ok_or_else(|| ServiceError::not_found("Event"))?;
    let member = require_member(store, user_id, &event.team_id)?;
    Ok((event, member))
}

// Organizer of the event, or admin and above in its team
pub fn can_manage_event(event: &Event, member: &TeamMember) -> bool {
    event.organizer_id == member.user_id || member.role >= TeamRole::Admin
}

pub fn require_thread_member(
    store: &Store,
    user_id: &str,
    thread_id: &str,
) -> Result<(Thread, TeamMember), ServiceError> {
    let thread = store
        .find_thread_by_id(thread_id)?
        .ok_or_else(|| ServiceError::not_found("Thread"))?;
    let member = require_member(store, user_id, &thread.team_id)?;
    Ok((thread, member))
}

/// The caller's current team: the stored `current_team_id` while the caller is
/// still a member, otherwise the earliest team they joined.
pub fn resolve_current_team(store: &Store, user: &User) -> Result<Option<(Team, TeamMember)>, ServiceError> {
    if let Some(team_id) = &user.current_team_id {
        if let Some(member) = store.find_team_member(&user.id, team_id)? {
            if let Some(team) = store.find_team_by_id(team_id)? {
                return Ok(Some((team, member)));
            }
        }
    }

    for member in store.get_memberships_for_user(&user.id)? {
        if let Some(team) = store.find_team_by_id(&member.team_id)? {
            return Ok(Some((team, member)));
        }
    }

    Ok(None)
}
