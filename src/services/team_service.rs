// src/services/team_service.rs
use crate::models::{
    CreateTeamRequest, MemberWithProfile, ServiceError, Team, TeamMember, TeamRole, TeamWithRole,
    UpdateTeamRequest,
};
use crate::services::access::{require_member, require_role, require_team, require_user, resolve_current_team};
use crate::utils::slug::unique_slug;
use crate::utils::validation::{optional_text, required_text, validate_color};
use crate::utils::Store;
use chrono::Utc;
use log::{error, info, warn};
use uuid::Uuid;

const MAX_TEAM_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

pub fn create_team(store: &Store, user_id: &str, request: CreateTeamRequest) -> Result<TeamWithRole, ServiceError> {
    let name = required_text("Team name", &request.name, MAX_TEAM_NAME_LENGTH)?;
    let description = optional_text(request.description);
    check_description(&description)?;

    let tx = store.transaction()?;
    let mut user = require_user(store, user_id)?;

    info!("📝 Creating new team: {} for user: {}", name, user_id);

    let slug = unique_slug(&name, |candidate| store.team_slug_exists(candidate))?;
    let now = Utc::now();
    let team = Team {
        id: Uuid::new_v4().to_string(),
        name,
        slug,
        owner_id: user.id.clone(),
        description,
        logo_storage_id: None,
        primary_color: None,
        created_at: now,
        updated_at: now,
    };
    store.save_team(&team)?;

    let owner = TeamMember {
        id: Uuid::new_v4().to_string(),
        team_id: team.id.clone(),
        user_id: user.id.clone(),
        role: TeamRole::Owner,
        joined_at: now,
    };
    store.save_team_member(&owner)?;

    user.current_team_id = Some(team.id.clone());
    store.save_user(&user)?;

    tx.commit();
    info!("✅ Team created successfully: {} ({})", team.id, team.slug);
    Ok(TeamWithRole {
        team,
        role: TeamRole::Owner,
    })
}

pub fn list_my_teams(store: &Store, user_id: &str) -> Result<Vec<TeamWithRole>, ServiceError> {
    require_user(store, user_id)?;

    let mut teams = Vec::new();
    for membership in store.get_memberships_for_user(user_id)? {
        match store.find_team_by_id(&membership.team_id)? {
            Some(team) => teams.push(TeamWithRole {
                team,
                role: membership.role,
            }),
            None => warn!("Membership {} points at a missing team", membership.id),
        }
    }

    info!("✅ Found {} teams for user: {}", teams.len(), user_id);
    Ok(teams)
}

pub fn get_team(store: &Store, user_id: &str, team_id: &str) -> Result<TeamWithRole, ServiceError> {
    let member = require_member(store, user_id, team_id)?;
    let team = require_team(store, team_id)?;
    Ok(TeamWithRole {
        team,
        role: member.role,
    })
}

pub fn get_team_by_slug(store: &Store, user_id: &str, slug: &str) -> Result<TeamWithRole, ServiceError> {
    let team = store
        .find_team_by_slug(slug)?
        .ok_or_else(|| ServiceError::not_found("Team"))?;
    get_team(store, user_id, &team.id)
}

pub fn get_current_team(store: &Store, user_id: &str) -> Result<Option<TeamWithRole>, ServiceError> {
    let user = require_user(store, user_id)?;
    Ok(resolve_current_team(store, &user)?.map(|(team, member)| TeamWithRole {
        team,
        role: member.role,
    }))
}

pub fn switch_team(store: &Store, user_id: &str, team_id: &str) -> Result<TeamWithRole, ServiceError> {
    let tx = store.transaction()?;
    let member = require_member(store, user_id, team_id)?;
    let team = require_team(store, team_id)?;

    let mut user = require_user(store, user_id)?;
    user.current_team_id = Some(team.id.clone());
    store.save_user(&user)?;

    tx.commit();
    info!("🔄 Team activated: {} for user: {}", team_id, user_id);
    Ok(TeamWithRole {
        team,
        role: member.role,
    })
}

pub fn update_team(
    store: &Store,
    user_id: &str,
    team_id: &str,
    request: UpdateTeamRequest,
) -> Result<Team, ServiceError> {
    let tx = store.transaction()?;
    require_role(store, user_id, team_id, TeamRole::Admin)?;
    let mut team = require_team(store, team_id)?;

    if let Some(name) = request.name {
        // Slug stays put so shared links keep working
        team.name = required_text("Team name", &name, MAX_TEAM_NAME_LENGTH)?;
    }
    if let Some(description) = request.description {
        team.description = optional_text(Some(description));
        check_description(&team.description)?;
    }
    if let Some(logo) = request.logo_storage_id {
        team.logo_storage_id = optional_text(Some(logo));
    }
    if let Some(color) = request.primary_color {
        team.primary_color = match optional_text(Some(color)) {
            Some(color) => Some(validate_color(&color)?),
            None => None,
        };
    }

    team.updated_at = Utc::now();
    store.save_team(&team)?;

    tx.commit();
    info!("✅ Team updated: {}", team.id);
    Ok(team)
}

pub fn delete_team(store: &Store, user_id: &str, team_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let team = require_team(store, team_id)?;

    if team.owner_id != user_id {
        error!("❌ Only the team owner can delete the team");
        return Err(ServiceError::Forbidden);
    }

    info!("🗑️ Deleting team: {}", team_id);

    for event in store.get_events_for_team(team_id)? {
        store.delete_event_cascade(&event.id)?;
    }
    for thread in store.get_threads_for_team(team_id)? {
        store.delete_thread_cascade(&thread.id)?;
    }
    store.delete_team_invitations(team_id)?;
    store.delete_team_members(team_id)?;

    for mut user in store.find_users_with_current_team(team_id)? {
        user.current_team_id = None;
        store.save_user(&user)?;
    }

    store.delete_team(team_id)?;

    tx.commit();
    info!("✅ Team deleted: {}", team_id);
    Ok(())
}

pub fn list_members(store: &Store, user_id: &str, team_id: &str) -> Result<Vec<MemberWithProfile>, ServiceError> {
    require_member(store, user_id, team_id)?;

    let mut members = Vec::new();
    for member in store.get_team_members(team_id)? {
        match store.find_user_by_id(&member.user_id)? {
            Some(user) => members.push(MemberWithProfile {
                email: user.email.clone(),
                name: user.name.clone(),
                display_name: user.display_name(),
                member,
            }),
            None => warn!("Team member {} has no user row", member.user_id),
        }
    }

    info!("✅ Found {} team members", members.len());
    Ok(members)
}

/// Change a member's role. The actor must strictly outrank both the target's
/// current role and the requested one; ownership only moves through
/// [`transfer_ownership`].
pub fn update_member_role(
    store: &Store,
    user_id: &str,
    team_id: &str,
    target_user_id: &str,
    role: TeamRole,
) -> Result<TeamMember, ServiceError> {
    if role == TeamRole::Owner {
        return Err(ServiceError::bad_request(
            "Ownership can only be transferred, not assigned",
        ));
    }

    let tx = store.transaction()?;
    let actor = require_member(store, user_id, team_id)?;
    let mut target = store
        .find_team_member(target_user_id, team_id)?
        .ok_or_else(|| ServiceError::not_found("Team member"))?;

    if target.role == TeamRole::Owner {
        return Err(ServiceError::bad_request("Cannot change the team owner's role"));
    }
    if actor.role <= target.role || actor.role <= role {
        error!(
            "❌ User: {} ({}) cannot set {} to {} in team: {}",
            user_id, actor.role, target_user_id, role, team_id
        );
        return Err(ServiceError::Forbidden);
    }

    target.role = role;
    store.save_team_member(&target)?;

    tx.commit();
    info!("✅ User: {} now has role {} in team: {}", target_user_id, role, team_id);
    Ok(target)
}

pub fn remove_member(store: &Store, user_id: &str, team_id: &str, target_user_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let actor = require_member(store, user_id, team_id)?;
    let target = store
        .find_team_member(target_user_id, team_id)?
        .ok_or_else(|| ServiceError::not_found("Team member"))?;

    if target.role == TeamRole::Owner {
        return Err(ServiceError::bad_request(
            "Cannot remove the team owner from the team",
        ));
    }
    if actor.role < TeamRole::Admin || actor.role <= target.role {
        error!("❌ User: {} cannot remove {} from team: {}", user_id, target_user_id, team_id);
        return Err(ServiceError::Forbidden);
    }

    detach_member(store, &target)?;

    tx.commit();
    info!("🗑️ Removed user: {} from team: {}", target_user_id, team_id);
    Ok(())
}

pub fn leave_team(store: &Store, user_id: &str, team_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let member = require_member(store, user_id, team_id)?;

    if member.role == TeamRole::Owner {
        return Err(ServiceError::bad_request(
            "The team owner cannot leave; transfer ownership or delete the team",
        ));
    }

    detach_member(store, &member)?;

    tx.commit();
    info!("👋 User: {} left team: {}", user_id, team_id);
    Ok(())
}

pub fn transfer_ownership(
    store: &Store,
    user_id: &str,
    team_id: &str,
    new_owner_id: &str,
) -> Result<Team, ServiceError> {
    let tx = store.transaction()?;
    let mut team = require_team(store, team_id)?;
    let mut current_owner = require_role(store, user_id, team_id, TeamRole::Owner)?;

    if new_owner_id == user_id {
        return Err(ServiceError::bad_request("You already own this team"));
    }

    let mut new_owner = store
        .find_team_member(new_owner_id, team_id)?
        .ok_or_else(|| ServiceError::bad_request("New owner must be a member of the team"))?;

    current_owner.role = TeamRole::Admin;
    new_owner.role = TeamRole::Owner;
    team.owner_id = new_owner.user_id.clone();
    team.updated_at = Utc::now();

    store.save_team_member(&current_owner)?;
    store.save_team_member(&new_owner)?;
    store.save_team(&team)?;

    tx.commit();
    info!("👑 Team: {} transferred from {} to {}", team_id, user_id, new_owner_id);
    Ok(team)
}

// Delete a membership and clear the user's current team if it pointed here
fn detach_member(store: &Store, member: &TeamMember) -> Result<(), ServiceError> {
    store.remove_team_member(&member.id)?;

    if let Some(mut user) = store.find_user_by_id(&member.user_id)? {
        if user.current_team_id.as_deref() == Some(member.team_id.as_str()) {
            user.current_team_id = None;
            store.save_user(&user)?;
        }
    }
    Ok(())
}

fn check_description(description: &Option<String>) -> Result<(), ServiceError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Err(ServiceError::BadRequest(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn create_team_for(store: &Store, owner_id: &str, name: &str) -> Team {
        create_team(
            store,
            owner_id,
            CreateTeamRequest {
                name: name.to_string(),
                description: None,
            },
        )
        .expect("create team")
        .team
    }

    // Insert a membership directly, bypassing invitations
    pub fn add_member(store: &Store, team_id: &str, user_id: &str, role: TeamRole) -> TeamMember {
        let member = TeamMember {
            id: Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
        };
        store.save_team_member(&member).expect("save member");
        member
    }
}
