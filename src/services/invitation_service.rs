// src/services/invitation_service.rs
use crate::models::{
    hash_token, CreateInvitationRequest, InvitationDetails, InvitationPreview, InvitationStatus, IssuedInvitation,
    ServiceError, TeamInvitation, TeamMember, TeamRole, TeamWithRole,
};
use crate::services::access::{require_member, require_role, require_team, require_user};
use crate::utils::validation::normalize_email;
use crate::utils::Store;
use chrono::{Duration, Utc};
use log::{error, info};
use uuid::Uuid;

pub fn create_invitation(
    store: &Store,
    user_id: &str,
    team_id: &str,
    request: CreateInvitationRequest,
    ttl: Duration,
) -> Result<IssuedInvitation, ServiceError> {
    let email = normalize_email(&request.email)?;
    if request.role == TeamRole::Owner {
        return Err(ServiceError::bad_request("Invitations cannot grant ownership"));
    }

    let tx = store.transaction()?;
    let actor = require_role(store, user_id, team_id, TeamRole::Admin)?;
    if request.role > actor.role {
        error!("❌ User: {} cannot invite with role {}", user_id, request.role);
        return Err(ServiceError::Forbidden);
    }

    info!("📧 Creating invitation to team: {} for email: {}", team_id, email);

    if let Some(existing_user) = store.find_user_by_email(&email)? {
        if store.user_has_team_access(&existing_user.id, team_id)? {
            return Err(ServiceError::Conflict(
                "User is already a member of the team".to_string(),
            ));
        }
    }

    settle_pending(store, team_id, &email, None)?;

    let (invitation, token) = TeamInvitation::new(team_id.to_string(), email, user_id.to_string(), request.role, ttl);
    store.save_invitation(&invitation)?;
    tx.commit();

    info!("✅ Invitation created: {}", invitation.id);
    Ok(IssuedInvitation {
        invitation: enrich(store, &invitation)?,
        token,
    })
}

// Fresh token and expiry for an invitation that has not been accepted
pub fn resend_invitation(
    store: &Store,
    user_id: &str,
    invitation_id: &str,
    ttl: Duration,
) -> Result<IssuedInvitation, ServiceError> {
    let tx = store.transaction()?;
    let mut invitation = store
        .find_invitation_by_id(invitation_id)?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;
    require_role(store, user_id, &invitation.team_id, TeamRole::Admin)?;

    if invitation.status == InvitationStatus::Accepted {
        return Err(ServiceError::Conflict(
            "Invitation has already been accepted".to_string(),
        ));
    }
    settle_pending(store, &invitation.team_id, &invitation.email, Some(&invitation.id))?;

    let token = invitation.reissue(ttl);
    invitation.status = InvitationStatus::Pending;
    store.save_invitation(&invitation)?;
    tx.commit();

    info!("🔁 Invitation reissued: {}", invitation.id);
    Ok(IssuedInvitation {
        invitation: enrich(store, &invitation)?,
        token,
    })
}

pub fn list_team_invitations(
    store: &Store,
    user_id: &str,
    team_id: &str,
) -> Result<Vec<InvitationDetails>, ServiceError> {
    let tx = store.transaction()?;
    require_role(store, user_id, team_id, TeamRole::Admin)?;

    let mut invitations = Vec::new();
    for invitation in store.get_invitations_for_team(team_id)? {
        let invitation = expire_if_due(store, invitation)?;
        invitations.push(enrich(store, &invitation)?);
    }

    tx.commit();
    info!("✅ Found {} invitations for team", invitations.len());
    Ok(invitations)
}

// Live invitations addressed to the caller's email
pub fn list_my_invitations(store: &Store, user_id: &str) -> Result<Vec<InvitationDetails>, ServiceError> {
    let tx = store.transaction()?;
    let user = require_user(store, user_id)?;

    let mut invitations = Vec::new();
    for invitation in store.get_invitations_for_email(&user.email)? {
        let invitation = expire_if_due(store, invitation)?;
        if invitation.status == InvitationStatus::Pending {
            invitations.push(enrich(store, &invitation)?);
        }
    }

    tx.commit();
    info!("✅ Found {} invitations for user", invitations.len());
    Ok(invitations)
}

// Public lookup used by the invite landing page
pub fn preview_invitation(store: &Store, token: &str) -> Result<InvitationPreview, ServiceError> {
    let invitation = find_by_token(store, token)?;
    let team = require_team(store, &invitation.team_id)?;
    let is_expired = invitation.status == InvitationStatus::Expired
        || (invitation.status == InvitationStatus::Pending && invitation.is_expired());

    Ok(InvitationPreview {
        team_name: team.name,
        team_slug: team.slug,
        email: invitation.email,
        role: invitation.role,
        status: if is_expired { InvitationStatus::Expired } else { invitation.status },
        expires_at: invitation.expires_at,
        is_expired,
    })
}

pub fn accept_invitation(store: &Store, user_id: &str, token: &str) -> Result<TeamWithRole, ServiceError> {
    let tx = store.transaction()?;
    let mut user = require_user(store, user_id)?;
    let invitation = find_by_token(store, token)?;

    if invitation.email.to_lowercase() != user.email.to_lowercase() {
        error!("❌ Invitation {} is not for user: {}", invitation.id, user_id);
        return Err(ServiceError::Forbidden);
    }

    match invitation.status {
        InvitationStatus::Accepted => {
            return Err(ServiceError::Conflict(
                "Invitation has already been accepted".to_string(),
            ))
        }
        InvitationStatus::Expired => return Err(ServiceError::bad_request("Invitation has expired")),
        InvitationStatus::Pending => {}
    }

    if invitation.is_expired() {
        expire(store, invitation)?;
        tx.commit();
        return Err(ServiceError::bad_request("Invitation has expired"));
    }

    let team = require_team(store, &invitation.team_id)?;
    let member = match store.find_team_member(&user.id, &team.id)? {
        Some(existing) => existing,
        None => {
            let member = TeamMember {
                id: Uuid::new_v4().to_string(),
                team_id: team.id.clone(),
                user_id: user.id.clone(),
                role: invitation.role,
                joined_at: Utc::now(),
            };
            store.save_team_member(&member)?;
            member
        }
    };

    let mut accepted = invitation;
    accepted.status = InvitationStatus::Accepted;
    accepted.accepted_at = Some(Utc::now());
    accepted.accepted_by = Some(user.id.clone());
    store.save_invitation(&accepted)?;

    user.current_team_id = Some(team.id.clone());
    store.save_user(&user)?;

    tx.commit();
    info!("✅ User: {} joined team: {} as {}", user.id, team.id, member.role);
    Ok(TeamWithRole {
        team,
        role: member.role,
    })
}

pub fn decline_invitation(store: &Store, user_id: &str, token: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let user = require_user(store, user_id)?;
    let invitation = find_by_token(store, token)?;

    if invitation.email.to_lowercase() != user.email.to_lowercase() {
        return Err(ServiceError::Forbidden);
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(ServiceError::Conflict(
            "Only pending invitations can be declined".to_string(),
        ));
    }

    store.delete_invitation(&invitation.id)?;
    tx.commit();
    info!("🙅 Invitation declined: {}", invitation.id);
    Ok(())
}

// The inviter (while still a member) or any admin can withdraw an invitation
pub fn cancel_invitation(store: &Store, user_id: &str, invitation_id: &str) -> Result<(), ServiceError> {
    let tx = store.transaction()?;
    let invitation = store
        .find_invitation_by_id(invitation_id)?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;

    let actor = require_member(store, user_id, &invitation.team_id)?;
    let is_inviter = invitation.invited_by == user_id;
    if !is_inviter && actor.role < TeamRole::Admin {
        error!("❌ User does not have permission to delete this invitation");
        return Err(ServiceError::Forbidden);
    }

    store.delete_invitation(&invitation.id)?;
    tx.commit();
    info!("🗑️ Invitation cancelled: {}", invitation.id);
    Ok(())
}

/// Expire lapsed pending invitations for the (team, email) pair and refuse
/// when any pending one other than `except_id` is still live.
fn settle_pending(store: &Store, team_id: &str, email: &str, except_id: Option<&str>) -> Result<(), ServiceError> {
    for pending in store.get_pending_invitations(team_id, email)? {
        if Some(pending.id.as_str()) == except_id {
            continue;
        }
        if !pending.is_expired() {
            return Err(ServiceError::Conflict(
                "An invitation for this user to this team already exists".to_string(),
            ));
        }
        expire(store, pending)?;
    }
    Ok(())
}

fn find_by_token(store: &Store, token: &str) -> Result<TeamInvitation, ServiceError> {
    store
        .find_invitation_by_token_hash(&hash_token(token.trim()))?
        .ok_or_else(|| ServiceError::not_found("Invitation"))
}

fn expire(store: &Store, mut invitation: TeamInvitation) -> Result<TeamInvitation, ServiceError> {
    invitation.status = InvitationStatus::Expired;
    store.save_invitation(&invitation)?;
    info!("⌛ Invitation expired: {}", invitation.id);
    Ok(invitation)
}

// Expiry is checked lazily whenever an invitation is read
fn expire_if_due(store: &Store, invitation: TeamInvitation) -> Result<TeamInvitation, ServiceError> {
    if invitation.status == InvitationStatus::Pending && invitation.is_expired() {
        expire(store, invitation)
    } else {
        Ok(invitation)
    }
}

fn enrich(store: &Store, invitation: &TeamInvitation) -> Result<InvitationDetails, ServiceError> {
    let team_name = store.find_team_by_id(&invitation.team_id)?.map(|team| team.name);
    let invited_by_name = store
        .find_user_by_id(&invitation.invited_by)?
        .map(|user| user.display_name());

    Ok(InvitationDetails {
        id: invitation.id.clone(),
        team_id: invitation.team_id.clone(),
        team_name,
        email: invitation.email.clone(),
        role: invitation.role,
        invited_by: invitation.invited_by.clone(),
        invited_by_name,
        status: invitation.status,
        created_at: invitation.created_at,
        expires_at: invitation.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::services::team_service::test_support::{add_member, create_team_for};
    use crate::services::user_service::test_support::create_user;
    use crate::utils::store::test_support::temp_store;

    fn invite(store: &Store, inviter: &User, team_id: &str, email: &str, role: TeamRole) -> IssuedInvitation {
        create_invitation(
            store,
            &inviter.id,
            team_id,
            CreateInvitationRequest {
                email: email.to_string(),
                role,
            },
            Duration::days(7),
        )
        .expect("create invitation")
    }

    fn backdate(store: &Store, invitation_id: &str) {
        let mut stored = store.find_invitation_by_id(invitation_id).unwrap().unwrap();
        stored.expires_at = Utc::now() - Duration::minutes(1);
        store.save_invitation(&stored).unwrap();
    }

    #[test]
    fn accepting_an_invitation_adds_the_member() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let issued = invite(&store, &ada, &team.id, "Grace@Example.com", TeamRole::Admin);
        assert_eq!(issued.invitation.email, "grace@example.com");
        assert_eq!(issued.invitation.team_name.as_deref(), Some("Crew"));

        let joined = accept_invitation(&store, &grace.id, &issued.token).unwrap();
        assert_eq!(joined.team.id, team.id);
        assert_eq!(joined.role, TeamRole::Admin);

        let stored = store.find_invitation_by_id(&issued.invitation.id).unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
        assert_eq!(stored.accepted_by.as_deref(), Some(grace.id.as_str()));

        let grace = store.find_user_by_id(&grace.id).unwrap().unwrap();
        assert_eq!(grace.current_team_id.as_deref(), Some(team.id.as_str()));

        assert!(matches!(
            accept_invitation(&store, &grace.id, &issued.token),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn expired_invitations_cannot_be_accepted() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let issued = invite(&store, &ada, &team.id, "grace@example.com", TeamRole::Member);
        backdate(&store, &issued.invitation.id);

        assert!(matches!(
            accept_invitation(&store, &grace.id, &issued.token),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(!store.user_has_team_access(&grace.id, &team.id).unwrap());

        let stored = store.find_invitation_by_id(&issued.invitation.id).unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
        assert!(preview_invitation(&store, &issued.token).unwrap().is_expired);
    }

    #[test]
    fn invitations_are_bound_to_the_invited_email() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let mallory = create_user(&store, "mallory@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let issued = invite(&store, &ada, &team.id, "grace@example.com", TeamRole::Member);
        assert!(matches!(
            accept_invitation(&store, &mallory.id, &issued.token),
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            accept_invitation(&store, &mallory.id, "not-a-real-token"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn only_one_live_pending_invitation_per_email() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let first = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
        let duplicate = create_invitation(
            &store,
            &ada.id,
            &team.id,
            CreateInvitationRequest {
                email: "GUEST@example.com".to_string(),
                role: TeamRole::Member,
            },
            Duration::days(7),
        );
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        // Once the first one lapses a new invitation can be issued
        backdate(&store, &first.invitation.id);
        let second = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
        assert_ne!(first.invitation.id, second.invitation.id);

        let old = store.find_invitation_by_id(&first.invitation.id).unwrap().unwrap();
        assert_eq!(old.status, InvitationStatus::Expired);
    }

    #[test]
    fn members_cannot_invite_and_nobody_invites_owners() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let ken = create_user(&store, "ken@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        add_member(&store, &team.id, &ken.id, TeamRole::Member);

        let by_member = create_invitation(
            &store,
            &ken.id,
            &team.id,
            CreateInvitationRequest {
                email: "guest@example.com".to_string(),
                role: TeamRole::Member,
            },
            Duration::days(7),
        );
        assert!(matches!(by_member, Err(ServiceError::Forbidden)));

        let as_owner = create_invitation(
            &store,
            &ada.id,
            &team.id,
            CreateInvitationRequest {
                email: "guest@example.com".to_string(),
                role: TeamRole::Owner,
            },
            Duration::days(7),
        );
        assert!(matches!(as_owner, Err(ServiceError::BadRequest(_))));

        let existing_member = create_invitation(
            &store,
            &ada.id,
            &team.id,
            CreateInvitationRequest {
                email: "ken@example.com".to_string(),
                role: TeamRole::Member,
            },
            Duration::days(7),
        );
        assert!(matches!(existing_member, Err(ServiceError::Conflict(_))));

        invite(&store, &ada, &team.id, &grace.email, TeamRole::Member);
    }

    #[test]
    fn listing_marks_lapsed_invitations_expired() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let issued = invite(&store, &ada, &team.id, "grace@example.com", TeamRole::Member);

        assert_eq!(list_my_invitations(&store, &grace.id).unwrap().len(), 1);

        backdate(&store, &issued.invitation.id);
        assert!(list_my_invitations(&store, &grace.id).unwrap().is_empty());

        let team_view = list_team_invitations(&store, &ada.id, &team.id).unwrap();
        assert_eq!(team_view.len(), 1);
        assert_eq!(team_view[0].status, InvitationStatus::Expired);
    }

    #[test]
    fn resending_revives_an_expired_invitation_with_a_new_token() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        let issued = invite(&store, &ada, &team.id, "grace@example.com", TeamRole::Member);
        backdate(&store, &issued.invitation.id);
        list_team_invitations(&store, &ada.id, &team.id).unwrap();

        let resent = resend_invitation(&store, &ada.id, &issued.invitation.id, Duration::days(7)).unwrap();
        assert_ne!(resent.token, issued.token);
        assert_eq!(resent.invitation.status, InvitationStatus::Pending);

        assert!(matches!(
            accept_invitation(&store, &grace.id, &issued.token),
            Err(ServiceError::NotFound(_))
        ));
        accept_invitation(&store, &grace.id, &resent.token).unwrap();
    }

    #[test]
    fn cancel_and_decline_remove_the_invitation() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let grace = create_user(&store, "grace@example.com");
        let ken = create_user(&store, "ken@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");
        add_member(&store, &team.id, &ken.id, TeamRole::Member);

        let first = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
        assert!(matches!(
            cancel_invitation(&store, &ken.id, &first.invitation.id),
            Err(ServiceError::Forbidden)
        ));
        cancel_invitation(&store, &ada.id, &first.invitation.id).unwrap();
        assert!(store.find_invitation_by_id(&first.invitation.id).unwrap().is_none());

        let second = invite(&store, &ada, &team.id, "grace@example.com", TeamRole::Member);
        decline_invitation(&store, &grace.id, &second.token).unwrap();
        assert!(store.find_invitation_by_id(&second.invitation.id).unwrap().is_none());
    }

    fn live_invitations(store: &Store, team_id: &str, email: &str) -> usize {
        store
            .get_invitations_for_team(team_id)
            .unwrap()
            .iter()
            .filter(|invitation| invitation.email == email && invitation.is_live())
            .count()
    }

    #[test]
    fn resend_and_create_never_leave_two_live_invitations() {
        for _ in 0..5 {
            let store = temp_store();
            let ada = create_user(&store, "ada@example.com");
            let team = create_team_for(&store, &ada.id, "Crew");

            let a = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
            backdate(&store, &a.invitation.id);
            let b = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
            backdate(&store, &b.invitation.id);

            // B is still marked pending but has lapsed; reviving A expires it
            resend_invitation(&store, &ada.id, &a.invitation.id, Duration::days(7)).unwrap();
            let b_after = store.find_invitation_by_id(&b.invitation.id).unwrap().unwrap();
            assert_eq!(b_after.status, InvitationStatus::Expired);

            let c = create_invitation(
                &store,
                &ada.id,
                &team.id,
                CreateInvitationRequest {
                    email: "guest@example.com".to_string(),
                    role: TeamRole::Member,
                },
                Duration::days(7),
            );
            assert!(matches!(c, Err(ServiceError::Conflict(_))));
            assert_eq!(live_invitations(&store, &team.id, "guest@example.com"), 1);
        }
    }

    #[test]
    fn resend_is_refused_while_another_invitation_is_live() {
        let store = temp_store();
        let ada = create_user(&store, "ada@example.com");
        let team = create_team_for(&store, &ada.id, "Crew");

        let a = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);
        backdate(&store, &a.invitation.id);
        let b = invite(&store, &ada, &team.id, "guest@example.com", TeamRole::Member);

        assert!(matches!(
            resend_invitation(&store, &ada.id, &a.invitation.id, Duration::days(7)),
            Err(ServiceError::Conflict(_))
        ));
        let a_after = store.find_invitation_by_id(&a.invitation.id).unwrap().unwrap();
        assert_eq!(a_after.status, InvitationStatus::Expired);
        assert_eq!(live_invitations(&store, &team.id, "guest@example.com"), 1);

        // Resending the live one just refreshes it
        let refreshed = resend_invitation(&store, &ada.id, &b.invitation.id, Duration::days(7)).unwrap();
        assert_ne!(refreshed.token, b.token);
        assert_eq!(live_invitations(&store, &team.id, "guest@example.com"), 1);
    }
}
