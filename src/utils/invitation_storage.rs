// src/utils/invitation_storage.rs
use crate::models::{InvitationStatus, ServiceError, TeamInvitation};
use crate::utils::store::{Store, Table};
use log::info;

impl Store {
    pub fn save_invitation(&self, invitation: &TeamInvitation) -> Result<(), ServiceError> {
        self.put(Table::TeamInvitations, &invitation.id, invitation)
    }

    pub fn find_invitation_by_id(&self, invitation_id: &str) -> Result<Option<TeamInvitation>, ServiceError> {
        self.get(Table::TeamInvitations, invitation_id)
    }

    pub fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<TeamInvitation>, ServiceError> {
        self.find_one(Table::TeamInvitations, |invitation: &TeamInvitation| {
            invitation.token_hash == token_hash
        })
    }

    pub fn get_invitations_for_team(&self, team_id: &str) -> Result<Vec<TeamInvitation>, ServiceError> {
        let mut invitations = self.find_all(Table::TeamInvitations, |invitation: &TeamInvitation| {
            invitation.team_id == team_id
        })?;
        invitations.sort_by_key(|invitation| invitation.created_at);
        Ok(invitations)
    }

    pub fn get_invitations_for_email(&self, email: &str) -> Result<Vec<TeamInvitation>, ServiceError> {
        let email = email.trim().to_lowercase();
        let mut invitations = self.find_all(Table::TeamInvitations, |invitation: &TeamInvitation| {
            invitation.email.to_lowercase() == email
        })?;
        invitations.sort_by_key(|invitation| invitation.created_at);
        Ok(invitations)
    }

    // Every row still marked pending for the pair, including ones past their expiry
    pub fn get_pending_invitations(&self, team_id: &str, email: &str) -> Result<Vec<TeamInvitation>, ServiceError> {
        let email = email.trim().to_lowercase();
        let mut invitations = self.find_all(Table::TeamInvitations, |invitation: &TeamInvitation| {
            invitation.team_id == team_id
                && invitation.status == InvitationStatus::Pending
                && invitation.email.to_lowercase() == email
        })?;
        invitations.sort_by_key(|invitation| invitation.created_at);
        Ok(invitations)
    }

    pub fn delete_invitation(&self, invitation_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::TeamInvitations, invitation_id)
    }

    pub fn delete_team_invitations(&self, team_id: &str) -> Result<usize, ServiceError> {
        let mut deleted_count = 0;
        for invitation in self.get_invitations_for_team(team_id)? {
            if self.delete_invitation(&invitation.id)? {
                deleted_count += 1;
            }
        }

        info!("✅ Deleted {} invitations for team: {}", deleted_count, team_id);
        Ok(deleted_count)
    }
}
