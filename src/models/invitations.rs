// src/models/invitations.rs
use crate::models::TeamRole;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

// Stored invitation. Only the SHA-256 digest of the token is persisted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamInvitation {
    pub id: String,
    pub team_id: String,
    pub email: String,
    pub role: TeamRole,
    pub token_hash: String,
    pub invited_by: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: TeamRole,
}

// Invitation enriched with team and inviter names
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvitationDetails {
    pub id: String,
    pub team_id: String,
    pub team_name: Option<String>,
    pub email: String,
    pub role: TeamRole,
    pub invited_by: String,
    pub invited_by_name: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// Returned once, when the invitation (or a fresh token) is issued
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssuedInvitation {
    #[serde(flatten)]
    pub invitation: InvitationDetails,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvitationPreview {
    pub team_name: String,
    pub team_slug: String,
    pub email: String,
    pub role: TeamRole,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub is_expired: bool,
}

impl TeamInvitation {
    // Create a pending invitation and return it with its plaintext token
    pub fn new(
        team_id: String,
        email: String,
        invited_by: String,
        role: TeamRole,
        ttl: Duration,
    ) -> (Self, String) {
        let now = Utc::now();
        let token = generate_token();

        let invitation = Self {
            id: Uuid::new_v4().to_string(),
            team_id,
            email,
            role,
            token_hash: hash_token(&token),
            invited_by,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            accepted_at: None,
            accepted_by: None,
        };

        (invitation, token)
    }

    // Replace the token and push the expiry out again
    pub fn reissue(&mut self, ttl: Duration) -> String {
        let token = generate_token();
        self.token_hash = hash_token(&token);
        self.expires_at = Utc::now() + ttl;
        token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // Pending and still within its validity window
    pub fn is_live(&self) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired()
    }
}

// 256 bits of randomness from two v4 UUIDs
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_invitation_stores_only_the_token_digest() {
        let (invitation, token) = TeamInvitation::new(
            "team".to_string(),
            "guest@example.com".to_string(),
            "inviter".to_string(),
            TeamRole::Member,
            Duration::days(7),
        );

        assert_eq!(token.len(), 64);
        assert_ne!(invitation.token_hash, token);
        assert_eq!(invitation.token_hash, hash_token(&token));
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert!(invitation.is_live());
    }

    #[test]
    fn expiry_is_evaluated_against_the_given_instant() {
        let (invitation, _) = TeamInvitation::new(
            "team".to_string(),
            "guest@example.com".to_string(),
            "inviter".to_string(),
            TeamRole::Admin,
            Duration::hours(1),
        );

        assert!(!invitation.is_expired_at(Utc::now()));
        assert!(invitation.is_expired_at(Utc::now() + Duration::hours(2)));
    }

    #[test]
    fn reissue_rotates_the_token() {
        let (mut invitation, first) = TeamInvitation::new(
            "team".to_string(),
            "guest@example.com".to_string(),
            "inviter".to_string(),
            TeamRole::Member,
            Duration::days(1),
        );
        let second = invitation.reissue(Duration::days(3));

        assert_ne!(first, second);
        assert_eq!(invitation.token_hash, hash_token(&second));
        assert!(invitation.expires_at > Utc::now() + Duration::days(2));
    }
}
