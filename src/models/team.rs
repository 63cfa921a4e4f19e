use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub owner_id: String,
    pub description: Option<String>,
    pub logo_storage_id: Option<String>,
    pub primary_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permission level within a team. Variants are declared in ascending order so
/// `Ord` gives owner > admin > member.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[display(fmt = "member")]
    Member = 0,
    #[display(fmt = "admin")]
    Admin = 1,
    #[display(fmt = "owner")]
    Owner = 2,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_storage_id: Option<String>,
    pub primary_color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateRoleRequest {
    pub role: TeamRole,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: String,
}

// A team as seen by one of its members
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamWithRole {
    #[serde(flatten)]
    pub team: Team,
    pub role: TeamRole,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemberWithProfile {
    #[serde(flatten)]
    pub member: TeamMember,
    pub email: String,
    pub name: Option<String>,
    pub display_name: String,
}
