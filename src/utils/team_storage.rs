// src/utils/team_storage.rs
use crate::models::{ServiceError, Team, TeamMember, TeamRole};
use crate::utils::store::{Store, Table};

impl Store {
    pub fn save_team(&self, team: &Team) -> Result<(), ServiceError> {
        self.put(Table::Teams, &team.id, team)
    }

    pub fn find_team_by_id(&self, team_id: &str) -> Result<Option<Team>, ServiceError> {
        self.get(Table::Teams, team_id)
    }

    pub fn find_team_by_slug(&self, slug: &str) -> Result<Option<Team>, ServiceError> {
        self.find_one(Table::Teams, |team: &Team| team.slug == slug)
    }

    pub fn team_slug_exists(&self, slug: &str) -> Result<bool, ServiceError> {
        Ok(self.find_team_by_slug(slug)?.is_some())
    }

    pub fn delete_team(&self, team_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::Teams, team_id)
    }

    pub fn save_team_member(&self, member: &TeamMember) -> Result<(), ServiceError> {
        self.put(Table::TeamMembers, &member.id, member)
    }

    pub fn find_team_member(&self, user_id: &str, team_id: &str) -> Result<Option<TeamMember>, ServiceError> {
        self.find_one(Table::TeamMembers, |member: &TeamMember| {
            member.user_id == user_id && member.team_id == team_id
        })
    }

    // Members ordered by join time
    pub fn get_team_members(&self, team_id: &str) -> Result<Vec<TeamMember>, ServiceError> {
        let mut members = self.find_all(Table::TeamMembers, |member: &TeamMember| member.team_id == team_id)?;
        members.sort_by_key(|member| member.joined_at);
        Ok(members)
    }

    // Memberships of a user ordered by join time
    pub fn get_memberships_for_user(&self, user_id: &str) -> Result<Vec<TeamMember>, ServiceError> {
        let mut memberships = self.find_all(Table::TeamMembers, |member: &TeamMember| member.user_id == user_id)?;
        memberships.sort_by_key(|member| member.joined_at);
        Ok(memberships)
    }

    pub fn get_user_role_in_team(&self, user_id: &str, team_id: &str) -> Result<Option<TeamRole>, ServiceError> {
        Ok(self.find_team_member(user_id, team_id)?.map(|member| member.role))
    }

    pub fn user_has_team_access(&self, user_id: &str, team_id: &str) -> Result<bool, ServiceError> {
        Ok(self.find_team_member(user_id, team_id)?.is_some())
    }

    pub fn user_has_team_role(&self, user_id: &str, team_id: &str, min_role: TeamRole) -> Result<bool, ServiceError> {
        Ok(self
            .get_user_role_in_team(user_id, team_id)?
            .map_or(false, |role| role >= min_role))
    }

    pub fn remove_team_member(&self, member_id: &str) -> Result<bool, ServiceError> {
        self.delete(Table::TeamMembers, member_id)
    }

    pub fn delete_team_members(&self, team_id: &str) -> Result<usize, ServiceError> {
        let members = self.get_team_members(team_id)?;
        let mut deleted = 0;
        for member in members {
            if self.remove_team_member(&member.id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
