// src/utils/user_storage.rs
use crate::models::{ServiceError, User};
use crate::utils::store::{Store, Table};

impl Store {
    pub fn save_user(&self, user: &User) -> Result<(), ServiceError> {
        self.put(Table::Users, &user.id, user)
    }

    pub fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.get(Table::Users, id)
    }

    // Emails are compared case-insensitively
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let email = email.trim().to_lowercase();
        self.find_one(Table::Users, |user: &User| user.email.to_lowercase() == email)
    }

    pub fn find_users_with_current_team(&self, team_id: &str) -> Result<Vec<User>, ServiceError> {
        self.find_all(Table::Users, |user: &User| {
            user.current_team_id.as_deref() == Some(team_id)
        })
    }
}
