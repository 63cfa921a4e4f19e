// src/services/user_service.rs
use crate::config::AppConfig;
use crate::models::{LoginResponse, ServiceError, UpdateProfileRequest, User, UserCredentials, UserProfile};
use crate::services::access::require_user;
use crate::utils::validation::{normalize_email, optional_text};
use crate::utils::{jwt, password, Store};
use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 1000;

pub fn register(store: &Store, config: &AppConfig, credentials: UserCredentials) -> Result<UserProfile, ServiceError> {
    let email = normalize_email(&credentials.email)?;
    if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    let name = checked_length("Name", optional_text(credentials.name), MAX_NAME_LENGTH)?;

    // Hash before taking the lock, bcrypt is slow
    let password_hash = password::hash_password(&credentials.password, config.bcrypt_cost)?;

    let tx = store.transaction()?;
    if store.find_user_by_email(&email)?.is_some() {
        error!("❌ Email already registered: {}", email);
        return Err(ServiceError::Conflict("Email already registered".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        name,
        bio: None,
        image_storage_id: None,
        current_team_id: None,
        created_at: Utc::now(),
    };
    store.save_user(&user)?;
    tx.commit();

    info!("✅ User registered successfully: {}", user.id);
    Ok(UserProfile::from(&user))
}

pub fn login(store: &Store, config: &AppConfig, credentials: &UserCredentials) -> Result<LoginResponse, ServiceError> {
    let user = match store.find_user_by_email(&credentials.email)? {
        Some(user) => user,
        None => {
            error!("❌ User not found: {}", credentials.email);
            return Err(ServiceError::Unauthorized);
        }
    };

    if !password::verify_password(&credentials.password, &user.password_hash)? {
        error!("❌ Invalid password for user: {}", user.id);
        return Err(ServiceError::Unauthorized);
    }

    let token = jwt::generate_token(&user, &config.jwt_secret, config.token_ttl_days)?;

    info!("✅ User logged in successfully: {}", user.id);
    Ok(LoginResponse {
        token,
        user_id: user.id,
        email: user.email,
    })
}

pub fn me(store: &Store, user_id: &str) -> Result<UserProfile, ServiceError> {
    let user = require_user(store, user_id)?;
    Ok(UserProfile::from(&user))
}

// Only ever touches the caller's own row
pub fn update_profile(store: &Store, user_id: &str, request: UpdateProfileRequest) -> Result<UserProfile, ServiceError> {
    let tx = store.transaction()?;
    let mut user = require_user(store, user_id)?;

    if let Some(name) = request.name {
        user.name = checked_length("Name", optional_text(Some(name)), MAX_NAME_LENGTH)?;
    }
    if let Some(bio) = request.bio {
        user.bio = checked_length("Bio", optional_text(Some(bio)), MAX_BIO_LENGTH)?;
    }
    if let Some(image) = request.image_storage_id {
        user.image_storage_id = optional_text(Some(image));
    }

    store.save_user(&user)?;
    tx.commit();
    info!("✅ Profile updated for user: {}", user.id);
    Ok(UserProfile::from(&user))
}

// Profiles are visible to yourself and to people you share a team with
pub fn get_user(store: &Store, user_id: &str, target_user_id: &str) -> Result<UserProfile, ServiceError> {
    require_user(store, user_id)?;
    let target = store
        .find_user_by_id(target_user_id)?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    if user_id != target_user_id {
        let shares_team = store
            .get_memberships_for_user(user_id)?
            .iter()
            .map(|membership| store.user_has_team_access(target_user_id, &membership.team_id))
            .collect::<Result<Vec<bool>, ServiceError>>()?
            .into_iter()
            .any(|shared| shared);

        if !shares_team {
            error!("❌ User: {} shares no team with user: {}", user_id, target_user_id);
            return Err(ServiceError::Forbidden);
        }
    }

    let mut profile = UserProfile::from(&target);
    if user_id != target_user_id {
        profile.current_team_id = None;
    }
    Ok(profile)
}

fn checked_length(field: &str, value: Option<String>, max_chars: usize) -> Result<Option<String>, ServiceError> {
    match value {
        Some(v) if v.chars().count() > max_chars => Err(ServiceError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_chars
        ))),
        other => Ok(other),
    }
}
