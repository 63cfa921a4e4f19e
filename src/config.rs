// src/config.rs
use log::warn;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_JWT_SECRET: &str = "convene_development_secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub storage_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub invitation_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub app_base_url: String,
    pub cors_origin: Option<String>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid value for {}: {:?}", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9090".to_string(),
            storage_dir: PathBuf::from("./storage"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            invitation_ttl_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            app_base_url: "http://localhost:3000".to_string(),
            cors_origin: None,
        }
    }
}

impl AppConfig {
    // Build configuration from the environment (after .env has been loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("⚠️ JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            jwt_secret,
            token_ttl_days: parse_var("TOKEN_TTL_DAYS", defaults.token_ttl_days)?,
            invitation_ttl_days: parse_var("INVITATION_TTL_DAYS", defaults.invitation_ttl_days)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            app_base_url: env::var("APP_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.app_base_url),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|origin| !origin.is_empty()),
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError { key, value }),
        Err(_) => Ok(default),
    }
}
