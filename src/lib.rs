// src/lib.rs
use crate::config::AppConfig;
use crate::services::notification_service::{LogMailer, Mailer};
use crate::utils::Store;
use std::sync::Arc;

pub mod config;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;


/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Opens the store under `config.storage_dir` and logs outgoing email.
    pub fn new(config: AppConfig) -> std::io::Result<Self> {
        Self::with_mailer(config, Arc::new(LogMailer))
    }

    pub fn with_mailer(config: AppConfig, mailer: Arc<dyn Mailer>) -> std::io::Result<Self> {
        let store = Store::open(&config.storage_dir)?;
        Ok(Self { store, config, mailer })
    }
}
