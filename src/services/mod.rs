// src/services/mod.rs
pub mod access;
pub mod event_service;
pub mod invitation_service;
pub mod notification_service;
pub mod registration_service;
pub mod team_service;
pub mod thread_service;
pub mod user_service;
