// src/services.rs

pub mod auth;
pub mod dashboard_service;
pub mod lead_service;
pub mod notification_service;
pub mod search_service;
pub mod task_service;
pub mod team_service;
pub mod upload_service;
pub mod user_service;
pub mod view_service;
