// src/db.rs

pub mod lead_repo;
pub mod notification_repo;
pub mod seed;
pub mod store;
pub mod task_repo;
pub mod team_repo;
pub mod user_repo;
pub mod view_repo;

pub use store::{Database, DocumentBackend, JsonFileBackend, MemoryBackend, Store};
