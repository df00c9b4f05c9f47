// src/handlers.rs

use serde::Serialize;
use utoipa::ToSchema;

pub mod auth;
pub mod dashboard;
pub mod leads;
pub mod notifications;
pub mod tasks;
pub mod teams;
pub mod users;
pub mod views;

// Resposta curta das rotas de remoção
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Deleted")]
    pub message: String,
}

impl MessageResponse {
    pub fn deleted() -> Self {
        Self { message: "Deleted".to_string() }
    }
}
