// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityAction {
    Created,
    Updated,
    BulkUpdate,
}

// Uma linha do histórico de uma tarefa ou lead. O log só cresce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    /// Quem fez
    pub by: Uuid,
    pub action: ActivityAction,
    #[schema(example = "status: todo → done")]
    pub summary: String,
}

impl ActivityEntry {
    pub fn new(by: Uuid, action: ActivityAction, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            by,
            action,
            summary: summary.into(),
        }
    }
}

/// Junta as mudanças de um update num resumo legível.
pub fn summarize(changes: &[String], fallback: &str) -> String {
    if changes.is_empty() {
        fallback.to_string()
    } else {
        changes.join("; ")
    }
}
