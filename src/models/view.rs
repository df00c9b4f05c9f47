// src/models/view.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::fields::{empty_string_as_none, not_blank};

// Preset de filtros/ordenação salvo por um usuário
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "Minhas falhas")]
    pub name: String,
    /// Tela a que o preset pertence (`tasks`, `leads`, ...)
    #[schema(example = "tasks")]
    pub page: String,
    /// Guardado como veio do cliente
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"status": "failed", "sortBy": "dueDate"}))]
    pub filters: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateViewPayload {
    #[validate(
        required(message = "Name required"),
        custom(function = "not_blank", message = "Name required")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "Page required"),
        custom(function = "not_blank", message = "Page required")
    )]
    pub page: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: serde_json::Value,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<String>,
}
