// src/models/team.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::fields::not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    #[schema(example = "Comercial Sul")]
    pub name: String,
    /// IDs de usuários. Sem integridade referencial.
    #[serde(default)]
    pub members: Vec<Uuid>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamPayload {
    #[validate(
        required(message = "Name required"),
        custom(function = "not_blank", message = "Name required")
    )]
    #[schema(example = "Comercial Sul")]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTeamPayload {
    #[validate(custom(function = "not_blank", message = "Name required"))]
    pub name: Option<String>,
    pub members: Option<Vec<Uuid>>,
}

/// Remove ids repetidos mantendo a ordem de chegada.
pub fn unique_members(members: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    members.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_keep_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_members(vec![a, b, a]), vec![a, b]);
    }
}
