// src/models/dashboard.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{auth::UserProfile, fields::empty_string_as_none, lead::Lead, task::Task};

// Os cards do topo. Tudo já vem filtrado pelo papel de quem pediu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: usize,
    #[schema(example = json!({"todo": 3, "in-progress": 1, "done": 5, "failed": 1}))]
    pub tasks_by_status: BTreeMap<String, usize>,
    #[schema(example = json!({"low": 2, "medium": 6, "high": 2}))]
    pub tasks_by_priority: BTreeMap<String, usize>,
    /// Vencidas e não concluídas
    pub overdue_tasks: usize,
    /// Percentual inteiro de tarefas `done`
    pub completion_rate: u32,
    pub failed_tasks: usize,
    pub total_leads: usize,
    pub leads_by_stage: BTreeMap<String, usize>,
    pub converted_leads: usize,
    /// Percentual inteiro de leads `converted`
    pub conversion_rate: u32,
    pub total_users: usize,
    pub unread_notifications: usize,
}

/// Percentual arredondado; 0 quando não há base.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub q: Option<String>,
    /// Máximo por coleção (padrão 10)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub leads: Vec<Lead>,
    pub users: Vec<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_handles_empty_sets() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(4, 4), 100);
    }
}
