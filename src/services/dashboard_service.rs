// src/services/dashboard_service.rs

use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    common::query::parse_timestamp,
    db::{Database, Store},
    middleware::rbac::{can, scope, Action},
    models::{
        auth::CurrentUser,
        dashboard::{percent, DashboardSummary},
        lead::{Lead, LeadStage},
        task::{Task, TaskPriority, TaskStatus},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    store: Store,
}

impl DashboardService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get_summary(&self, caller: &CurrentUser) -> DashboardSummary {
        let now = Utc::now().timestamp_millis();
        self.store.read(|db| summarize(db, caller, now)).await
    }
}

/// Números do painel no instante `now` (millis), respeitando o escopo do papel.
pub fn summarize(db: &Database, caller: &CurrentUser, now: i64) -> DashboardSummary {
    let scope = scope(caller);
    let tasks: Vec<&Task> = db.tasks.iter().filter(|t| scope.admits(t.assigned_to)).collect();
    let leads: Vec<&Lead> = db.leads.iter().filter(|l| scope.admits(l.owner)).collect();

    // Todas as chaves aparecem, mesmo zeradas.
    let mut tasks_by_status: BTreeMap<String, usize> =
        TaskStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
    let mut tasks_by_priority: BTreeMap<String, usize> =
        TaskPriority::ALL.iter().map(|p| (p.as_str().to_string(), 0)).collect();
    let mut leads_by_stage: BTreeMap<String, usize> =
        LeadStage::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();

    let mut overdue_tasks = 0;
    for task in &tasks {
        *tasks_by_status.entry(task.status.as_str().to_string()).or_default() += 1;
        *tasks_by_priority.entry(task.priority.as_str().to_string()).or_default() += 1;

        let due = task.due_date.as_deref().and_then(parse_timestamp);
        if task.status != TaskStatus::Done && due.is_some_and(|d| d < now) {
            overdue_tasks += 1;
        }
    }
    for lead in &leads {
        *leads_by_stage.entry(lead.stage.as_str().to_string()).or_default() += 1;
    }

    let done = tasks_by_status[TaskStatus::Done.as_str()];
    let failed_tasks = tasks_by_status[TaskStatus::Failed.as_str()];
    let converted_leads = leads_by_stage[LeadStage::Converted.as_str()];

    let total_users = if can(caller, Action::ListAllUsers) {
        db.users.len()
    } else {
        db.users.iter().filter(|u| u.id == caller.id).count()
    };
    let unread_notifications = db
        .notifications
        .iter()
        .filter(|n| !n.read && n.visible_to(caller.id))
        .count();

    DashboardSummary {
        total_tasks: tasks.len(),
        completion_rate: percent(done, tasks.len()),
        tasks_by_status,
        tasks_by_priority,
        overdue_tasks,
        failed_tasks,
        total_leads: leads.len(),
        conversion_rate: percent(converted_leads, leads.len()),
        leads_by_stage,
        converted_leads,
        total_users,
        unread_notifications,
    }
}
