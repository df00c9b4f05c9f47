// src/models/task.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        query::{
            contains_ci, due_sort_value, eq_ci, has_tag, parse_timestamp, DateRange, ListQuery,
            Pagination, Queryable, RecordFilter, SortSpec, SortValue,
        },
    },
    models::{
        activity::ActivityEntry,
        attachment::Attachment,
        fields::{clearable, empty_string_as_none, parse_clearable, TagList},
    },
};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Invalid priority: {}", s))
    }
}

// --- TAREFA ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    #[schema(example = "Ligar para o cliente")]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Data como o cliente mandou (`YYYY-MM-DD` normalmente)
    #[serde(default)]
    #[schema(example = "2026-03-15")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Aplica as mudanças e devolve a descrição de cada campo alterado.
    pub fn apply(&mut self, changes: &TaskChanges, attachment: Option<Attachment>) -> Vec<String> {
        let mut diff = Vec::new();

        if let Some(title) = &changes.title {
            let title = title.trim();
            if title != self.title {
                diff.push(format!("title: {} → {}", self.title, title));
                self.title = title.to_string();
            }
        }
        if let Some(status) = changes.status {
            if status != self.status {
                diff.push(format!("status: {} → {}", self.status, status));
                self.status = status;
            }
        }
        if let Some(priority) = changes.priority {
            if priority != self.priority {
                diff.push(format!("priority: {} → {}", self.priority, priority));
                self.priority = priority;
            }
        }
        if let Some(due_date) = &changes.due_date {
            if *due_date != self.due_date {
                diff.push(format!("dueDate: {}", due_date.as_deref().unwrap_or("cleared")));
                self.due_date = due_date.clone();
            }
        }
        if let Some(assigned_to) = changes.assigned_to {
            if assigned_to != self.assigned_to {
                diff.push(match assigned_to {
                    Some(id) => format!("assignedTo: {}", id),
                    None => "assignedTo: cleared".to_string(),
                });
                self.assigned_to = assigned_to;
            }
        }
        if let Some(description) = &changes.description {
            if *description != self.description {
                diff.push("description updated".to_string());
                self.description = description.clone();
            }
        }
        if let Some(lead_id) = changes.lead_id {
            if lead_id != self.lead_id {
                diff.push(match lead_id {
                    Some(id) => format!("leadId: {}", id),
                    None => "leadId: cleared".to_string(),
                });
                self.lead_id = lead_id;
            }
        }
        if let Some(tags) = &changes.tags {
            if tags.0 != self.tags {
                diff.push(format!("tags: {}", tags.0.join(", ")));
                self.tags = tags.0.clone();
            }
        }
        if let Some(reason) = &changes.reason {
            if *reason != self.reason {
                diff.push(format!("reason: {}", reason.as_deref().unwrap_or("cleared")));
                self.reason = reason.clone();
            }
        }
        if let Some(attachment) = attachment {
            diff.push(format!("attachment: {}", attachment.filename));
            self.attachment = Some(attachment);
        }

        diff
    }

    fn search_text(&self) -> String {
        let assignee = self.assigned_to.map(|id| id.to_string()).unwrap_or_default();
        let tags = self.tags.join(" ");
        [
            self.title.as_str(),
            self.description.as_str(),
            self.reason.as_deref().unwrap_or_default(),
            assignee.as_str(),
            tags.as_str(),
        ]
        .join(" ")
    }
}

impl Queryable for Task {
    const SORT_KEYS: &'static [&'static str] = &[
        "title",
        "status",
        "priority",
        "dueDate",
        "assignedTo",
        "description",
        "tags",
        "reason",
        "attachment",
        "leadId",
    ];

    fn scope_owner(&self) -> Option<Uuid> {
        self.assigned_to
    }

    fn sort_value(&self, key: &str) -> SortValue {
        let text = match key {
            "dueDate" => return due_sort_value(self.due_date.as_deref()),
            "title" => self.title.clone(),
            "status" => self.status.as_str().to_string(),
            "priority" => self.priority.as_str().to_string(),
            "assignedTo" => self.assigned_to.map(|id| id.to_string()).unwrap_or_default(),
            "description" => self.description.clone(),
            "tags" => self.tags.join(", "),
            "reason" => self.reason.clone().unwrap_or_default(),
            "attachment" => self
                .attachment
                .as_ref()
                .map(|a| a.filename.clone())
                .unwrap_or_default(),
            "leadId" => self.lead_id.map(|id| id.to_string()).unwrap_or_default(),
            _ => String::new(),
        };
        SortValue::Text(text.to_lowercase())
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[validate(
        required(message = "Title required"),
        length(min = 1, message = "Title required")
    )]
    #[schema(example = "Ligar para o cliente")]
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[schema(example = "2026-03-15")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assigned_to: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub lead_id: Option<Uuid>,
    #[schema(value_type = Option<Vec<String>>, example = json!(["vip", "sla"]))]
    pub tags: Option<TagList>,
}

/// Mudanças parciais numa tarefa (PUT e bulk).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<Uuid>)]
    pub lead_id: Option<Option<Uuid>>,
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagList>,
    #[serde(default, deserialize_with = "clearable")]
    #[schema(value_type = Option<String>)]
    pub reason: Option<Option<String>>,
}

impl TaskChanges {
    pub fn check(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::validation("Title required"));
            }
        }
        if let Some(Some(due)) = &self.due_date {
            check_due_date(due)?;
        }
        Ok(())
    }

    /// Preenche um campo vindo de formulário multipart.
    pub fn set_form_field(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        match name {
            "title" => self.title = Some(value.to_string()),
            "status" => self.status = Some(value.parse().map_err(AppError::Validation)?),
            "priority" => self.priority = Some(value.parse().map_err(AppError::Validation)?),
            "dueDate" => self.due_date = Some(parse_clearable(Some(value)).map_err(AppError::Validation)?),
            "assignedTo" => {
                self.assigned_to = Some(
                    parse_clearable(Some(value))
                        .map_err(|e| AppError::validation(format!("Invalid assignedTo: {}", e)))?,
                )
            }
            "description" => self.description = Some(value.to_string()),
            "leadId" => {
                self.lead_id = Some(
                    parse_clearable(Some(value))
                        .map_err(|e| AppError::validation(format!("Invalid leadId: {}", e)))?,
                )
            }
            "tags" => self.tags = Some(TagList::parse_csv(value)),
            "reason" => self.reason = Some(parse_clearable(Some(value)).map_err(AppError::Validation)?),
            // Campos desconhecidos são ignorados, como no JSON.
            _ => {}
        }
        Ok(())
    }
}

pub fn check_due_date(raw: &str) -> Result<(), AppError> {
    parse_timestamp(raw)
        .map(|_| ())
        .ok_or_else(|| AppError::validation(format!("Invalid dueDate: {}", raw)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskBulkPayload {
    pub ids: Vec<Uuid>,
    pub updates: TaskChanges,
}

// --- LISTAGEM ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<usize>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_dir: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tag: Option<String>,
    /// Busca livre em título, descrição, motivo, responsável e tags
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub due_from: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub due_to: Option<String>,
}

impl TaskListQuery {
    pub fn into_list_query(
        self,
        default_page_size: usize,
        max_page_size: usize,
    ) -> Result<ListQuery<TaskFilter>, AppError> {
        let sort = SortSpec::parse::<Task>(self.sort_by.as_deref(), self.sort_dir.as_deref())?;
        let pagination =
            Pagination::from_params(self.page, self.page_size, default_page_size, max_page_size)?;
        let due = DateRange::from_params(self.due_from.as_deref(), self.due_to.as_deref());
        Ok(ListQuery {
            filter: TaskFilter {
                title: self.title,
                description: self.description,
                reason: self.reason,
                status: self.status,
                priority: self.priority,
                assigned_to: self.assigned_to,
                tag: self.tag,
                q: self.q,
                due,
            },
            sort,
            pagination,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub due: DateRange,
}

impl TaskFilter {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

impl RecordFilter<Task> for TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        if let Some(status) = &self.status {
            if !eq_ci(task.status.as_str(), status) {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if !eq_ci(task.priority.as_str(), priority) {
                return false;
            }
        }
        if let Some(assigned_to) = &self.assigned_to {
            let current = task.assigned_to.map(|id| id.to_string()).unwrap_or_default();
            if !eq_ci(&current, assigned_to) {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !contains_ci(&task.title, title) {
                return false;
            }
        }
        if let Some(description) = &self.description {
            if !contains_ci(&task.description, description) {
                return false;
            }
        }
        if let Some(reason) = &self.reason {
            if !contains_ci(task.reason.as_deref().unwrap_or_default(), reason) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !has_tag(&task.tags, tag) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ci(&task.search_text(), q) {
                return false;
            }
        }
        self.due.admits(task.due_date.as_deref())
    }
}
