// src/services/task_service.rs

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        query::{self, ListQuery, Page},
    },
    db::{Database, Store},
    middleware::rbac::{authorize, scope, Action},
    models::{
        activity::{summarize, ActivityAction, ActivityEntry},
        attachment::Attachment,
        auth::CurrentUser,
        notification::NotificationKind,
        task::{check_due_date, CreateTaskPayload, Task, TaskBulkPayload, TaskChanges, TaskFilter, TaskStatus},
    },
    services::upload_service::{PendingUpload, UploadKind, UploadStore},
};

/// Resultado de uma atualização em lote.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkResult<T> {
    pub updated: usize,
    pub items: Vec<T>,
}

/// PUT /tasks/{id}: mudanças + evidência opcional.
#[derive(Debug, Default)]
pub struct TaskUpdate {
    pub changes: TaskChanges,
    pub attachment: Option<PendingUpload>,
}

#[derive(Clone)]
pub struct TaskService {
    store: Store,
    uploads: UploadStore,
}

impl TaskService {
    pub fn new(store: Store, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }

    pub async fn list(
        &self,
        caller: &CurrentUser,
        query: ListQuery<TaskFilter>,
    ) -> Result<Page<Task>, AppError> {
        let scope = scope(caller);
        Ok(self
            .store
            .read(|db| query::run(&db.tasks, scope, &query))
            .await)
    }

    pub async fn get(&self, caller: &CurrentUser, id: Uuid) -> Result<Task, AppError> {
        let task = self
            .store
            .read(|db| db.find_task(id).cloned())
            .await
            .ok_or(AppError::NotFound("Task"))?;
        authorize(caller, Action::ReadTask { assignee: task.assigned_to })?;
        Ok(task)
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        payload: CreateTaskPayload,
    ) -> Result<Task, AppError> {
        authorize(caller, Action::CreateTask)?;
        payload.validate()?;

        let status = payload.status.unwrap_or_default();
        // Na criação não há como anexar evidência.
        if status == TaskStatus::Failed {
            return Err(AppError::AttachmentRequired);
        }
        if let Some(due) = &payload.due_date {
            check_due_date(due)?;
        }

        let title = payload.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("Title required"));
        }

        let task = Task {
            id: Uuid::new_v4(),
            title,
            status,
            priority: payload.priority.unwrap_or_default(),
            due_date: payload.due_date,
            assigned_to: payload.assigned_to,
            description: payload.description.unwrap_or_default(),
            lead_id: payload.lead_id,
            tags: payload.tags.map(|t| t.into_inner()).unwrap_or_default(),
            reason: None,
            attachment: None,
            activity: vec![ActivityEntry::new(caller.id, ActivityAction::Created, "Task created")],
            created_at: Utc::now(),
        };

        let created = self
            .store
            .transaction(|db| {
                if let Some(assignee) = task.assigned_to {
                    db.notify(
                        Some(assignee),
                        NotificationKind::TaskAssigned,
                        format!("You were assigned to task \"{}\"", task.title),
                    );
                }
                db.insert_task(task.clone());
                Ok(task)
            })
            .await?;

        tracing::info!(task_id = %created.id, actor = %caller.id, "✅ Tarefa criada");
        Ok(created)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Task, AppError> {
        let TaskUpdate { changes, attachment } = update;

        // 1. Checagens antes de qualquer gravação em disco
        self.store
            .read(|db| check_update(db, caller, id, &changes, attachment.is_some()))
            .await?;
        if let Some(upload) = &attachment {
            self.uploads.check(UploadKind::Evidence, upload)?;
        }

        // 2. Grava o arquivo
        let saved = match attachment {
            Some(upload) => Some(self.uploads.save(UploadKind::Evidence, upload).await?),
            None => None,
        };

        // 3. Aplica dentro da transação (as regras são conferidas de novo sob o lock)
        let new_attachment = saved.clone();
        let result = self
            .store
            .transaction(|db| {
                check_update(db, caller, id, &changes, new_attachment.is_some())?;
                apply_update(db, caller, id, &changes, new_attachment)
            })
            .await;

        match result {
            Ok((task, replaced)) => {
                if let Some(old) = replaced {
                    self.uploads.discard(&old).await;
                }
                tracing::info!(task_id = %task.id, actor = %caller.id, "✏️ Tarefa atualizada");
                Ok(task)
            }
            Err(e) => {
                if let Some(file) = &saved {
                    self.uploads.discard(file).await;
                }
                Err(e)
            }
        }
    }

    pub async fn bulk_update(
        &self,
        caller: &CurrentUser,
        payload: TaskBulkPayload,
    ) -> Result<BulkResult<Task>, AppError> {
        authorize(caller, Action::BulkUpdateTasks)?;
        let changes = payload.updates;
        changes.check()?;
        let ids = dedup_ids(payload.ids);

        let items = self
            .store
            .transaction(|db| {
                // Uma única violação rejeita o lote inteiro.
                if changes.status == Some(TaskStatus::Failed) {
                    let missing = ids
                        .iter()
                        .filter_map(|id| db.find_task(*id))
                        .any(|t| t.attachment.is_none());
                    if missing {
                        return Err(AppError::AttachmentRequired);
                    }
                }

                let mut items = Vec::new();
                for id in &ids {
                    let Some(task) = db.task_mut(*id) else {
                        continue;
                    };
                    let previous_assignee = task.assigned_to;
                    let diff = task.apply(&changes, None);
                    task.activity.push(ActivityEntry::new(
                        caller.id,
                        ActivityAction::BulkUpdate,
                        summarize(&diff, "Bulk update"),
                    ));
                    let snapshot = task.clone();

                    // Lote só avisa atribuição, nunca mudança de status.
                    if let Some(assignee) = snapshot.assigned_to {
                        if previous_assignee != Some(assignee) {
                            db.notify(
                                Some(assignee),
                                NotificationKind::TaskAssigned,
                                format!("You were assigned to task \"{}\"", snapshot.title),
                            );
                        }
                    }
                    items.push(snapshot);
                }
                Ok(items)
            })
            .await?;

        tracing::info!(actor = %caller.id, updated = items.len(), "📦 Tarefas atualizadas em lote");
        Ok(BulkResult {
            updated: items.len(),
            items,
        })
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .store
            .transaction(|db| {
                if db.find_task(id).is_none() {
                    return Err(AppError::NotFound("Task"));
                }
                authorize(caller, Action::DeleteTask)?;
                db.remove_task(id).ok_or(AppError::NotFound("Task"))
            })
            .await?;

        if let Some(attachment) = &removed.attachment {
            self.uploads.discard(attachment).await;
        }
        tracing::info!(task_id = %id, actor = %caller.id, "🗑️ Tarefa removida");
        Ok(())
    }

    pub async fn activity(&self, caller: &CurrentUser, id: Uuid) -> Result<Vec<ActivityEntry>, AppError> {
        Ok(self.get(caller, id).await?.activity)
    }
}

// 404 → 403 → regra do `failed`
fn check_update(
    db: &Database,
    caller: &CurrentUser,
    id: Uuid,
    changes: &TaskChanges,
    has_new_attachment: bool,
) -> Result<(), AppError> {
    let task = db.find_task(id).ok_or(AppError::NotFound("Task"))?;
    authorize(caller, Action::UpdateTask { assignee: task.assigned_to })?;
    changes.check()?;
    if changes.status == Some(TaskStatus::Failed) && !has_new_attachment && task.attachment.is_none() {
        return Err(AppError::AttachmentRequired);
    }
    Ok(())
}

/// Devolve a tarefa atualizada e o anexo substituído (para apagar do disco).
fn apply_update(
    db: &mut Database,
    caller: &CurrentUser,
    id: Uuid,
    changes: &TaskChanges,
    attachment: Option<Attachment>,
) -> Result<(Task, Option<Attachment>), AppError> {
    let task = db.task_mut(id).ok_or(AppError::NotFound("Task"))?;
    let previous_assignee = task.assigned_to;
    let previous_status = task.status;
    let replaced = if attachment.is_some() {
        task.attachment.clone()
    } else {
        None
    };

    let diff = task.apply(changes, attachment);
    task.activity.push(ActivityEntry::new(
        caller.id,
        ActivityAction::Updated,
        summarize(&diff, "No changes"),
    ));
    let snapshot = task.clone();

    if let Some(assignee) = snapshot.assigned_to {
        if previous_assignee != Some(assignee) {
            db.notify(
                Some(assignee),
                NotificationKind::TaskAssigned,
                format!("You were assigned to task \"{}\"", snapshot.title),
            );
        }
        if previous_status != snapshot.status {
            db.notify(
                Some(assignee),
                NotificationKind::TaskStatus,
                format!("Task \"{}\" is now {}", snapshot.title, snapshot.status),
            );
        }
    }

    Ok((snapshot, replaced))
}

pub(crate) fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
