// src/services/view_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::Store,
    middleware::rbac::{authorize, Action},
    models::{
        auth::CurrentUser,
        view::{CreateViewPayload, SavedView},
    },
};

#[derive(Clone)]
pub struct ViewService {
    store: Store,
}

impl ViewService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self, caller: &CurrentUser, page: Option<&str>) -> Vec<SavedView> {
        self.store
            .read(|db| {
                db.views
                    .iter()
                    .filter(|v| v.user_id == caller.id)
                    .filter(|v| page.is_none_or(|p| v.page == p))
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn create(&self, caller: &CurrentUser, payload: CreateViewPayload) -> Result<SavedView, AppError> {
        payload.validate()?;

        let view = SavedView {
            id: Uuid::new_v4(),
            user_id: caller.id,
            name: payload.name.unwrap_or_default().trim().to_string(),
            page: payload.page.unwrap_or_default().trim().to_string(),
            filters: payload.filters,
            created_at: Utc::now(),
        };

        let view = self
            .store
            .transaction(|db| {
                db.insert_view(view.clone());
                Ok(view)
            })
            .await?;

        tracing::info!(view_id = %view.id, user_id = %caller.id, "💾 View salva");
        Ok(view)
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        self.store
            .transaction(|db| {
                let owner = db.find_view(id).ok_or(AppError::NotFound("View"))?.user_id;
                authorize(caller, Action::DeleteView { owner })?;
                db.remove_view(id);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryBackend, models::auth::Role};
    use serde_json::json;
    use std::sync::Arc;

    fn caller() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "x@x.com".into(),
            role: Role::Admin,
            name: "X".into(),
        }
    }

    fn view(name: &str, page: &str) -> CreateViewPayload {
        CreateViewPayload {
            name: Some(name.into()),
            page: Some(page.into()),
            filters: json!({"status": "failed"}),
        }
    }

    #[tokio::test]
    async fn views_are_private_to_their_owner() {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();
        let views = ViewService::new(store);
        let me = caller();
        let other = caller();

        let tasks_view = views.create(&me, view("Falhas", "tasks")).await.unwrap();
        views.create(&me, view("Novos", "leads")).await.unwrap();
        views.create(&other, view("Deles", "tasks")).await.unwrap();

        assert_eq!(views.list(&me, None).await.len(), 2);
        let only_tasks = views.list(&me, Some("tasks")).await;
        assert_eq!(only_tasks.len(), 1);
        assert_eq!(only_tasks[0].filters["status"], "failed");

        assert!(matches!(views.delete(&other, tasks_view.id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(views.delete(&me, Uuid::new_v4()).await, Err(AppError::NotFound("View"))));
        views.delete(&me, tasks_view.id).await.unwrap();
        assert!(views.list(&me, Some("tasks")).await.is_empty());
    }

    #[tokio::test]
    async fn blank_name_or_page_is_rejected() {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();
        let views = ViewService::new(store);
        let me = caller();

        let err = views.create(&me, view("   ", "tasks")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(matches!(
            views.create(&me, view("Falhas", " \t")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(views.list(&me, None).await.is_empty());

        let trimmed = views.create(&me, view("  Falhas ", " tasks ")).await.unwrap();
        assert_eq!(trimmed.name, "Falhas");
        assert_eq!(trimmed.page, "tasks");
    }
}
