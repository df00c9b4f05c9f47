// src/services/notification_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::Store,
    models::{auth::CurrentUser, notification::Notification},
};

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self, caller: &CurrentUser) -> Vec<Notification> {
        self.store.read(|db| db.notifications_for(caller.id)).await
    }

    /// Notificação de outra pessoa responde 404, como se não existisse.
    pub async fn mark_read(&self, caller: &CurrentUser, id: Uuid) -> Result<Notification, AppError> {
        self.store
            .transaction(|db| {
                let notification = db
                    .notification_mut(id)
                    .filter(|n| n.visible_to(caller.id))
                    .ok_or(AppError::NotFound("Notification"))?;
                notification.read = true;
                Ok(notification.clone())
            })
            .await
    }

    pub async fn mark_all_read(&self, caller: &CurrentUser) -> Result<usize, AppError> {
        let updated = self
            .store
            .transaction(|db| {
                let mut updated = 0;
                for n in db
                    .notifications
                    .iter_mut()
                    .filter(|n| !n.read && n.visible_to(caller.id))
                {
                    n.read = true;
                    updated += 1;
                }
                Ok(updated)
            })
            .await?;
        tracing::debug!(user_id = %caller.id, updated, "Notificações marcadas como lidas");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{Database, MemoryBackend},
        models::{auth::Role, notification::NotificationKind},
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn users_see_and_clear_only_their_own_and_broadcasts() {
        let me = CurrentUser {
            id: Uuid::new_v4(),
            email: "me@x.com".into(),
            role: Role::User,
            name: "Me".into(),
        };
        let someone = Uuid::new_v4();

        let mut db = Database::default();
        db.notifications.push(Notification::new(Some(me.id), NotificationKind::TaskAssigned, "mine"));
        db.notifications.push(Notification::new(None, NotificationKind::LeadCreated, "all"));
        db.notifications.push(Notification::new(Some(someone), NotificationKind::TaskStatus, "theirs"));
        let theirs = db.notifications[2].id;

        let store = Store::open(Arc::new(MemoryBackend::with_data(db))).await.unwrap();
        let service = NotificationService::new(store.clone());

        let visible = service.list(&me).await;
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].message, "all");

        assert!(matches!(
            service.mark_read(&me, theirs).await,
            Err(AppError::NotFound("Notification"))
        ));
        assert!(service.mark_read(&me, visible[1].id).await.unwrap().read);

        assert_eq!(service.mark_all_read(&me).await.unwrap(), 1);
        assert_eq!(service.mark_all_read(&me).await.unwrap(), 0);
        let untouched = store.read(|db| db.notifications[2].read).await;
        assert!(!untouched);
    }
}
