// src/db/notification_repo.rs

use uuid::Uuid;

use crate::{
    db::store::Database,
    models::notification::{Notification, NotificationKind},
};

impl Database {
    /// Registra um aviso. O envio real (e-mail, WhatsApp) fica só no log.
    pub fn notify(&mut self, user_id: Option<Uuid>, kind: NotificationKind, message: String) {
        let recipient = user_id
            .and_then(|id| self.find_user(id))
            .map(|u| u.email.clone());
        tracing::info!(
            ?kind,
            user_id = ?user_id,
            email = recipient.as_deref().unwrap_or("-"),
            "✉️  Notificação: {}",
            message
        );
        self.notifications
            .push(Notification::new(user_id, kind, message));
    }

    /// Notificações do usuário + broadcast, mais novas primeiro.
    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        let mut items: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.visible_to(user_id))
            .cloned()
            .collect();
        // Empates de `at` saem na ordem inversa de inserção.
        items.reverse();
        items.sort_by(|a, b| b.at.cmp(&a.at));
        items
    }

    pub fn notification_mut(&mut self, id: Uuid) -> Option<&mut Notification> {
        self.notifications.iter_mut().find(|n| n.id == id)
    }
}
