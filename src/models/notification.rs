// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskStatus,
    LeadCreated,
    LeadStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    /// `None` = aviso para todos
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[schema(example = "You were assigned to task \"Ligar para o cliente\"")]
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(user_id: Option<Uuid>, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            user_id,
            kind,
            message: message.into(),
            read: false,
        }
    }

    /// Notificações próprias ou de broadcast.
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.user_id.is_none_or(|id| id == user_id)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadAllResponse {
    pub updated: usize,
}

/// Canal dos envios simulados (`/notify/*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    Email,
    WhatsApp,
}

impl DeliveryChannel {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryChannel::Email => "Email",
            DeliveryChannel::WhatsApp => "WhatsApp",
        }
    }
}

/// Resposta dos envios simulados. Nada sai do servidor além do log.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryReceipt {
    #[schema(example = true)]
    pub ok: bool,
    #[schema(example = "Email mock sent")]
    pub message: String,
}

impl DeliveryReceipt {
    pub fn mocked(channel: DeliveryChannel) -> Self {
        Self {
            ok: true,
            message: format!("{} mock sent", channel.label()),
        }
    }
}
