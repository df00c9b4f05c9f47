// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, extract::AppJson},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::notification::{DeliveryChannel, DeliveryReceipt, Notification, ReadAllResponse},
};

// GET /notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Notificações próprias e de broadcast, mais novas primeiro", body = Vec<Notification>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<Vec<Notification>> {
    Json(app_state.notification_service.list(&user).await)
}

// POST /notifications/{id}/read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida", body = Notification),
        (status = 404, description = "Não encontrada (ou de outra pessoa)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = app_state
        .notification_service
        .mark_read(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notification))
}

// POST /notifications/read-all
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Quantidade marcada como lida", body = ReadAllResponse)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ReadAllResponse>, ApiError> {
    let updated = app_state
        .notification_service
        .mark_all_read(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ReadAllResponse { updated }))
}

// =============================================================================
//  ENVIOS SIMULADOS
// =============================================================================

fn log_delivery(channel: DeliveryChannel, sender: Uuid, payload: &serde_json::Value) -> DeliveryReceipt {
    tracing::info!(%sender, channel = channel.label(), %payload, "📨 Envio simulado");
    DeliveryReceipt::mocked(channel)
}

// POST /notify/email
#[utoipa::path(
    post,
    path = "/notify/email",
    tag = "Notifications",
    request_body(content = serde_json::Value, description = "Payload livre, apenas registrado em log"),
    responses(
        (status = 200, description = "Envio de e-mail simulado", body = DeliveryReceipt),
        (status = 400, description = "Corpo não é JSON")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn mock_email(
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<serde_json::Value>,
) -> Json<DeliveryReceipt> {
    Json(log_delivery(DeliveryChannel::Email, user.id, &payload))
}

// POST /notify/whatsapp
#[utoipa::path(
    post,
    path = "/notify/whatsapp",
    tag = "Notifications",
    request_body(content = serde_json::Value, description = "Payload livre, apenas registrado em log"),
    responses(
        (status = 200, description = "Envio de WhatsApp simulado", body = DeliveryReceipt),
        (status = 400, description = "Corpo não é JSON")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn mock_whatsapp(
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<serde_json::Value>,
) -> Json<DeliveryReceipt> {
    Json(log_delivery(DeliveryChannel::WhatsApp, user.id, &payload))
}
