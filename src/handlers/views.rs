// src/handlers/views.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        extract::{AppJson, AppQuery},
    },
    config::AppState,
    handlers::MessageResponse,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::view::{CreateViewPayload, SavedView, ViewListQuery},
};

// GET /views
#[utoipa::path(
    get,
    path = "/views",
    tag = "Views",
    params(ViewListQuery),
    responses(
        (status = 200, description = "Views salvas de quem está logado", body = Vec<SavedView>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_views(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(params): AppQuery<ViewListQuery>,
) -> Json<Vec<SavedView>> {
    Json(app_state.view_service.list(&user, params.page.as_deref()).await)
}

// POST /views
#[utoipa::path(
    post,
    path = "/views",
    tag = "Views",
    request_body = CreateViewPayload,
    responses(
        (status = 201, description = "View salva", body = SavedView),
        (status = 400, description = "Nome ou página ausente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_view(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateViewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .view_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(view)))
}

// DELETE /views/{id}
#[utoipa::path(
    delete,
    path = "/views/{id}",
    tag = "Views",
    params(("id" = Uuid, Path, description = "ID da view")),
    responses(
        (status = 200, description = "View removida", body = MessageResponse),
        (status = 403, description = "View de outra pessoa"),
        (status = 404, description = "View não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_view(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .view_service
        .delete(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::deleted()))
}
