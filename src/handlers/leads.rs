// src/handlers/leads.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppQuery},
        query::Page,
    },
    config::AppState,
    handlers::MessageResponse,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermBulkLeads, RequirePermission},
    },
    models::{
        activity::ActivityEntry,
        lead::{CreateLeadPayload, Lead, LeadBulkPayload, LeadChanges, LeadListQuery},
    },
    services::task_service::BulkResult,
};

// GET /leads
#[utoipa::path(
    get,
    path = "/leads",
    tag = "Leads",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Leads visíveis para o papel, filtrados e paginados", body = Page<Lead>),
        (status = 400, description = "Ordenação ou paginação inválida")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(params): AppQuery<LeadListQuery>,
) -> Result<Json<Page<Lead>>, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let query = params
        .into_list_query(app_state.config.default_page_size, app_state.config.max_page_size)
        .map_err(to_api)?;
    let page = app_state.lead_service.list(&user, query).await.map_err(to_api)?;

    Ok(Json(page))
}

// POST /leads
#[utoipa::path(
    post,
    path = "/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado (dono padrão: quem criou; papel user é sempre o dono)", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /leads/{id}
#[utoipa::path(
    get,
    path = "/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 403, description = "Lead de outra pessoa"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .lead_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PUT /leads/{id}
#[utoipa::path(
    put,
    path = "/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = LeadChanges,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Lead de outra pessoa"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    AppJson(changes): AppJson<LeadChanges>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .lead_service
        .update(&user, id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// DELETE /leads/{id}
#[utoipa::path(
    delete,
    path = "/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead removido", body = MessageResponse),
        (status = 403, description = "Apenas admin/manager"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .lead_service
        .delete(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::deleted()))
}

// POST /leads/bulk
#[utoipa::path(
    post,
    path = "/leads/bulk",
    tag = "Leads",
    request_body = LeadBulkPayload,
    responses(
        (status = 200, description = "Leads atualizados", body = BulkResult<Lead>),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas admin/manager")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn bulk_update_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermBulkLeads>,
    AppJson(payload): AppJson<LeadBulkPayload>,
) -> Result<Json<BulkResult<Lead>>, ApiError> {
    let result = app_state
        .lead_service
        .bulk_update(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /leads/{id}/activity
#[utoipa::path(
    get,
    path = "/leads/{id}/activity",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Histórico do lead", body = Vec<ActivityEntry>),
        (status = 403, description = "Lead de outra pessoa"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn lead_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let activity = app_state
        .lead_service
        .activity(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(activity))
}
