// src/handlers/teams.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, extract::AppJson},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageTeams, RequirePermission},
    },
    models::team::{CreateTeamPayload, Team, UpdateTeamPayload},
};

// GET /teams
#[utoipa::path(
    get,
    path = "/teams",
    tag = "Teams",
    responses(
        (status = 200, description = "Todos os times", body = Vec<Team>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_teams(State(app_state): State<AppState>) -> Json<Vec<Team>> {
    Json(app_state.team_service.list().await)
}

// POST /teams
#[utoipa::path(
    post,
    path = "/teams",
    tag = "Teams",
    request_body = CreateTeamPayload,
    responses(
        (status = 201, description = "Time criado", body = Team),
        (status = 400, description = "Nome ausente"),
        (status = 403, description = "Apenas admin/manager")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_team(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageTeams>,
    AppJson(payload): AppJson<CreateTeamPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let team = app_state
        .team_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(team)))
}

// PUT /teams/{id}
#[utoipa::path(
    put,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "ID do time")),
    request_body = UpdateTeamPayload,
    responses(
        (status = 200, description = "Time atualizado", body = Team),
        (status = 403, description = "Apenas admin/manager"),
        (status = 404, description = "Time não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_team(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTeamPayload>,
) -> Result<Json<Team>, ApiError> {
    let team = app_state
        .team_service
        .update(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(team))
}
