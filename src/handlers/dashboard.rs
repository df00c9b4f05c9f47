// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::extract::AppQuery,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::dashboard::{DashboardSummary, SearchQuery, SearchResults},
};

// GET /dashboard/summary
#[utoipa::path(
    get,
    path = "/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores de tarefas e leads no escopo do papel", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<DashboardSummary> {
    Json(app_state.dashboard_service.get_summary(&user).await)
}

// GET /search
#[utoipa::path(
    get,
    path = "/search",
    tag = "Dashboard",
    params(SearchQuery),
    responses(
        (status = 200, description = "Tarefas, leads e usuários que batem com `q`", body = SearchResults),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn search(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(params): AppQuery<SearchQuery>,
) -> Json<SearchResults> {
    Json(
        app_state
            .search_service
            .search(&user, params.q.as_deref(), params.limit)
            .await,
    )
}
