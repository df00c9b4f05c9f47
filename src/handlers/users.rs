// src/handlers/users.rs

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
        extract::{AppJson, ProfileForm},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCreateUser, RequirePermission},
    },
    models::auth::{CreateUserPayload, ProfilePayload, UpdateUserPayload, UserProfile},
};

// GET /users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "Admin e manager veem todos; `user` só a si mesmo", body = Vec<UserProfile>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<Vec<UserProfile>> {
    Json(app_state.user_service.list(&user).await)
}

// POST /users
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = UserProfile),
        (status = 400, description = "Dados inválidos ou e-mail já cadastrado"),
        (status = 403, description = "Apenas admin")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermCreateUser>,
    AppJson(payload): AppJson<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let created = app_state
        .user_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /users/{id}
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = UserProfile),
        (status = 400, description = "Dados inválidos ou e-mail já cadastrado"),
        (status = 403, description = "Só o próprio usuário ou admin; papel só pelo admin"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateUserPayload>,
) -> Result<Json<UserProfile>, ApiError> {
    let updated = app_state
        .user_service
        .update(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// PUT /users/me
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "Users",
    request_body(
        content = ProfilePayload,
        description = "JSON, ou multipart/form-data com os mesmos campos e a imagem em `avatar`"
    ),
    responses(
        (status = 200, description = "Perfil atualizado", body = UserProfile),
        (status = 400, description = "Dados inválidos ou imagem recusada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    ProfileForm(update): ProfileForm,
) -> Result<Json<UserProfile>, ApiError> {
    let updated = app_state
        .user_service
        .update_profile(&user, update)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}
