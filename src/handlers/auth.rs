// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{error::ApiError, extract::AppJson},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AuthResponse, LoginUserPayload, MeResponse, RegisterUserPayload, UserProfile},
};

// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado com papel `user`", body = UserProfile),
        (status = 400, description = "Dados inválidos ou e-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .auth_service
        .register_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let token = app_state
        .auth_service
        .login_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Perfil público de quem está logado", body = MeResponse),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 404, description = "Conta removida")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = app_state
        .auth_service
        .me(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MeResponse { user: profile }))
}
