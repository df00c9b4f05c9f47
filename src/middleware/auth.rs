// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::CurrentUser,
};

// Guardião das rotas protegidas: valida o Bearer e guarda o usuário nas extensions
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            to_api(AppError::MissingToken)
        } else {
            to_api(AppError::InvalidToken)
        }
    })?;

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .map_err(to_api)?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::MissingToken.into())
    }
}
