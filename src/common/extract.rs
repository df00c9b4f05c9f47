// src/common/extract.rs

//! Extratores com rejeição no formato da API (`400 {message}` no idioma do cliente).

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRef, FromRequest, FromRequestParts, Multipart, Query, Request,
    },
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{auth::ProfilePayload, task::TaskChanges},
    services::{task_service::TaskUpdate, upload_service::PendingUpload, user_service::ProfileUpdate},
};

/// Campo de arquivo da evidência no PUT /tasks/{id}
pub const ATTACHMENT_FIELD: &str = "attachment";
/// Campo de arquivo do PUT /users/me
pub const AVATAR_FIELD: &str = "avatar";

pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn locale_of(headers: &HeaderMap) -> Locale {
    Locale::from_header(
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    )
}

// Contexto para traduzir os erros de um extrator
struct Rejector {
    locale: Locale,
    app_state: AppState,
}

impl Rejector {
    fn new<S>(headers: &HeaderMap, state: &S) -> Self
    where
        AppState: FromRef<S>,
    {
        Self {
            locale: locale_of(headers),
            app_state: AppState::from_ref(state),
        }
    }

    fn reject(&self, err: AppError) -> ApiError {
        err.to_api_error(&self.locale, &self.app_state.i18n_store)
    }

    fn multipart(&self, err: MultipartError) -> ApiError {
        tracing::debug!("Multipart inválido: {}", err.body_text());
        ApiError {
            status: err.status(),
            message: err.body_text(),
            details: None,
        }
    }
}

// =============================================================================
//  JSON E QUERY
// =============================================================================

/// `Json<T>` cuja falha de parse responde 400 `{message}`.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let rejector = Rejector::new(req.headers(), state);
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|r| rejector.reject(AppError::Validation(r.body_text())))?;
        Ok(AppJson(value))
    }
}

/// `Query<T>` cuja falha de parse responde 400 `{message}`.
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let rejector = Rejector::new(&parts.headers, state);
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|r| rejector.reject(AppError::Validation(r.body_text())))?;
        Ok(AppQuery(value))
    }
}

// =============================================================================
//  FORMULÁRIOS (JSON OU MULTIPART)
// =============================================================================

/// Lê um campo de arquivo. Input de arquivo vazio conta como "sem arquivo".
async fn read_file(field: Field<'_>, rejector: &Rejector) -> Result<Option<PendingUpload>, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(|e| rejector.multipart(e))?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(PendingUpload {
        file_name,
        content_type,
        bytes,
    }))
}

/// Corpo do PUT /tasks/{id}: `TaskChanges` em JSON, ou multipart com o arquivo em `attachment`.
pub struct TaskUpdateForm(pub TaskUpdate);

impl<S> FromRequest<S> for TaskUpdateForm
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(req.headers()) {
            let AppJson(changes) = AppJson::<TaskChanges>::from_request(req, state).await?;
            return Ok(TaskUpdateForm(TaskUpdate {
                changes,
                attachment: None,
            }));
        }

        let rejector = Rejector::new(req.headers(), state);
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|r| rejector.reject(AppError::Validation(r.body_text())))?;

        let mut update = TaskUpdate::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| rejector.multipart(e))? {
            let name = field.name().unwrap_or_default().to_string();
            if name == ATTACHMENT_FIELD {
                update.attachment = read_file(field, &rejector).await?;
            } else {
                let value = field.text().await.map_err(|e| rejector.multipart(e))?;
                update
                    .changes
                    .set_form_field(&name, &value)
                    .map_err(|e| rejector.reject(e))?;
            }
        }
        Ok(TaskUpdateForm(update))
    }
}

/// Corpo do PUT /users/me: `ProfilePayload` em JSON, ou multipart com o arquivo em `avatar`.
pub struct ProfileForm(pub ProfileUpdate);

impl<S> FromRequest<S> for ProfileForm
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(req.headers()) {
            let AppJson(changes) = AppJson::<ProfilePayload>::from_request(req, state).await?;
            return Ok(ProfileForm(ProfileUpdate {
                changes,
                avatar: None,
            }));
        }

        let rejector = Rejector::new(req.headers(), state);
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|r| rejector.reject(AppError::Validation(r.body_text())))?;

        let mut update = ProfileUpdate::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| rejector.multipart(e))? {
            let name = field.name().unwrap_or_default().to_string();
            if name == AVATAR_FIELD {
                update.avatar = read_file(field, &rejector).await?;
            } else {
                let value = field.text().await.map_err(|e| rejector.multipart(e))?;
                update.changes.set_form_field(&name, &value);
            }
        }
        Ok(ProfileForm(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn multipart_detection_ignores_boundary_and_case() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Multipart/Form-Data; boundary=X"),
        );
        assert!(is_multipart(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_multipart(&headers));
    }
}
