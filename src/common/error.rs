// src/common/error.rs

use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio. Os handlers convertem para `ApiError` com o idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Evidence attachment is required when marking failed")]
    AttachmentRequired,

    #[error("Invalid file type")]
    InvalidFileType,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro de serialização: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // Qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            // E-mail duplicado é conflito semanticamente, mas o cliente espera 400.
            AppError::Validation(_)
            | AppError::ValidationError(_)
            | AppError::AttachmentRequired
            | AppError::InvalidFileType
            | AppError::EmailAlreadyExists => StatusCode::BAD_REQUEST,
            AppError::Io(_)
            | AppError::Json(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens. `None` quando a mensagem é montada em tempo de execução.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            AppError::MissingToken => Some("no_token"),
            AppError::InvalidToken => Some("invalid_token"),
            AppError::InvalidCredentials => Some("invalid_credentials"),
            AppError::NotFound(_) => Some("not_found"),
            AppError::AttachmentRequired => Some("attachment_required"),
            AppError::InvalidFileType => Some("invalid_file_type"),
            AppError::EmailAlreadyExists => Some("email_exists"),
            AppError::Forbidden(_) | AppError::Validation(_) | AppError::ValidationError(_) => None,
            _ => Some("internal_error"),
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        if let AppError::ValidationError(errors) = self {
            let mut details: HashMap<String, Vec<String>> = HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field))
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            // A primeira mensagem vira o `message` principal (o cliente só mostra ele).
            let mut fields: Vec<&String> = details.keys().collect();
            fields.sort();
            let message = fields
                .first()
                .and_then(|f| details.get(*f))
                .and_then(|m| m.first().cloned())
                .unwrap_or_else(|| self.to_string());
            return ApiError {
                status,
                message,
                details: Some(details),
            };
        }

        let message = match self.message_key() {
            Some(key) => match i18n.translate(&locale.0, key) {
                Some(text) => match self {
                    AppError::NotFound(entity) => text.replace("{entity}", entity),
                    _ => text.to_string(),
                },
                None => self.to_string(),
            },
            None => self.to_string(),
        };

        ApiError {
            status,
            message,
            details: None,
        }
    }
}

// O erro que de fato vai para o cliente: `{ "message": ... }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "message": self.message, "details": details }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Caminhos sem acesso ao idioma (rejeições de extratores) respondem em inglês.
impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default(), &I18nStore::default())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_translated_with_entity() {
        let i18n = I18nStore::default();
        let err = AppError::NotFound("Task");

        let en = err.to_api_error(&Locale("en".into()), &i18n);
        assert_eq!(en.status, StatusCode::NOT_FOUND);
        assert_eq!(en.message, "Task not found");

        let pt = err.to_api_error(&Locale("pt".into()), &i18n);
        assert_eq!(pt.message, "Task não encontrado(a)");
    }

    #[test]
    fn dynamic_messages_are_kept_verbatim() {
        let i18n = I18nStore::default();
        let err = AppError::forbidden("Only admin can create users");
        let api = err.to_api_error(&Locale("pt".into()), &i18n);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert_eq!(api.message, "Only admin can create users");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("disk on fire"));
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("disk"));
    }
}
