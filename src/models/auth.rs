// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::attachment::Attachment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

// Usuário como está guardado no documento (com a senha)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // Hash bcrypt. Valores antigos em texto puro continuam aceitos no login.
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<Attachment>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

// O que sai na API: nunca expõe a senha
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    #[schema(example = "ana@empresa.com")]
    pub email: String,
    #[schema(example = "Ana Souza")]
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub avatar: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            created_at: user.created_at,
        }
    }
}

/// O usuário autenticado, reconstruído a partir das claims do token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
}

// Dados para registro de um novo usuário (sempre com papel `user`)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(
        required(message = "Email is required"),
        email(message = "Please enter a valid email")
    )]
    #[schema(example = "ana@empresa.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters long")
    )]
    pub password: Option<String>,

    pub name: Option<String>,
    #[schema(example = "Ana")]
    pub first_name: Option<String>,
    #[schema(example = "Souza")]
    pub last_name: Option<String>,
}

// Dados para login. Sem validação de formato: qualquer divergência é 401.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginUserPayload {
    #[serde(default)]
    #[schema(example = "ana@empresa.com")]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserProfile,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub iat: usize, // Issued At
    pub exp: usize, // Expiration time
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
            name: claims.name,
        }
    }
}

// Criação de usuário pelo admin
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(
        required(message = "email and password required"),
        email(message = "Please enter a valid email")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "email and password required"),
        length(min = 1, message = "email and password required")
    )]
    pub password: Option<String>,

    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

// Atualização de um usuário (próprio perfil, ou qualquer um pelo admin)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

// PUT /users/me (JSON ou multipart). Papel não se altera por aqui.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Remove o avatar atual
    #[serde(default)]
    pub remove_avatar: bool,
}

impl ProfilePayload {
    /// Campos de texto do formulário multipart.
    pub fn set_form_field(&mut self, name: &str, value: &str) {
        match name {
            "email" if !value.trim().is_empty() => self.email = Some(value.trim().to_string()),
            "password" if !value.is_empty() => self.password = Some(value.to_string()),
            "name" => self.name = Some(value.to_string()),
            "firstName" => self.first_name = Some(value.to_string()),
            "lastName" => self.last_name = Some(value.to_string()),
            "removeAvatar" => self.remove_avatar = matches!(value.trim(), "true" | "1" | "on"),
            _ => {}
        }
    }
}

impl From<ProfilePayload> for UpdateUserPayload {
    fn from(p: ProfilePayload) -> Self {
        Self {
            email: p.email,
            password: p.password,
            name: p.name,
            first_name: p.first_name,
            last_name: p.last_name,
            role: None,
        }
    }
}

/// Junta `firstName` + `lastName` quando `name` não foi informado.
pub fn display_name(
    name: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Option<String> {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }
    let joined = [first_name, last_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
