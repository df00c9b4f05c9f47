// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::Store,
    models::auth::{
        display_name, Claims, CurrentUser, LoginUserPayload, RegisterUserPayload, Role, User,
        UserProfile,
    },
};

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(store: Store, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            store,
            jwt_secret,
            token_ttl_hours,
        }
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<UserProfile, AppError> {
        payload.validate()?;

        let email = payload.email.unwrap_or_default().trim().to_string();
        let password = payload.password.unwrap_or_default();
        let name = display_name(
            payload.name.as_deref(),
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .ok_or_else(|| AppError::validation("Name is required"))?;

        // Checagem antecipada para não gastar bcrypt à toa; a transação confere de novo.
        if self.store.read(|db| db.email_taken(&email, None)).await {
            return Err(AppError::EmailAlreadyExists);
        }

        // 1. Hashing fora do runtime async
        let password_hash = hash_password(password).await?;

        // 2. Grava. Novo cadastro é sempre `user`.
        let user = User {
            id: Uuid::new_v4(),
            email,
            password: password_hash,
            name,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: Role::User,
            avatar: None,
            created_at: Utc::now(),
        };

        let profile = self
            .store
            .transaction(move |db| {
                if db.email_taken(&user.email, None) {
                    return Err(AppError::EmailAlreadyExists);
                }
                let profile = UserProfile::from(&user);
                db.insert_user(user);
                Ok(profile)
            })
            .await?;

        tracing::info!(user_id = %profile.id, "👤 Usuário registrado: {}", profile.email);
        Ok(profile)
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<String, AppError> {
        let user = self
            .store
            .read(|db| db.find_user_by_email(&payload.email).cloned())
            .await
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(payload.password, user.password.clone()).await? {
            tracing::warn!(user_id = %user.id, "Senha incorreta no login");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "🔑 Login");
        self.create_token(&user)
    }

    /// Perfil atual vindo do documento (não das claims).
    pub async fn me(&self, caller: &CurrentUser) -> Result<UserProfile, AppError> {
        self.store
            .read(|db| db.find_user(caller.id).map(UserProfile::from))
            .await
            .ok_or(AppError::NotFound("User"))
    }

    pub fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.into())
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

pub async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Senhas antigas do documento podem estar em texto puro.
pub async fn verify_password(password: String, stored: String) -> Result<bool, AppError> {
    if !is_bcrypt_hash(&stored) {
        return Ok(!stored.is_empty() && password == stored);
    }
    let valid = tokio::task::spawn_blocking(move || verify(&password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && ["$2a$", "$2b$", "$2x$", "$2y$"].iter().any(|p| value.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use std::sync::Arc;

    async fn service() -> AuthService {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();
        AuthService::new(store, "test-secret".into(), 8)
    }

    fn register(email: &str, password: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: Some(email.into()),
            password: Some(password.into()),
            name: None,
            first_name: Some("Ana".into()),
            last_name: Some("Souza".into()),
        }
    }

    fn login(email: &str, password: &str) -> LoginUserPayload {
        LoginUserPayload {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_a_token_with_the_user_claims() {
        let auth = service().await;
        let profile = auth.register_user(register("ana@x.com", "secret1")).await.unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.name, "Ana Souza");

        let token = auth.login_user(login("ana@x.com", "secret1")).await.unwrap();
        let current = auth.validate_token(&token).unwrap();
        assert_eq!(current.id, profile.id);
        assert_eq!(current.name, "Ana Souza");
        assert_eq!(current.role, Role::User);
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let auth = service().await;
        auth.register_user(register("ana@x.com", "secret1")).await.unwrap();
        let stored = auth
            .store
            .read(|db| db.users[0].password.clone())
            .await;
        assert_ne!(stored, "secret1");
        assert!(is_bcrypt_hash(&stored));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service().await;
        auth.register_user(register("ana@x.com", "secret1")).await.unwrap();
        let err = auth.register_user(register("ANA@x.com", "secret2")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn missing_name_parts_is_a_validation_error() {
        let auth = service().await;
        let mut payload = register("ana@x.com", "secret1");
        payload.first_name = None;
        payload.last_name = None;
        assert!(matches!(
            auth.register_user(payload).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let auth = service().await;
        auth.register_user(register("ana@x.com", "secret1")).await.unwrap();

        let wrong = auth.login_user(login("ana@x.com", "nope")).await.unwrap_err();
        let unknown = auth.login_user(login("bob@x.com", "secret1")).await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn legacy_plaintext_passwords_still_work() {
        assert!(verify_password("p".into(), "p".into()).await.unwrap());
        assert!(!verify_password("q".into(), "p".into()).await.unwrap());
        assert!(!verify_password("".into(), "".into()).await.unwrap());
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let auth = service().await;
        let profile = auth.register_user(register("ana@x.com", "secret1")).await.unwrap();
        let user = auth.store.read(|db| db.find_user(profile.id).cloned()).await.unwrap();

        let other = AuthService::new(auth.store.clone(), "another-secret".into(), 8);
        let foreign = other.create_token(&user).unwrap();
        assert!(matches!(auth.validate_token(&foreign), Err(AppError::InvalidToken)));
        assert!(matches!(auth.validate_token("garbage"), Err(AppError::InvalidToken)));

        let expired = AuthService::new(auth.store.clone(), "test-secret".into(), -1);
        let token = expired.create_token(&user).unwrap();
        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
    }
}
