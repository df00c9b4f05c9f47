// src/config.rs

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::http::HeaderValue;

use crate::{
    common::i18n::I18nStore,
    db::{seed, JsonFileBackend, Store},
    services::{
        auth::AuthService, dashboard_service::DashboardService, lead_service::LeadService,
        notification_service::NotificationService, search_service::SearchService,
        task_service::TaskService, team_service::TeamService, upload_service::UploadStore,
        user_service::UserService, view_service::ViewService,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Valor inválido para a variável de ambiente {0}: {1}")]
    InvalidValue(String, String),
    #[error("Variáveis SEED_ADMIN_EMAIL e SEED_ADMIN_PASSWORD devem vir juntas")]
    IncompleteSeed,
}

/// Conta admin criada na primeira subida, com o documento vazio.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_upload_bytes: usize,
    pub cors_origin: HeaderValue,
    pub seed_admin: Option<SeedAdmin>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 4000)),
            data_path: PathBuf::from("./data/db.json"),
            upload_dir: PathBuf::from("./uploads"),
            jwt_secret: "dev-secret".to_string(),
            token_ttl_hours: 8,
            default_page_size: 10,
            max_page_size: 500,
            max_upload_bytes: 10 * 1024 * 1024,
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            seed_admin: None,
        }
    }
}

impl Config {
    /// Lê o `.env` (se existir) e as variáveis de ambiente.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        // Variável vazia conta como ausente
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = match (var("BIND_ADDRESS"), var("PORT")) {
            (Some(addr), _) => parse("BIND_ADDRESS", &addr)?,
            (None, Some(port)) => SocketAddr::from(([0, 0, 0, 0], parse::<u16>("PORT", &port)?)),
            (None, None) => defaults.bind_address,
        };

        let cors_origin = match var("CORS_ORIGIN") {
            Some(origin) => HeaderValue::from_str(&origin)
                .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".into(), e.to_string()))?,
            None => defaults.cors_origin,
        };

        let seed_admin = match (var("SEED_ADMIN_EMAIL"), var("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin {
                email,
                password,
                name: var("SEED_ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSeed),
        };

        let config = Self {
            bind_address,
            data_path: var("DATA_PATH").map(PathBuf::from).unwrap_or(defaults.data_path),
            upload_dir: var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            jwt_secret: var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl_hours: optional("TOKEN_TTL_HOURS", var("TOKEN_TTL_HOURS"), defaults.token_ttl_hours)?,
            default_page_size: optional("DEFAULT_PAGE_SIZE", var("DEFAULT_PAGE_SIZE"), defaults.default_page_size)?,
            max_page_size: optional("MAX_PAGE_SIZE", var("MAX_PAGE_SIZE"), defaults.max_page_size)?,
            max_upload_bytes: optional("MAX_UPLOAD_BYTES", var("MAX_UPLOAD_BYTES"), defaults.max_upload_bytes)?,
            cors_origin,
            seed_admin,
        };

        if config.token_ttl_hours < 1 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS".into(), "deve ser >= 1".into()));
        }
        if config.default_page_size < 1 || config.default_page_size > config.max_page_size {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_PAGE_SIZE".into(),
                format!("deve ficar entre 1 e {}", config.max_page_size),
            ));
        }

        Ok(config)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn optional<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse(key, &raw))
}

// =============================================================================
//  ESTADO DA APLICAÇÃO
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub uploads: UploadStore,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub task_service: TaskService,
    pub lead_service: LeadService,
    pub user_service: UserService,
    pub team_service: TeamService,
    pub notification_service: NotificationService,
    pub view_service: ViewService,
    pub dashboard_service: DashboardService,
    pub search_service: SearchService,
}

impl AppState {
    /// Abre o documento JSON em disco, roda o seed e prepara o diretório de uploads.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let backend = Arc::new(JsonFileBackend::new(config.data_path.clone()));
        let store = Store::open(backend).await?;
        tracing::info!("✅ Documento aberto em {}", config.data_path.display());

        if let Some(seed_admin) = &config.seed_admin {
            seed::seed_admin(&store, seed_admin).await?;
        }

        let state = Self::with_store(config, store);
        state.uploads.ensure_dir().await?;
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(config: Config, store: Store) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone());

        Self {
            auth_service: AuthService::new(store.clone(), config.jwt_secret.clone(), config.token_ttl_hours),
            task_service: TaskService::new(store.clone(), uploads.clone()),
            lead_service: LeadService::new(store.clone()),
            user_service: UserService::new(store.clone(), uploads.clone()),
            team_service: TeamService::new(store.clone()),
            notification_service: NotificationService::new(store.clone()),
            view_service: ViewService::new(store.clone()),
            dashboard_service: DashboardService::new(store.clone()),
            search_service: SearchService::new(store.clone()),
            i18n_store: Arc::new(I18nStore::new()),
            config: Arc::new(config),
            uploads,
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 4000);
        assert_eq!(config.max_page_size, 500);
        assert_eq!(config.jwt_secret, "dev-secret");
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn port_alone_is_accepted() {
        let config = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.bind_address.port(), 8080);

        let config =
            Config::from_lookup(lookup(&[("PORT", "8080"), ("BIND_ADDRESS", "127.0.0.1:9000")])).unwrap();
        assert_eq!(config.bind_address.port(), 9000);
    }

    #[test]
    fn invalid_values_fail_with_the_variable_name() {
        let err = Config::from_lookup(lookup(&[("MAX_PAGE_SIZE", "muitos")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_PAGE_SIZE"));

        let err = Config::from_lookup(lookup(&[("SEED_ADMIN_EMAIL", "a@b.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteSeed));
    }
}
