// src/db/store.rs

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::{
    common::error::AppError,
    models::{
        auth::User, lead::Lead, notification::Notification, task::Task, team::Team,
        view::SavedView,
    },
};

// O documento inteiro. Cada coleção mantém a ordem de inserção.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub views: Vec<SavedView>,
}

// =============================================================================
//  BACKENDS
// =============================================================================

/// Onde o documento é persistido.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// `None` quando ainda não existe nada salvo.
    async fn load(&self) -> Result<Option<Database>, AppError>;
    async fn save(&self, db: &Database) -> Result<(), AppError>;
}

/// Arquivo JSON único, reescrito inteiro a cada mutação.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<Database>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, db: &Database) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(db)?;
        let tmp = self.temp_path();
        // Escreve ao lado e troca: um crash no meio nunca deixa JSON pela metade.
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Backend em memória para testes. Guarda a última versão salva.
#[derive(Default)]
pub struct MemoryBackend {
    initial: Option<Database>,
    saved: Mutex<Option<Database>>,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(db: Database) -> Self {
        Self {
            initial: Some(db),
            ..Self::default()
        }
    }

    /// Faz os próximos `save` falharem (simula disco cheio).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn last_saved(&self) -> Option<Database> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Database>, AppError> {
        // Como o arquivo: depois do primeiro save, é ele que volta.
        let saved = self.saved.lock().await.clone();
        Ok(saved.or_else(|| self.initial.clone()))
    }

    async fn save(&self, db: &Database) -> Result<(), AppError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Io(std::io::Error::other("memory backend refused save")));
        }
        *self.saved.lock().await = Some(db.clone());
        Ok(())
    }
}

// =============================================================================
//  STORE
// =============================================================================

/// O documento em memória + o backend. Um escritor por vez.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<Database>>,
    backend: Arc<dyn DocumentBackend>,
}

impl Store {
    pub async fn open(backend: Arc<dyn DocumentBackend>) -> Result<Self, AppError> {
        let db = backend.load().await?.unwrap_or_default();
        tracing::info!(
            users = db.users.len(),
            tasks = db.tasks.len(),
            leads = db.leads.len(),
            "📂 Documento carregado"
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(db)),
            backend,
        })
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Roda `f` numa cópia do documento, persiste a cópia e só então a publica.
    ///
    /// Se `f` ou o `save` falharem, memória e disco ficam como estavam.
    pub async fn transaction<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Database) -> Result<R, AppError>,
    {
        let mut guard = self.inner.write().await;
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        self.backend.save(&draft).await?;
        *guard = draft;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::team::Team;
    use chrono::Utc;
    use uuid::Uuid;

    fn team(name: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: name.into(),
            members: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn failed_closure_leaves_document_untouched() {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();

        let result: Result<(), AppError> = store
            .transaction(|db| {
                db.teams.push(team("A"));
                Err(AppError::validation("nope"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.read(|db| db.teams.len()).await, 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_memory_untouched() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Store::open(backend.clone()).await.unwrap();
        backend.fail_saves(true);

        let result = store
            .transaction(|db| {
                db.teams.push(team("A"));
                Ok(())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.read(|db| db.teams.len()).await, 0);
        assert!(backend.last_saved().await.is_none());
    }

    #[tokio::test]
    async fn reopening_a_backend_sees_the_last_commit() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Store::open(backend.clone()).await.unwrap();
        store
            .transaction(|db| {
                db.teams.push(team("A"));
                Ok(())
            })
            .await
            .unwrap();

        let reopened = Store::open(backend.clone()).await.unwrap();
        assert_eq!(reopened.read(|db| db.teams.len()).await, 1);
        assert_eq!(backend.last_saved().await.map(|db| db.teams.len()), Some(1));
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transaction(|db| {
                        db.teams.push(team(&format!("T{i}")));
                        Ok(())
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.read(|db| db.teams.len()).await, 20);
    }

    #[tokio::test]
    async fn json_file_round_trips_and_tolerates_missing_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("db.json");

        let backend = JsonFileBackend::new(&path);
        assert!(backend.load().await.unwrap().is_none());

        let store = Store::open(Arc::new(JsonFileBackend::new(&path))).await.unwrap();
        store
            .transaction(|db| {
                db.teams.push(team("Vendas"));
                Ok(())
            })
            .await
            .unwrap();

        let reloaded = JsonFileBackend::new(&path).load().await.unwrap().unwrap();
        assert_eq!(reloaded.teams[0].name, "Vendas");
        assert!(!path.with_file_name("db.json.tmp").exists());

        std::fs::write(&path, r#"{"users": []}"#).unwrap();
        let partial = JsonFileBackend::new(&path).load().await.unwrap().unwrap();
        assert!(partial.tasks.is_empty() && partial.views.is_empty());
    }
}
