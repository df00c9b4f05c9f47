// src/db/seed.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::SeedAdmin,
    db::Store,
    models::auth::{Role, User},
    services::auth::hash_password,
};

/// Cria o primeiro admin quando o documento ainda não tem usuários.
///
/// Devolve `true` se alguém foi criado.
pub async fn seed_admin(store: &Store, seed: &SeedAdmin) -> Result<bool, AppError> {
    if store.read(|db| !db.users.is_empty()).await {
        tracing::debug!("Seed ignorado: já existem usuários");
        return Ok(false);
    }

    let admin = User {
        id: Uuid::new_v4(),
        email: seed.email.trim().to_lowercase(),
        password: hash_password(seed.password.clone()).await?,
        name: seed.name.clone(),
        first_name: None,
        last_name: None,
        role: Role::Admin,
        avatar: None,
        created_at: Utc::now(),
    };
    let email = admin.email.clone();

    // Checa de novo dentro da transação: outro processo pode ter criado antes.
    let created = store
        .transaction(|db| {
            if !db.users.is_empty() {
                return Ok(false);
            }
            db.insert_user(admin);
            Ok(true)
        })
        .await?;

    if created {
        tracing::info!("🌱 Admin inicial criado: {}", email);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryBackend, services::auth::verify_password};
    use std::sync::Arc;

    fn seed() -> SeedAdmin {
        SeedAdmin {
            email: "Admin@Local.dev".into(),
            password: "admin123".into(),
            name: "Admin".into(),
        }
    }

    #[tokio::test]
    async fn seeds_only_an_empty_store() {
        let store = Store::open(Arc::new(MemoryBackend::new())).await.unwrap();

        assert!(seed_admin(&store, &seed()).await.unwrap());
        assert!(!seed_admin(&store, &seed()).await.unwrap());

        let (email, role, password) = store
            .read(|db| {
                let u = &db.users[0];
                (u.email.clone(), u.role, u.password.clone())
            })
            .await;
        assert_eq!(email, "admin@local.dev");
        assert_eq!(role, Role::Admin);
        assert!(verify_password("admin123".into(), password).await.unwrap());
        assert_eq!(store.read(|db| db.users.len()).await, 1);
    }
}
