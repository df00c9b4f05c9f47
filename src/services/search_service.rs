// src/services/search_service.rs

use crate::{
    common::query::{contains_ci, RecordFilter},
    db::Store,
    middleware::rbac::{can, scope, Action},
    models::{
        auth::{CurrentUser, UserProfile},
        dashboard::SearchResults,
        lead::LeadFilter,
        task::TaskFilter,
    },
};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct SearchService {
    store: Store,
}

impl SearchService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Busca global nas três coleções. Sem `q`, devolve listas vazias.
    pub async fn search(&self, caller: &CurrentUser, q: Option<&str>, limit: Option<usize>) -> SearchResults {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) else {
            return SearchResults { tasks: vec![], leads: vec![], users: vec![] };
        };

        let scope = scope(caller);
        let see_all_users = can(caller, Action::ListAllUsers);
        let task_filter = TaskFilter::text(q);
        let lead_filter = LeadFilter::text(q);

        self.store
            .read(|db| SearchResults {
                tasks: db
                    .tasks
                    .iter()
                    .filter(|t| scope.admits(t.assigned_to) && task_filter.matches(*t))
                    .take(limit)
                    .cloned()
                    .collect(),
                leads: db
                    .leads
                    .iter()
                    .filter(|l| scope.admits(l.owner) && lead_filter.matches(*l))
                    .take(limit)
                    .cloned()
                    .collect(),
                users: db
                    .users
                    .iter()
                    .filter(|u| see_all_users || u.id == caller.id)
                    .filter(|u| contains_ci(&u.name, q) || contains_ci(&u.email, q))
                    .take(limit)
                    .map(UserProfile::from)
                    .collect(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{Database, MemoryBackend},
        models::{auth::{Role, User}, task::Task},
    };
    use chrono::Utc;
    use std::sync::Arc;
    use uuid::Uuid;

    fn user(name: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@x.com", name.to_lowercase()),
            password: "p".into(),
            name: name.into(),
            first_name: None,
            last_name: None,
            role,
            avatar: None,
            created_at: Utc::now(),
        }
    }

    fn task(title: &str, assigned_to: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            status: Default::default(),
            priority: Default::default(),
            due_date: None,
            assigned_to,
            description: String::new(),
            lead_id: None,
            tags: vec![],
            reason: None,
            attachment: None,
            activity: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn search_is_scoped_and_limited() {
        let ana = user("Ana", Role::User);
        let me = CurrentUser { id: ana.id, email: ana.email.clone(), role: Role::User, name: ana.name.clone() };

        let mut db = Database::default();
        db.users.push(ana.clone());
        db.users.push(user("Anabela", Role::Manager));
        for i in 0..3 {
            db.tasks.push(task(&format!("Proposta {i}"), Some(ana.id)));
        }
        db.tasks.push(task("Proposta alheia", None));

        let store = Store::open(Arc::new(MemoryBackend::with_data(db))).await.unwrap();
        let search = SearchService::new(store);

        let found = search.search(&me, Some("proposta"), Some(2)).await;
        assert_eq!(found.tasks.len(), 2);
        assert!(found.tasks.iter().all(|t| t.assigned_to == Some(ana.id)));

        let people = search.search(&me, Some("ana"), None).await;
        assert_eq!(people.users.len(), 1);

        let empty = search.search(&me, Some("  "), None).await;
        assert!(empty.tasks.is_empty() && empty.users.is_empty());
    }
}
