// src/db/user_repo.rs

use uuid::Uuid;

use crate::{db::store::Database, models::auth::User};

// Acesso à coleção `users`
impl Database {
    pub fn find_user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    // E-mail é comparado sem diferenciar maiúsculas
    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
    }

    /// Outro usuário (que não `except`) já usa este e-mail?
    pub fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.find_user_by_email(email)
            .is_some_and(|u| Some(u.id) != except)
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.push(user);
    }
}
