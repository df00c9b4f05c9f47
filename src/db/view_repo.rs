// src/db/view_repo.rs

use uuid::Uuid;

use crate::{db::store::Database, models::view::SavedView};

impl Database {
    pub fn find_view(&self, id: Uuid) -> Option<&SavedView> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn insert_view(&mut self, view: SavedView) {
        self.views.push(view);
    }

    pub fn remove_view(&mut self, id: Uuid) -> Option<SavedView> {
        let idx = self.views.iter().position(|v| v.id == id)?;
        Some(self.views.remove(idx))
    }
}
