// src/db/team_repo.rs

use uuid::Uuid;

use crate::{db::store::Database, models::team::Team};

impl Database {
    pub fn team_mut(&mut self, id: Uuid) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    pub fn insert_team(&mut self, team: Team) {
        self.teams.push(team);
    }
}
