// src/db/lead_repo.rs

use uuid::Uuid;

use crate::{db::store::Database, models::lead::Lead};

impl Database {
    pub fn find_lead(&self, id: Uuid) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    pub fn lead_mut(&mut self, id: Uuid) -> Option<&mut Lead> {
        self.leads.iter_mut().find(|l| l.id == id)
    }

    pub fn insert_lead(&mut self, lead: Lead) {
        self.leads.push(lead);
    }

    pub fn remove_lead(&mut self, id: Uuid) -> Option<Lead> {
        let idx = self.leads.iter().position(|l| l.id == id)?;
        Some(self.leads.remove(idx))
    }
}
