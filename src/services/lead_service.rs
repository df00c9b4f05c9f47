// src/services/lead_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        query::{self, ListQuery, Page},
    },
    db::Store,
    middleware::rbac::{authorize, scope, Action, Scope},
    models::{
        activity::{summarize, ActivityAction, ActivityEntry},
        auth::CurrentUser,
        lead::{CreateLeadPayload, Lead, LeadBulkPayload, LeadChanges, LeadFilter},
        notification::NotificationKind,
    },
    services::task_service::{dedup_ids, BulkResult},
};

#[derive(Clone)]
pub struct LeadService {
    store: Store,
}

impl LeadService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        caller: &CurrentUser,
        query: ListQuery<LeadFilter>,
    ) -> Result<Page<Lead>, AppError> {
        let scope = scope(caller);
        Ok(self
            .store
            .read(|db| query::run(&db.leads, scope, &query))
            .await)
    }

    pub async fn get(&self, caller: &CurrentUser, id: Uuid) -> Result<Lead, AppError> {
        let lead = self
            .store
            .read(|db| db.find_lead(id).cloned())
            .await
            .ok_or(AppError::NotFound("Lead"))?;
        authorize(caller, Action::ReadLead { owner: lead.owner })?;
        Ok(lead)
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        payload: CreateLeadPayload,
    ) -> Result<Lead, AppError> {
        payload.validate()?;

        let name = payload.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name required"));
        }

        // Quem só enxerga os próprios leads só cria leads para si.
        let owner = match scope(caller) {
            Scope::OwnedBy(me) => me,
            Scope::All => payload.owner.unwrap_or(caller.id),
        };

        let lead = Lead {
            id: Uuid::new_v4(),
            name,
            email: payload.email,
            phone: payload.phone,
            stage: payload.stage.unwrap_or_default(),
            owner: Some(owner),
            tags: payload.tags.map(|t| t.into_inner()).unwrap_or_default(),
            activity: vec![ActivityEntry::new(caller.id, ActivityAction::Created, "Lead created")],
            created_at: Utc::now(),
        };

        let created = self
            .store
            .transaction(|db| {
                db.notify(
                    lead.owner,
                    NotificationKind::LeadCreated,
                    format!("New lead \"{}\" assigned to you", lead.name),
                );
                db.insert_lead(lead.clone());
                Ok(lead)
            })
            .await?;

        tracing::info!(lead_id = %created.id, actor = %caller.id, "✅ Lead criado");
        Ok(created)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        changes: LeadChanges,
    ) -> Result<Lead, AppError> {
        let lead = self
            .store
            .transaction(|db| {
                let lead = db.lead_mut(id).ok_or(AppError::NotFound("Lead"))?;
                authorize(caller, Action::UpdateLead { owner: lead.owner })?;
                changes.check()?;

                let previous_stage = lead.stage;
                let diff = lead.apply(&changes);
                lead.activity.push(ActivityEntry::new(
                    caller.id,
                    ActivityAction::Updated,
                    summarize(&diff, "No changes"),
                ));
                let snapshot = lead.clone();

                if previous_stage != snapshot.stage && snapshot.owner.is_some() {
                    db.notify(
                        snapshot.owner,
                        NotificationKind::LeadStage,
                        format!("Lead \"{}\" moved to {}", snapshot.name, snapshot.stage),
                    );
                }
                Ok(snapshot)
            })
            .await?;

        tracing::info!(lead_id = %lead.id, actor = %caller.id, "✏️ Lead atualizado");
        Ok(lead)
    }

    /// Lote: só histórico, sem notificações.
    pub async fn bulk_update(
        &self,
        caller: &CurrentUser,
        payload: LeadBulkPayload,
    ) -> Result<BulkResult<Lead>, AppError> {
        authorize(caller, Action::BulkUpdateLeads)?;
        let changes = payload.updates;
        changes.check()?;
        let ids = dedup_ids(payload.ids);

        let items = self
            .store
            .transaction(|db| {
                let mut items = Vec::new();
                for id in &ids {
                    let Some(lead) = db.lead_mut(*id) else {
                        continue;
                    };
                    let diff = lead.apply(&changes);
                    lead.activity.push(ActivityEntry::new(
                        caller.id,
                        ActivityAction::BulkUpdate,
                        summarize(&diff, "Bulk update"),
                    ));
                    items.push(lead.clone());
                }
                Ok(items)
            })
            .await?;

        tracing::info!(actor = %caller.id, updated = items.len(), "📦 Leads atualizados em lote");
        Ok(BulkResult {
            updated: items.len(),
            items,
        })
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        self.store
            .transaction(|db| {
                if db.find_lead(id).is_none() {
                    return Err(AppError::NotFound("Lead"));
                }
                authorize(caller, Action::DeleteLead)?;
                db.remove_lead(id);
                Ok(())
            })
            .await?;

        tracing::info!(lead_id = %id, actor = %caller.id, "🗑️ Lead removido");
        Ok(())
    }

    pub async fn activity(&self, caller: &CurrentUser, id: Uuid) -> Result<Vec<ActivityEntry>, AppError> {
        Ok(self.get(caller, id).await?.activity)
    }
}
