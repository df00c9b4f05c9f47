// src/services/team_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::Store,
    middleware::rbac::{authorize, Action},
    models::{
        auth::CurrentUser,
        team::{unique_members, CreateTeamPayload, Team, UpdateTeamPayload},
    },
};

#[derive(Clone)]
pub struct TeamService {
    store: Store,
}

impl TeamService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<Team> {
        self.store.read(|db| db.teams.clone()).await
    }

    pub async fn create(&self, caller: &CurrentUser, payload: CreateTeamPayload) -> Result<Team, AppError> {
        authorize(caller, Action::ManageTeams)?;
        payload.validate()?;

        let team = Team {
            id: Uuid::new_v4(),
            name: payload.name.unwrap_or_default().trim().to_string(),
            members: unique_members(payload.members),
            created_at: Utc::now(),
        };

        let team = self
            .store
            .transaction(|db| {
                db.insert_team(team.clone());
                Ok(team)
            })
            .await?;

        tracing::info!(team_id = %team.id, actor = %caller.id, "👥 Time criado: {}", team.name);
        Ok(team)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        payload: UpdateTeamPayload,
    ) -> Result<Team, AppError> {
        let team = self
            .store
            .transaction(|db| {
                let team = db.team_mut(id).ok_or(AppError::NotFound("Team"))?;
                authorize(caller, Action::ManageTeams)?;
                payload.validate()?;

                if let Some(name) = &payload.name {
                    team.name = name.trim().to_string();
                }
                if let Some(members) = &payload.members {
                    team.members = unique_members(members.clone());
                }
                Ok(team.clone())
            })
            .await?;

        tracing::info!(team_id = %team.id, actor = %caller.id, "👥 Time atualizado");
        Ok(team)
    }
}
