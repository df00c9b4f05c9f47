// src/middleware/rbac.rs

//! Política de acesso. Toda decisão de papel passa por `authorize`.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{CurrentUser, Role},
};

// =============================================================================
//  ESCOPO DE LISTAGEM
// =============================================================================

/// Quais registros um papel enxerga numa listagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(Uuid),
}

impl Scope {
    pub fn admits(&self, owner: Option<Uuid>) -> bool {
        match self {
            Scope::All => true,
            Scope::OwnedBy(me) => owner == Some(*me),
        }
    }
}

pub fn scope(user: &CurrentUser) -> Scope {
    match user.role {
        Role::Admin | Role::Manager => Scope::All,
        Role::User => Scope::OwnedBy(user.id),
    }
}

// =============================================================================
//  AÇÕES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateTask,
    DeleteTask,
    BulkUpdateTasks,
    ReadTask { assignee: Option<Uuid> },
    UpdateTask { assignee: Option<Uuid> },

    DeleteLead,
    BulkUpdateLeads,
    ReadLead { owner: Option<Uuid> },
    UpdateLead { owner: Option<Uuid> },

    ListAllUsers,
    CreateUser,
    ChangeRole,
    UpdateUser { target: Uuid },

    ManageTeams,
    DeleteView { owner: Uuid },
}

fn is_staff(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Manager)
}

pub fn can(user: &CurrentUser, action: Action) -> bool {
    match action {
        Action::CreateTask
        | Action::DeleteTask
        | Action::BulkUpdateTasks
        | Action::DeleteLead
        | Action::BulkUpdateLeads
        | Action::ListAllUsers
        | Action::ManageTeams => is_staff(user.role),

        Action::ReadTask { assignee } | Action::UpdateTask { assignee } => {
            is_staff(user.role) || assignee == Some(user.id)
        }
        Action::ReadLead { owner } | Action::UpdateLead { owner } => {
            is_staff(user.role) || owner == Some(user.id)
        }

        Action::CreateUser | Action::ChangeRole => user.role == Role::Admin,
        Action::UpdateUser { target } => user.role == Role::Admin || target == user.id,

        // Views são pessoais, nem o admin apaga as dos outros.
        Action::DeleteView { owner } => owner == user.id,
    }
}

fn denial_message(action: Action) -> &'static str {
    match action {
        Action::CreateTask => "Only admin/manager can create tasks",
        Action::DeleteTask => "Only admin/manager can delete tasks",
        Action::BulkUpdateTasks | Action::BulkUpdateLeads => "Only admin/manager can bulk update",
        Action::DeleteLead => "Only admin/manager can delete leads",
        Action::CreateUser => "Only admin can create users",
        Action::ChangeRole => "Only admin can change roles",
        Action::ManageTeams => "Only admin/manager can manage teams",
        _ => "Forbidden",
    }
}

pub fn authorize(user: &CurrentUser, action: Action) -> Result<(), AppError> {
    if can(user, action) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = user.role.as_str(), ?action, "🚫 Acesso negado");
        Err(AppError::forbidden(denial_message(action)))
    }
}

// =============================================================================
//  EXTRATOR
// =============================================================================

/// Uma permissão estática, checada antes do handler.
pub trait PermissionDef: Send + Sync + 'static {
    fn action() -> Action;
}

/// Guardião de rota: `_: RequirePermission<PermCreateTask>`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(axum::http::header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        );

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::MissingToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        authorize(&user.0, T::action())
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermCreateTask;
impl PermissionDef for PermCreateTask {
    fn action() -> Action { Action::CreateTask }
}

pub struct PermBulkTasks;
impl PermissionDef for PermBulkTasks {
    fn action() -> Action { Action::BulkUpdateTasks }
}

pub struct PermBulkLeads;
impl PermissionDef for PermBulkLeads {
    fn action() -> Action { Action::BulkUpdateLeads }
}

pub struct PermCreateUser;
impl PermissionDef for PermCreateUser {
    fn action() -> Action { Action::CreateUser }
}

pub struct PermManageTeams;
impl PermissionDef for PermManageTeams {
    fn action() -> Action { Action::ManageTeams }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "x@x.com".into(),
            role,
            name: "X".into(),
        }
    }

    #[test]
    fn plain_users_only_touch_their_own_records() {
        let user = caller(Role::User);
        let other = Some(Uuid::new_v4());

        assert!(can(&user, Action::UpdateTask { assignee: Some(user.id) }));
        assert!(!can(&user, Action::UpdateTask { assignee: other }));
        assert!(!can(&user, Action::ReadTask { assignee: None }));
        assert!(can(&user, Action::ReadLead { owner: Some(user.id) }));
        assert!(!can(&user, Action::CreateTask));
        assert!(!can(&user, Action::DeleteTask));
        assert!(!can(&user, Action::BulkUpdateTasks));
        assert!(!can(&user, Action::ListAllUsers));
        assert!(!can(&user, Action::DeleteLead));
        assert!(!can(&user, Action::BulkUpdateLeads));
    }

    #[test]
    fn managers_run_the_pipeline_but_do_not_administer_users() {
        let manager = caller(Role::Manager);
        let someone = Uuid::new_v4();

        assert!(can(&manager, Action::CreateTask));
        assert!(can(&manager, Action::UpdateLead { owner: Some(someone) }));
        assert!(can(&manager, Action::ListAllUsers));
        assert!(can(&manager, Action::UpdateUser { target: manager.id }));
        assert!(!can(&manager, Action::UpdateUser { target: someone }));
        assert!(!can(&manager, Action::CreateUser));
        assert!(!can(&manager, Action::ChangeRole));
    }

    #[test]
    fn admin_is_unrestricted_except_for_other_peoples_views() {
        let admin = caller(Role::Admin);
        assert!(can(&admin, Action::CreateUser));
        assert!(can(&admin, Action::ChangeRole));
        assert!(can(&admin, Action::UpdateUser { target: Uuid::new_v4() }));
        assert!(!can(&admin, Action::DeleteView { owner: Uuid::new_v4() }));
        assert!(can(&admin, Action::DeleteView { owner: admin.id }));
    }

    #[test]
    fn denials_carry_a_specific_message() {
        let user = caller(Role::User);
        let err = authorize(&user, Action::CreateTask).unwrap_err();
        assert_eq!(err.to_string(), "Only admin/manager can create tasks");

        let manager = caller(Role::Manager);
        let err = authorize(&manager, Action::CreateUser).unwrap_err();
        assert_eq!(err.to_string(), "Only admin can create users");
    }

    #[test]
    fn scope_follows_role() {
        let user = caller(Role::User);
        assert_eq!(scope(&user), Scope::OwnedBy(user.id));
        assert_eq!(scope(&caller(Role::Manager)), Scope::All);
        assert!(!Scope::OwnedBy(user.id).admits(None));
    }
}
