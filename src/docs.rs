// src/docs.rs

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Tasks ---
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::bulk_update_tasks,
        handlers::tasks::task_activity,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::bulk_update_leads,
        handlers::leads::lead_activity,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::update_me,

        // --- Teams ---
        handlers::teams::list_teams,
        handlers::teams::create_team,
        handlers::teams::update_team,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::notifications::mock_email,
        handlers::notifications::mock_whatsapp,

        // --- Views ---
        handlers::views::list_views,
        handlers::views::create_view,
        handlers::views::delete_view,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::search,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserProfile,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::ProfilePayload,

            // --- Tasks ---
            models::task::TaskStatus,
            models::task::TaskPriority,
            models::task::Task,
            models::task::CreateTaskPayload,
            models::task::TaskChanges,
            models::task::TaskBulkPayload,

            // --- Leads ---
            models::lead::LeadStage,
            models::lead::Lead,
            models::lead::CreateLeadPayload,
            models::lead::LeadChanges,
            models::lead::LeadBulkPayload,

            // --- Compartilhados ---
            models::activity::ActivityAction,
            models::activity::ActivityEntry,
            models::attachment::Attachment,
            handlers::MessageResponse,

            // --- Teams / Notifications / Views ---
            models::team::Team,
            models::team::CreateTeamPayload,
            models::team::UpdateTeamPayload,
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::ReadAllResponse,
            models::notification::DeliveryReceipt,
            models::view::SavedView,
            models::view::CreateViewPayload,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::SearchResults,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Tasks", description = "Tarefas, evidências e histórico"),
        (name = "Leads", description = "Funil de leads e histórico"),
        (name = "Users", description = "Usuários e Perfil"),
        (name = "Teams", description = "Times"),
        (name = "Notifications", description = "Avisos por usuário e broadcast"),
        (name = "Views", description = "Filtros salvos por página"),
        (name = "Dashboard", description = "Indicadores e busca global")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Token de sessão do CRM: devolvido por `/auth/login` e enviado como `Bearer`.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let session_token = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some(
                "Token do CRM emitido por POST /auth/login (HS256, claims id/email/role/name, expira em TOKEN_TTL_HOURS)",
            ))
            .build();
        components.add_security_scheme("api_jwt", SecurityScheme::Http(session_token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/tasks", "/tasks/{id}", "/tasks/bulk", "/users/me", "/search", "/dashboard/summary", "/notify/email"] {
            assert!(doc.paths.paths.contains_key(path), "sem documentação: {}", path);
        }
        let components = doc.components.expect("components");
        match components.security_schemes.get("api_jwt") {
            Some(SecurityScheme::Http(http)) => {
                assert_eq!(http.bearer_format.as_deref(), Some("JWT"));
                assert!(http.description.as_deref().is_some_and(|d| d.contains("/auth/login")));
            }
            other => panic!("esquema inesperado: {:?}", other),
        }
    }
}
