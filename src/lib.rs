// src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{
    config::AppState,
    docs::ApiDoc,
    middleware::auth::auth_guard,
    services::upload_service::PUBLIC_PREFIX,
};

/// Monta todas as rotas sobre o estado já construído.
pub fn router(app_state: AppState) -> Router {
    let config = app_state.config.clone();

    // Rotas públicas
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/health", get(|| async { "OK" }));

    // Tudo aqui exige Bearer
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route("/tasks/bulk", post(handlers::tasks::bulk_update_tasks))
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/tasks/{id}/activity", get(handlers::tasks::task_activity))
        .route(
            "/leads",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route("/leads/bulk", post(handlers::leads::bulk_update_leads))
        .route(
            "/leads/{id}",
            get(handlers::leads::get_lead)
                .put(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route("/leads/{id}/activity", get(handlers::leads::lead_activity))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/me", put(handlers::users::update_me))
        .route("/users/{id}", put(handlers::users::update_user))
        .route(
            "/teams",
            get(handlers::teams::list_teams).post(handlers::teams::create_team),
        )
        .route("/teams/{id}", put(handlers::teams::update_team))
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/read-all", post(handlers::notifications::mark_all_read))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read))
        .route("/notify/email", post(handlers::notifications::mock_email))
        .route("/notify/whatsapp", post(handlers::notifications::mock_whatsapp))
        .route(
            "/views",
            get(handlers::views::list_views).post(handlers::views::create_view),
        )
        .route("/views/{id}", delete(handlers::views::delete_view))
        .route("/dashboard/summary", get(handlers::dashboard::get_summary))
        .route("/search", get(handlers::dashboard::search))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(app_state.uploads.dir()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
