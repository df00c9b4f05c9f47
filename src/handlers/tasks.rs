// src/handlers/tasks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppQuery, TaskUpdateForm},
        query::Page,
    },
    config::AppState,
    handlers::MessageResponse,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermBulkTasks, PermCreateTask, RequirePermission},
    },
    models::{
        activity::ActivityEntry,
        task::{CreateTaskPayload, Task, TaskBulkPayload, TaskChanges, TaskListQuery},
    },
    services::task_service::BulkResult,
};

// GET /tasks
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tarefas visíveis para o papel, filtradas e paginadas", body = Page<Task>),
        (status = 400, description = "Ordenação ou paginação inválida"),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(params): AppQuery<TaskListQuery>,
) -> Result<Json<Page<Task>>, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let query = params
        .into_list_query(app_state.config.default_page_size, app_state.config.max_page_size)
        .map_err(to_api)?;
    let page = app_state.task_service.list(&user, query).await.map_err(to_api)?;

    Ok(Json(page))
}

// POST /tasks
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = Task),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas admin/manager")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermCreateTask>,
    AppJson(payload): AppJson<CreateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let task = app_state
        .task_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

// GET /tasks/{id}
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa", body = Task),
        (status = 403, description = "Tarefa de outra pessoa"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = app_state
        .task_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

// PUT /tasks/{id}
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body(
        content = TaskChanges,
        description = "JSON, ou multipart/form-data com os mesmos campos e o arquivo em `attachment`"
    ),
    responses(
        (status = 200, description = "Tarefa atualizada", body = Task),
        (status = 400, description = "Dados inválidos, arquivo recusado ou falha sem evidência"),
        (status = 403, description = "Tarefa de outra pessoa"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    TaskUpdateForm(update): TaskUpdateForm,
) -> Result<Json<Task>, ApiError> {
    let task = app_state
        .task_service
        .update(&user, id, update)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

// DELETE /tasks/{id}
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa removida", body = MessageResponse),
        (status = 403, description = "Apenas admin/manager"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .task_service
        .delete(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::deleted()))
}

// POST /tasks/bulk
#[utoipa::path(
    post,
    path = "/tasks/bulk",
    tag = "Tasks",
    request_body = TaskBulkPayload,
    responses(
        (status = 200, description = "Tarefas atualizadas (ids desconhecidos são ignorados)", body = BulkResult<Task>),
        (status = 400, description = "Alguma tarefa ficaria `failed` sem evidência"),
        (status = 403, description = "Apenas admin/manager")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn bulk_update_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermBulkTasks>,
    AppJson(payload): AppJson<TaskBulkPayload>,
) -> Result<Json<BulkResult<Task>>, ApiError> {
    let result = app_state
        .task_service
        .bulk_update(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /tasks/{id}/activity
#[utoipa::path(
    get,
    path = "/tasks/{id}/activity",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Histórico da tarefa, do mais antigo ao mais novo", body = Vec<ActivityEntry>),
        (status = 403, description = "Tarefa de outra pessoa"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn task_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let activity = app_state
        .task_service
        .activity(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(activity))
}
