// tests/api.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crm_backend::{
    config::{AppState, Config},
    db::{Database, MemoryBackend, Store},
    models::auth::{Role, User},
};

const BOUNDARY: &str = "XBOUNDARYX";

struct TestApp {
    router: Router,
    store: Store,
    uploads: TempDir,
}

fn user(email: &str, password: &str, role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.into(),
        // Texto puro: o login aceita senhas legadas
        password: password.into(),
        name: email.split('@').next().unwrap_or_default().into(),
        first_name: None,
        last_name: None,
        role,
        avatar: None,
        created_at: Utc::now(),
    }
}

async fn spawn_app(users: Vec<User>) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let db = Database {
        users,
        ..Default::default()
    };
    let store = Store::open(Arc::new(MemoryBackend::with_data(db))).await.unwrap();
    let config = Config {
        upload_dir: uploads.path().to_path_buf(),
        ..Config::default()
    };
    let state = AppState::with_store(config, store.clone());
    TestApp {
        router: crm_backend::router(state),
        store,
        uploads,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .json(Method::POST, "/auth/login", None, Some(json!({"email": email, "password": password})))
            .await;
        assert_eq!(status, StatusCode::OK, "login falhou: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((field, file_name, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn multipart_request(uri: &str, token: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let app = spawn_app(vec![]).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = app.json(Method::GET, "/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token");

    let (status, body) = app.json(Method::GET, "/tasks", Some("lixo"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn register_then_login_and_wrong_password_is_rejected() {
    let app = spawn_app(vec![]).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "ana@x.com", "password": "segredo", "firstName": "Ana", "lastName": "Souza"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Ana Souza");
    assert_eq!(body["role"], "user");
    assert!(body.get("password").is_none());

    let (status, body) = app
        .json(Method::POST, "/auth/register", None, Some(json!({"email": "ANA@x.com", "password": "segredo", "name": "Outra"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = app
        .json(Method::POST, "/auth/login", None, Some(json!({"email": "ana@x.com", "password": "errada"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let token = app.login("ana@x.com", "segredo").await;
    let (status, body) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ana@x.com");
}

#[tokio::test]
async fn admin_creates_manager_who_assigns_a_task() {
    let plain = user("joao@x.com", "p", Role::User);
    let plain_id = plain.id;
    let app = spawn_app(vec![user("admin@x.com", "admin", Role::Admin), plain]).await;
    let admin = app.login("admin@x.com", "admin").await;

    let (status, manager) = app
        .json(
            Method::POST,
            "/users",
            Some(&admin),
            Some(json!({"email": "m@x.com", "password": "p", "name": "M", "role": "manager"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(manager["role"], "manager");

    let manager_token = app.login("m@x.com", "p").await;
    let (status, task) = app
        .json(
            Method::POST,
            "/tasks",
            Some(&manager_token),
            Some(json!({"title": "Ligar para cliente", "assignedTo": plain_id, "tags": "vip, sla"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["tags"], json!(["vip", "sla"]));

    let user_token = app.login("joao@x.com", "p").await;
    let (status, page) = app.json(Method::GET, "/tasks", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Ligar para cliente");

    let (_, notifications) = app.json(Method::GET, "/notifications", Some(&user_token), None).await;
    assert_eq!(notifications[0]["type"], "task-assigned");
    assert_eq!(notifications[0]["read"], false);

    // Manager não cria usuários
    let (status, body) = app
        .json(Method::POST, "/users", Some(&manager_token), Some(json!({"email": "z@x.com", "password": "p"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only admin can create users");
}

#[tokio::test]
async fn plain_users_are_scoped_to_their_own_tasks() {
    let me = user("eu@x.com", "p", Role::User);
    let my_id = me.id;
    let app = spawn_app(vec![user("boss@x.com", "p", Role::Manager), me]).await;
    let boss = app.login("boss@x.com", "p").await;
    let token = app.login("eu@x.com", "p").await;

    let (_, mine) = app
        .json(Method::POST, "/tasks", Some(&boss), Some(json!({"title": "Minha", "assignedTo": my_id})))
        .await;
    let (_, other) = app
        .json(Method::POST, "/tasks", Some(&boss), Some(json!({"title": "Alheia"})))
        .await;

    let (status, body) = app
        .json(Method::POST, "/tasks", Some(&token), Some(json!({"title": "Nova"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only admin/manager can create tasks");

    let (_, page) = app.json(Method::GET, "/tasks", Some(&token), None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], mine["id"]);

    let other_uri = format!("/tasks/{}", other["id"].as_str().unwrap());
    let (status, _) = app.json(Method::GET, &other_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/tasks/{}", Uuid::new_v4());
    let (status, body) = app.json(Method::GET, &missing, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (_, users) = app.json(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_a_task_requires_evidence_and_accepts_a_multipart_upload() {
    let app = spawn_app(vec![user("boss@x.com", "p", Role::Manager)]).await;
    let boss = app.login("boss@x.com", "p").await;
    let (_, task) = app
        .json(Method::POST, "/tasks", Some(&boss), Some(json!({"title": "Entrega"})))
        .await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = app
        .json(Method::PUT, &uri, Some(&boss), Some(json!({"status": "failed", "reason": "cliente sumiu"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Evidence attachment is required when marking failed");

    // Nada mudou: nem status, nem histórico
    let (_, unchanged) = app.json(Method::GET, &uri, Some(&boss), None).await;
    assert_eq!(unchanged["status"], "todo");
    assert_eq!(unchanged["activity"].as_array().unwrap().len(), 1);

    // Tipo recusado não deixa arquivo para trás
    let body = multipart(&[("status", "failed")], Some(("attachment", "virus.exe", "application/x-msdownload", &b"MZ"[..])));
    let (status, body) = app.send(multipart_request(&uri, &boss, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid file type");
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);

    let body = multipart(
        &[("status", "failed"), ("reason", "cliente sumiu")],
        Some(("attachment", "prova final.pdf", "application/pdf", &b"%PDF-1.4"[..])),
    );
    let (status, updated) = app.send(multipart_request(&uri, &boss, body)).await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "failed");
    assert_eq!(updated["reason"], "cliente sumiu");
    assert_eq!(updated["attachment"]["filename"], "prova final.pdf");

    let url = updated["attachment"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with("-prova_final.pdf"));
    let response = app
        .router
        .clone()
        .oneshot(Request::get(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, activity) = app.json(Method::GET, &format!("{uri}/activity"), Some(&boss), None).await;
    assert_eq!(activity.as_array().unwrap().len(), 2);
    assert_eq!(activity[1]["action"], "updated");
}

#[tokio::test]
async fn bulk_update_and_list_pagination() {
    let app = spawn_app(vec![user("boss@x.com", "p", Role::Admin)]).await;
    let boss = app.login("boss@x.com", "p").await;

    let mut ids = Vec::new();
    for title in ["b", "a", "c"] {
        let (_, task) = app
            .json(Method::POST, "/tasks", Some(&boss), Some(json!({"title": title})))
            .await;
        ids.push(task["id"].clone());
    }

    let (status, result) = app
        .json(
            Method::POST,
            "/tasks/bulk",
            Some(&boss),
            Some(json!({"ids": [ids[0], ids[1], Uuid::new_v4()], "updates": {"status": "done"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["updated"], 2);

    let (status, body) = app
        .json(Method::POST, "/tasks/bulk", Some(&boss), Some(json!({"ids": ids, "updates": {"status": "failed"}})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Evidence attachment is required when marking failed");

    let (status, page) = app
        .json(Method::GET, "/tasks?sortBy=title&sortDir=desc&page=1&pageSize=2", Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["pageSize"], 2);
    assert_eq!(page["items"][0]["title"], "c");
    assert_eq!(page["items"][1]["title"], "b");

    let (_, done) = app.json(Method::GET, "/tasks?status=DONE&priority=", Some(&boss), None).await;
    assert_eq!(done["total"], 2);

    let (status, _) = app.json(Method::GET, "/tasks?sortBy=nope", Some(&boss), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, summary) = app.json(Method::GET, "/dashboard/summary", Some(&boss), None).await;
    assert_eq!(summary["totalTasks"], 3);
    assert_eq!(summary["completionRate"], 67);

    let stored = app.store.read(|db| db.tasks.len()).await;
    assert_eq!(stored, 3);
}

#[tokio::test]
async fn profile_update_accepts_an_avatar_form() {
    let app = spawn_app(vec![user("eu@x.com", "p", Role::User)]).await;
    let token = app.login("eu@x.com", "p").await;

    let body = multipart(&[("firstName", "Eu"), ("name", "Eu Mesmo")], Some(("avatar", "foto.png", "image/png", &b"\x89PNG"[..])));
    let (status, profile) = app.send(multipart_request("/users/me", &token, body)).await;
    assert_eq!(status, StatusCode::OK, "{}", profile);
    assert_eq!(profile["name"], "Eu Mesmo");
    assert_eq!(profile["avatar"]["mime"], "image/png");

    // PDF é evidência, não avatar
    let body = multipart(&[], Some(("avatar", "foto.pdf", "application/pdf", &b"%PDF"[..])));
    let (status, _) = app.send(multipart_request("/users/me", &token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = app
        .json(Method::PUT, "/users/me", Some(&token), Some(json!({"removeAvatar": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(profile["avatar"].is_null());
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn plain_users_only_see_their_own_leads_whatever_the_filter() {
    let boss = user("boss@x.com", "p", Role::Manager);
    let boss_id = boss.id;
    let me = user("eu@x.com", "p", Role::User);
    let my_id = me.id;
    let app = spawn_app(vec![boss, me]).await;
    let boss_token = app.login("boss@x.com", "p").await;
    let token = app.login("eu@x.com", "p").await;

    let (_, theirs) = app
        .json(Method::POST, "/leads", Some(&boss_token), Some(json!({"name": "Alheio"})))
        .await;
    assert_eq!(theirs["owner"], boss_id.to_string());
    let (status, _) = app
        .json(Method::POST, "/leads", Some(&boss_token), Some(json!({"name": "Delegado", "owner": my_id})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // O papel user cria, mas o dono é sempre ele mesmo.
    let (status, mine) = app
        .json(Method::POST, "/leads", Some(&token), Some(json!({"name": "Meu", "owner": boss_id})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(mine["owner"], my_id.to_string());

    let (_, page) = app.json(Method::GET, "/leads", Some(&token), None).await;
    assert_eq!(page["total"], 2);
    for lead in page["items"].as_array().unwrap() {
        assert_eq!(lead["owner"], my_id.to_string());
    }

    let (status, page) = app
        .json(Method::GET, &format!("/leads?owner={}", boss_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
    assert!(page["items"].as_array().unwrap().is_empty());

    let (_, page) = app.json(Method::GET, "/leads?q=Alheio", Some(&token), None).await;
    assert_eq!(page["total"], 0);

    let theirs_uri = format!("/leads/{}", theirs["id"].as_str().unwrap());
    let (status, _) = app.json(Method::GET, &theirs_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mine_uri = format!("/leads/{}", mine["id"].as_str().unwrap());
    let (status, body) = app.json(Method::DELETE, &mine_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only admin/manager can delete leads");

    let (_, page) = app.json(Method::GET, "/leads", Some(&boss_token), None).await;
    assert_eq!(page["total"], 3);
}

#[tokio::test]
async fn lead_creation_and_stage_changes_notify_the_owner() {
    let me = user("eu@x.com", "p", Role::User);
    let my_id = me.id;
    let app = spawn_app(vec![user("boss@x.com", "p", Role::Manager), me]).await;
    let boss = app.login("boss@x.com", "p").await;
    let token = app.login("eu@x.com", "p").await;

    let (_, lead) = app
        .json(Method::POST, "/leads", Some(&boss), Some(json!({"name": "Acme", "owner": my_id})))
        .await;
    let lead_uri = format!("/leads/{}", lead["id"].as_str().unwrap());

    let (_, notes) = app.json(Method::GET, "/notifications", Some(&token), None).await;
    let notes = notes.as_array().unwrap().clone();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], "lead-created");
    assert_eq!(notes[0]["userId"], my_id.to_string());

    let (status, updated) = app
        .json(Method::PUT, &lead_uri, Some(&token), Some(json!({"stage": "qualified"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stage"], "qualified");

    // Mesmo estágio de novo: não gera outro aviso.
    app.json(Method::PUT, &lead_uri, Some(&token), Some(json!({"stage": "qualified"})))
        .await;

    let (_, notes) = app.json(Method::GET, "/notifications", Some(&token), None).await;
    let mut kinds: Vec<String> = notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap().to_string())
        .collect();
    kinds.sort();
    assert_eq!(kinds, vec!["lead-created", "lead-stage"]);

    let (_, activity) = app
        .json(Method::GET, &format!("{}/activity", lead_uri), Some(&token), None)
        .await;
    assert_eq!(activity.as_array().unwrap().len(), 3);

    // O gestor não vê avisos endereçados ao dono.
    let (_, boss_notes) = app.json(Method::GET, "/notifications", Some(&boss), None).await;
    assert!(boss_notes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn teams_and_saved_views_round_trip() {
    let me = user("eu@x.com", "p", Role::User);
    let my_id = me.id;
    let app = spawn_app(vec![user("boss@x.com", "p", Role::Manager), me]).await;
    let boss = app.login("boss@x.com", "p").await;
    let token = app.login("eu@x.com", "p").await;

    let (status, team) = app
        .json(Method::POST, "/teams", Some(&boss), Some(json!({"name": "  Vendas ", "members": [my_id, my_id]})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(team["name"], "Vendas");
    assert_eq!(team["members"], json!([my_id]));

    let (status, body) = app
        .json(Method::POST, "/teams", Some(&boss), Some(json!({"name": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name required");

    let (status, _) = app
        .json(Method::POST, "/teams", Some(&token), Some(json!({"name": "Minha equipe"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let team_uri = format!("/teams/{}", team["id"].as_str().unwrap());
    let (status, renamed) = app
        .json(Method::PUT, &team_uri, Some(&boss), Some(json!({"name": "Vendas Sul"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["members"], json!([my_id]));

    let (_, teams) = app.json(Method::GET, "/teams", Some(&token), None).await;
    assert_eq!(teams.as_array().unwrap().len(), 1);
    assert_eq!(teams[0]["name"], "Vendas Sul");

    let (status, view) = app
        .json(
            Method::POST,
            "/views",
            Some(&token),
            Some(json!({"name": "Falhas", "page": "tasks", "filters": {"status": "failed"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .json(Method::POST, "/views", Some(&token), Some(json!({"name": " ", "page": "tasks"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name required");

    let (_, views) = app.json(Method::GET, "/views?page=tasks", Some(&token), None).await;
    assert_eq!(views.as_array().unwrap().len(), 1);
    assert_eq!(views[0]["filters"]["status"], "failed");
    let (_, views) = app.json(Method::GET, "/views?page=leads", Some(&token), None).await;
    assert!(views.as_array().unwrap().is_empty());
    let (_, views) = app.json(Method::GET, "/views", Some(&boss), None).await;
    assert!(views.as_array().unwrap().is_empty());

    let view_uri = format!("/views/{}", view["id"].as_str().unwrap());
    let (status, _) = app.json(Method::DELETE, &view_uri, Some(&boss), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.json(Method::DELETE, &view_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted");
}

#[tokio::test]
async fn delivery_mocks_only_log_and_answer_ok() {
    let app = spawn_app(vec![user("eu@x.com", "p", Role::User)]).await;
    let token = app.login("eu@x.com", "p").await;

    let (status, body) = app
        .json(Method::POST, "/notify/email", Some(&token), Some(json!({"to": "c@x.com", "subject": "Oi"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "message": "Email mock sent"}));

    let (status, body) = app
        .json(Method::POST, "/notify/whatsapp", Some(&token), Some(json!({"to": "+5511999999999"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "WhatsApp mock sent");

    let (status, _) = app
        .json(Method::POST, "/notify/email", None, Some(json!({"to": "c@x.com"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nada é persistido.
    assert!(app.store.read(|db| db.notifications.is_empty()).await);
}
