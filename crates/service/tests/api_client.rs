use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use models::{Credential, TaskStatus};
use serde_json::{json, Value};
use service::storage::MemoryCredentialStore;
use service::{ApiClient, ClientError, SessionController, TaskBackend};
use tokio::net::TcpListener;

/// What the fake backend saw: (method + path, Authorization header, body).
type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn record(seen: &Seen, what: String, headers: &HeaderMap, body: Value) {
    seen.lock().unwrap().push((what, auth_header(headers), body));
}

async fn login(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    record(&seen, "POST /auth/login".into(), &headers, body.clone());
    if body["password"] == "x" {
        (StatusCode::OK, Json(json!({"token": "tok123"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid email or password"})))
    }
}

async fn register(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    record(&seen, "POST /auth/register".into(), &headers, body.clone());
    if body["email"] == "taken@b.com" {
        (StatusCode::CONFLICT, Json(json!({"error": "Email address already in use"})))
    } else {
        (StatusCode::CREATED, Json(json!({"message": "User registered successfully", "userID": 1})))
    }
}

async fn list(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    record(&seen, "GET /tasks".into(), &headers, Value::Null);
    match auth_header(&headers).as_deref() {
        Some("Bearer tok123") => (
            StatusCode::OK,
            Json(json!([
                {"id": 2, "title": "newer", "description": "", "status": "Done", "created_at": "2024-05-01T10:00:00Z"},
                {"id": 1, "title": "older", "status": "Pending"}
            ])),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"}))),
    }
}

async fn create(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    record(&seen, "POST /tasks".into(), &headers, body);
    StatusCode::CREATED
}

async fn update(State(seen): State<Seen>, Path(id): Path<i64>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    record(&seen, format!("PUT /tasks/{id}"), &headers, body);
    if id == 404 {
        (StatusCode::NOT_FOUND, Json(json!({"error": "Task not found or you do not have permission to update it"})))
    } else {
        (StatusCode::OK, Json(json!({"message": "Task updated successfully"})))
    }
}

async fn remove(State(seen): State<Seen>, Path(id): Path<i64>, headers: HeaderMap) -> StatusCode {
    record(&seen, format!("DELETE /tasks/{id}"), &headers, Value::Null);
    StatusCode::NO_CONTENT
}

async fn broken() -> &'static str {
    "not json"
}

async fn start_backend() -> anyhow::Result<(String, Seen)> {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/tasks", get(list).post(create))
        .route("/tasks/:id", put(update).delete(remove))
        .route("/broken/tasks", get(broken))
        .with_state(Arc::clone(&seen));

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok((format!("http://{}:{}", addr.ip(), addr.port()), seen))
}

async fn client(base_url: &str) -> anyhow::Result<ApiClient> {
    let session = SessionController::new(Arc::new(MemoryCredentialStore::new())).await?;
    Ok(ApiClient::new(base_url, session)?)
}

#[tokio::test]
async fn login_token_is_sent_as_bearer_on_later_calls() -> anyhow::Result<()> {
    let (base, seen) = start_backend().await?;
    let api = client(&base).await?;

    let credential = api.login("a@b.com", "x").await?;
    assert_eq!(credential, Credential::new("tok123"));
    api.session().set_credential(credential).await?;

    let tasks = api.list_tasks().await?;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "newer");
    assert_eq!(tasks[0].status, TaskStatus::Done);
    assert!(tasks[0].created_at.is_some());
    assert_eq!(tasks[1].description, "");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].0, "POST /auth/login");
    assert_eq!(seen[0].1, None);
    assert_eq!(seen[0].2, json!({"email": "a@b.com", "password": "x"}));
    assert_eq!(seen[1], ("GET /tasks".to_string(), Some("Bearer tok123".to_string()), Value::Null));
    Ok(())
}

#[tokio::test]
async fn mutation_bodies_match_wire_format() -> anyhow::Result<()> {
    let (base, seen) = start_backend().await?;
    let api = client(&base).await?;
    api.session().set_credential(Credential::new("tok123")).await?;

    api.create_task("buy milk", "").await?;
    api.set_task_status(7, TaskStatus::Done).await?;
    api.delete_task(7).await?;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].2, json!({"title": "buy milk", "description": ""}));
    assert_eq!(seen[1].0, "PUT /tasks/7");
    assert_eq!(seen[1].2, json!({"status": "Done"}));
    assert_eq!(seen[2].0, "DELETE /tasks/7");
    assert!(seen.iter().all(|(_, auth, _)| auth.as_deref() == Some("Bearer tok123")));
    Ok(())
}

#[tokio::test]
async fn error_statuses_are_classified() -> anyhow::Result<()> {
    let (base, _) = start_backend().await?;
    let api = client(&base).await?;

    // anonymous: no header, backend says 401
    assert!(matches!(api.list_tasks().await, Err(ClientError::Unauthorized)));

    match api.login("a@b.com", "wrong").await {
        Err(ClientError::Auth(Some(msg))) => assert_eq!(msg, "Invalid email or password"),
        other => panic!("unexpected: {other:?}"),
    }
    match api.register("taken@b.com", "pw").await {
        Err(ClientError::Auth(Some(msg))) => assert_eq!(msg, "Email address already in use"),
        other => panic!("unexpected: {other:?}"),
    }
    api.register("new@b.com", "pw").await?;

    api.session().set_credential(Credential::new("tok123")).await?;
    match api.set_task_status(404, TaskStatus::Pending).await {
        Err(ClientError::Rejected { status: 404, message: Some(_) }) => {}
        other => panic!("unexpected: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn undecodable_body_is_network_error() -> anyhow::Result<()> {
    let (base, _) = start_backend().await?;
    let api = client(&format!("{base}/broken/")).await?;
    assert_eq!(api.base_url(), format!("{base}/broken"));
    assert!(matches!(api.list_tasks().await, Err(ClientError::Network(_))));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_network_error() -> anyhow::Result<()> {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let api = client(&format!("http://{}", addr)).await?;
    assert!(matches!(api.login("a@b.com", "x").await, Err(ClientError::Network(_))));
    assert!(matches!(api.list_tasks().await, Err(ClientError::Network(_))));
    Ok(())
}
