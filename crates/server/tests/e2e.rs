use std::net::SocketAddr;
use std::sync::Arc;

use configs::ServerConfig;
use models::{AuthIntent, TaskStatus};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use service::storage::{FileCredentialStore, MemoryCredentialStore};
use service::sync::{RemoveOutcome, CREATE_FAILED};
use service::{ApiClient, AuthFormController, AuthOutcome, ClientError, SessionController, SessionState, TaskBackend, TaskListSynchronizer};
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    base_url: String,
}

async fn start_server_with(ttl_hours: u64) -> anyhow::Result<TestApp> {
    let cfg = ServerConfig { host: "127.0.0.1".into(), port: 8080, jwt_secret: "test-secret".into(), token_ttl_hours: ttl_hours };
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, server::build_state(&cfg), std::future::pending()).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

async fn start_server() -> anyhow::Result<TestApp> {
    start_server_with(24).await
}

struct Client {
    api: Arc<ApiClient>,
    session: Arc<SessionController>,
}

async fn client_with(app: &TestApp, session: Arc<SessionController>) -> anyhow::Result<Client> {
    let api = Arc::new(ApiClient::new(&app.base_url, Arc::clone(&session))?);
    Ok(Client { api, session })
}

async fn memory_client(app: &TestApp) -> anyhow::Result<Client> {
    let session = SessionController::new(Arc::new(MemoryCredentialStore::new())).await?;
    client_with(app, session).await
}

fn unique_email() -> String {
    format!("user_{}@example.com", Uuid::new_v4())
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn e2e_raw_contract() -> anyhow::Result<()> {
    let app = start_server().await?;
    let http = reqwest::Client::new();
    let creds = json!({"email": unique_email(), "password": "pw"});

    let res = http.post(format!("{}/auth/register", app.base_url)).json(&creds).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let res = http.post(format!("{}/auth/login", app.base_url)).json(&creds).send().await?;
    let token = res.json::<Value>().await?["token"].as_str().unwrap_or_default().to_string();

    for title in ["first", "second"] {
        let res = http
            .post(format!("{}/tasks", app.base_url))
            .bearer_auth(&token)
            .json(&json!({"title": title, "description": "d"}))
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::CREATED);
    }

    let tasks: Value = http.get(format!("{}/tasks", app.base_url)).bearer_auth(&token).send().await?.json().await?;
    assert_eq!(tasks[0]["title"], "second");
    assert_eq!(tasks[1]["title"], "first");
    assert!(tasks[0]["created_at"].is_string());

    let id = tasks[1]["id"].as_i64().unwrap_or_default();
    let res = http.delete(format!("{}/tasks/{id}", app.base_url)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?["message"], "Task deleted successfully");
    let res = http.delete(format!("{}/tasks/{id}", app.base_url)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_login_then_manage_tasks() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = memory_client(&app).await?;
    let email = unique_email();

    let mut form = AuthFormController::new(Arc::clone(&client.api), Arc::clone(&client.session));
    form.toggle_intent();
    let outcome = form.submit_current(&email, "S3curePass!").await?;
    assert!(matches!(outcome, AuthOutcome::SwitchToLogin { .. }));
    assert_eq!(form.intent(), AuthIntent::Login);
    assert_eq!(client.session.state(), SessionState::Anonymous);

    assert_eq!(form.submit_current(&email, "S3curePass!").await?, AuthOutcome::ProceedToTasks);
    assert!(client.session.is_authenticated());

    let tasks = TaskListSynchronizer::new(Arc::clone(&client.api), Arc::clone(&client.session));
    assert!(tasks.open().await?.tasks.is_empty());

    tasks.add_task("write report", "by friday").await?;
    let snap = tasks.add_task("book flights", "").await?;
    assert_eq!(snap.tasks.len(), 2);
    assert_eq!(snap.tasks[0].title, "book flights");

    let report = snap.tasks[1].id;
    let snap = tasks.toggle_status(report).await?;
    assert_eq!(snap.tasks[1].status, TaskStatus::Done);
    let snap = tasks.toggle_status(report).await?;
    assert_eq!(snap.tasks[1].status, TaskStatus::Pending);

    assert!(matches!(tasks.remove_task(report, &|_: &str| false).await?, RemoveOutcome::Cancelled));
    assert_eq!(tasks.tasks().len(), 2);
    match tasks.remove_task(report, &|_: &str| true).await? {
        RemoveOutcome::Removed(snap) => assert_eq!(snap.tasks.len(), 1),
        RemoveOutcome::Cancelled => panic!("confirmed delete was cancelled"),
    }

    // what the backend reports is exactly what is displayed
    assert_eq!(tasks.tasks(), client.api.list_tasks().await?);
    Ok(())
}

#[tokio::test]
async fn e2e_wrong_password_surfaces_backend_message() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = memory_client(&app).await?;
    let mut form = AuthFormController::new(Arc::clone(&client.api), Arc::clone(&client.session));

    let err = form.submit(AuthIntent::Login, "ghost@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(Some(_))));
    assert_eq!(form.error(), Some("Invalid email or password"));
    assert_eq!(client.session.current_credential().await?, None);
    Ok(())
}

#[tokio::test]
async fn e2e_rejected_credential_ends_session() -> anyhow::Result<()> {
    let app = start_server().await?;
    // a token signed by some other backend
    let store = Arc::new(MemoryCredentialStore::with_credential(models::Credential::new("not-a-real-token")));
    let session = SessionController::new(store).await?;
    let client = client_with(&app, session).await?;
    assert!(client.session.is_authenticated());

    let tasks = TaskListSynchronizer::new(Arc::clone(&client.api), Arc::clone(&client.session));
    let err = tasks.add_task("anything", "").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(client.session.state(), SessionState::Anonymous);
    assert_eq!(client.session.current_credential().await?, None);
    assert_ne!(tasks.notice().as_deref(), Some(CREATE_FAILED));

    // anonymous now: the view is refused locally
    assert!(tasks.open().await.unwrap_err().is_unauthorized());
    Ok(())
}

#[tokio::test]
async fn e2e_persisted_session_survives_restart() -> anyhow::Result<()> {
    let app = start_server().await?;
    let path = std::env::temp_dir().join(format!("tasks_e2e_{}", Uuid::new_v4())).join("session.json");
    let email = unique_email();

    {
        let session = SessionController::new(FileCredentialStore::new(&path).await?).await?;
        let client = client_with(&app, session).await?;
        client.api.register(&email, "pw").await?;
        let mut form = AuthFormController::new(Arc::clone(&client.api), Arc::clone(&client.session));
        form.submit(AuthIntent::Login, &email, "pw").await?;
        let tasks = TaskListSynchronizer::new(Arc::clone(&client.api), Arc::clone(&client.session));
        tasks.add_task("persisted", "").await?;
    }

    let session = SessionController::new(FileCredentialStore::new(&path).await?).await?;
    assert!(session.is_authenticated());
    let client = client_with(&app, session).await?;
    let tasks = TaskListSynchronizer::new(Arc::clone(&client.api), Arc::clone(&client.session));
    let snap = tasks.open().await?;
    assert_eq!(snap.tasks.len(), 1);
    assert_eq!(snap.tasks[0].title, "persisted");

    client.session.logout().await?;
    let reopened = SessionController::new(FileCredentialStore::new(&path).await?).await?;
    assert!(!reopened.is_authenticated());

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}
