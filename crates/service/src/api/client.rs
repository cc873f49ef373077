use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use models::{Credential, Credentials, ErrorBody, NewTask, Task, TaskId, TaskStatus, TaskStatusUpdate, TokenResponse};
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, instrument};

use super::TaskBackend;
use crate::errors::ClientError;
use crate::session::SessionController;

/// How a non-2xx response is classified.
#[derive(Clone, Copy)]
enum Endpoint {
    /// `/auth/*`: every rejection is an auth failure carrying the backend message.
    Auth,
    /// Everything else: 401 means the credential is missing or no longer valid.
    Protected,
}

/// HTTP client for the task backend.
///
/// Every request consults the session controller and, when a credential is held,
/// carries `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionController>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionController>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, session, None)
    }

    /// `timeout = None` leaves request timing to the network stack.
    pub fn with_timeout(
        base_url: impl Into<String>,
        session: Arc<SessionController>,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, session })
    }

    pub fn from_config(cfg: &configs::BackendConfig, session: Arc<SessionController>) -> Result<Self, ClientError> {
        Self::with_timeout(&cfg.base_url, session, cfg.request_timeout_secs.map(Duration::from_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(credential) = self.session.current_credential().await? {
            builder = builder.header(AUTHORIZATION, credential.bearer());
        }
        Ok(builder)
    }

    async fn dispatch(&self, builder: RequestBuilder, endpoint: Endpoint) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(path = %response.url().path(), status = status.as_u16(), "backend_response");
        if status.is_success() {
            return Ok(response);
        }
        let message = error_message(response).await;
        Err(match endpoint {
            Endpoint::Auth => ClientError::Auth(message),
            Endpoint::Protected if status == StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            Endpoint::Protected => ClientError::Rejected { status: status.as_u16(), message },
        })
    }
}

async fn error_message(response: Response) -> Option<String> {
    response.json::<ErrorBody>().await.ok().and_then(ErrorBody::into_message)
}

#[async_trait]
impl TaskBackend for ApiClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        let body = Credentials::new(email, password);
        let req = self.request(Method::POST, "/auth/login").await?.json(&body);
        let resp = self.dispatch(req, Endpoint::Auth).await?;
        let token = resp
            .json::<TokenResponse>()
            .await
            .map_err(|e| ClientError::Network(format!("invalid login response: {e}")))?
            .token;
        if token.is_empty() {
            return Err(ClientError::Network("login response carried an empty token".into()));
        }
        info!("login_succeeded");
        Ok(Credential::new(token))
    }

    #[instrument(skip(self, password))]
    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = Credentials::new(email, password);
        let req = self.request(Method::POST, "/auth/register").await?.json(&body);
        self.dispatch(req, Endpoint::Auth).await?;
        info!("register_succeeded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let req = self.request(Method::GET, "/tasks").await?;
        let resp = self.dispatch(req, Endpoint::Protected).await?;
        let tasks = resp
            .json::<Vec<Task>>()
            .await
            .map_err(|e| ClientError::Network(format!("invalid task list: {e}")))?;
        debug!(count = tasks.len(), "tasks_fetched");
        Ok(tasks)
    }

    #[instrument(skip(self, description))]
    async fn create_task(&self, title: &str, description: &str) -> Result<(), ClientError> {
        let body = NewTask::new(title, description);
        let req = self.request(Method::POST, "/tasks").await?.json(&body);
        self.dispatch(req, Endpoint::Protected).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ClientError> {
        let body = TaskStatusUpdate::status(status);
        let req = self.request(Method::PUT, &format!("/tasks/{id}")).await?.json(&body);
        self.dispatch(req, Endpoint::Protected).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        let req = self.request(Method::DELETE, &format!("/tasks/{id}")).await?;
        self.dispatch(req, Endpoint::Protected).await?;
        Ok(())
    }
}
