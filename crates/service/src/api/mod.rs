//! Outbound communication with the task backend.
//!
//! [`TaskBackend`] lists one operation per backend capability. [`ApiClient`] is the
//! HTTP implementation; [`mock::MockBackend`] is an in-memory stand-in for tests.

pub mod client;
pub mod mock;

use async_trait::async_trait;
use models::{Credential, Task, TaskId, TaskStatus};

use crate::errors::ClientError;

pub use client::ApiClient;

#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// `Auth` with the backend's message on rejection, `Network` if unreachable.
    async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError>;
    /// Registration does not establish a session.
    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError>;
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, title: &str, description: &str) -> Result<(), ClientError>;
    /// Partial update of exactly the status field.
    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ClientError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError>;
}
