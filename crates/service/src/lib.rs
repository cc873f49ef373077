//! Client-side services for the task backend.
//! - `api`: HTTP client plus the `TaskBackend` seam (and an in-memory mock).
//! - `session`: owns the credential and the authenticated/anonymous state.
//! - `sync`: keeps a read-only mirror of the task collection, refetching after every write.
//! - `auth_form`: login/register submission.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use models::TaskStatus;
//! use service::api::mock::MockBackend;
//! use service::storage::MemoryCredentialStore;
//! use service::{AuthFormController, AuthOutcome, SessionController, TaskListSynchronizer};
//!
//! tokio_test::block_on(async {
//!     let backend = Arc::new(MockBackend::new().with_user("u@e.com", "pw"));
//!     let session = SessionController::new(Arc::new(MemoryCredentialStore::new())).await.unwrap();
//!
//!     let mut form = AuthFormController::new(Arc::clone(&backend), Arc::clone(&session));
//!     assert_eq!(form.submit_current("u@e.com", "pw").await.unwrap(), AuthOutcome::ProceedToTasks);
//!
//!     let tasks = TaskListSynchronizer::new(backend, session);
//!     tasks.open().await.unwrap();
//!     let snap = tasks.add_task("write docs", "").await.unwrap();
//!     assert_eq!(snap.tasks[0].status, TaskStatus::Pending);
//! });
//! ```

pub mod api;
pub mod auth_form;
pub mod errors;
pub mod session;
pub mod storage;
pub mod sync;

pub use api::{ApiClient, TaskBackend};
pub use auth_form::{AuthFormController, AuthOutcome};
pub use errors::ClientError;
pub use session::{SessionController, SessionState};
pub use sync::{RemoveOutcome, TaskListSynchronizer, TaskSnapshot};
