//! Wire and domain types shared by the task client and the reference backend.

pub mod auth;
pub mod errors;
pub mod task;

pub use auth::{AuthIntent, Credential, Credentials, TokenResponse};
pub use errors::{ErrorBody, ModelError};
pub use task::{NewTask, Task, TaskId, TaskStatus, TaskStatusUpdate};
