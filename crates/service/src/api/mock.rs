//! In-memory backend for tests and doc examples.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use models::{Credential, Task, TaskId, TaskStatus};
use tokio::sync::Notify;

use super::TaskBackend;
use crate::errors::ClientError;

/// A request as seen by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { email: String },
    Register { email: String },
    ListTasks,
    CreateTask { title: String, description: String },
    SetTaskStatus { id: TaskId, status: TaskStatus },
    DeleteTask { id: TaskId },
}

type Failure = Box<dyn FnOnce() -> ClientError + Send>;

/// Behaves like the REST backend: newest tasks first, ids assigned on create,
/// 404-style rejections for unknown ids. Can be scripted to fail, to reject the
/// credential, or to hold mutations and list calls until released.
#[derive(Default)]
pub struct MockBackend {
    users: Mutex<HashMap<String, String>>,
    tasks: Mutex<Vec<Task>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    issued: AtomicI64,
    credential_rejected: AtomicBool,
    fail_next: Mutex<Option<Failure>>,
    gate: Mutex<Option<Arc<Notify>>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, email: &str, password: &str) -> Self {
        lock(&self.users).insert(email.to_string(), password.to_string());
        self
    }

    /// Insert a task directly into backend state (no call recorded).
    pub fn seed_task(&self, title: &str, description: &str, status: TaskStatus) -> TaskId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.tasks).insert(0, Task { id, title: title.into(), description: description.into(), status, created_at: None });
        id
    }

    /// Authoritative backend state.
    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// From now on every protected call answers as if the credential expired.
    pub fn reject_credential(&self, rejected: bool) {
        self.credential_rejected.store(rejected, Ordering::SeqCst);
    }

    /// The next protected call fails with the produced error.
    pub fn fail_next(&self, make: impl FnOnce() -> ClientError + Send + 'static) {
        *lock(&self.fail_next) = Some(Box::new(make));
    }

    /// Hold every mutation until `notify` is signalled once per mutation.
    pub fn hold_mutations(&self, notify: Arc<Notify>) {
        *lock(&self.gate) = Some(notify);
    }

    /// The next list call answers with the collection as of the call, but only
    /// once `notify` is signalled.
    pub fn hold_next_list(&self, notify: Arc<Notify>) {
        *lock(&self.list_gate) = Some(notify);
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn check_protected(&self) -> Result<(), ClientError> {
        if let Some(make) = lock(&self.fail_next).take() {
            return Err(make());
        }
        if self.credential_rejected.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized);
        }
        Ok(())
    }

    async fn wait_gate(&self) {
        let gate = lock(&self.gate).clone();
        if let Some(notify) = gate {
            notify.notified().await;
        }
    }
}

fn not_found() -> ClientError {
    ClientError::Rejected { status: 404, message: Some("Task not found or you do not have permission to update it".into()) }
}

#[async_trait]
impl TaskBackend for MockBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        self.record(Call::Login { email: email.into() });
        let users = lock(&self.users);
        match users.get(email) {
            Some(stored) if stored == password => {
                let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Credential::new(format!("mock-token-{n}")))
            }
            _ => Err(ClientError::Auth(Some("Invalid email or password".into()))),
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        self.record(Call::Register { email: email.into() });
        let mut users = lock(&self.users);
        if users.contains_key(email) {
            return Err(ClientError::Auth(Some("Email address already in use".into())));
        }
        users.insert(email.into(), password.into());
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.record(Call::ListTasks);
        self.check_protected()?;
        let tasks = self.tasks();
        let gate = lock(&self.list_gate).take();
        if let Some(notify) = gate {
            notify.notified().await;
        }
        Ok(tasks)
    }

    async fn create_task(&self, title: &str, description: &str) -> Result<(), ClientError> {
        self.record(Call::CreateTask { title: title.into(), description: description.into() });
        self.check_protected()?;
        self.wait_gate().await;
        self.seed_task(title, description, TaskStatus::Pending);
        Ok(())
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ClientError> {
        self.record(Call::SetTaskStatus { id, status });
        self.check_protected()?;
        self.wait_gate().await;
        let mut tasks = lock(&self.tasks);
        let task = tasks.iter_mut().find(|t| t.id == id).ok_or_else(not_found)?;
        task.status = status;
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        self.record(Call::DeleteTask { id });
        self.check_protected()?;
        self.wait_gate().await;
        let mut tasks = lock(&self.tasks);
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}
