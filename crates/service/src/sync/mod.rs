//! Task list synchronizer: refetch-after-write.
//!
//! Every mutation is followed by a full re-read of the backend's collection; the
//! held snapshot is never patched locally. Each fetch is numbered when issued and
//! only a newer fetch may replace the snapshot, so a slow refresh cannot overwrite
//! the result of a later one. Mutations are single-flight per operation + task.

pub mod flight;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use models::{NewTask, Task, TaskId};
use tracing::{debug, info, warn};

use crate::api::TaskBackend;
use crate::errors::ClientError;
use crate::session::SessionController;

pub use flight::{FlightKey, Mutation, SingleFlight};

pub const FETCH_FAILED: &str = "Failed to fetch tasks. Please try again.";
pub const CREATE_FAILED: &str = "Failed to create task.";
pub const UPDATE_FAILED: &str = "Failed to update task status.";
pub const DELETE_FAILED: &str = "Failed to delete task.";
pub const TITLE_REQUIRED: &str = "Task title is required.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// The collection as of one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// Issue number of the fetch that produced it; 0 before the first fetch.
    pub sequence: u64,
    pub tasks: Vec<Task>,
}

/// Asks the user before a destructive action.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug)]
pub enum RemoveOutcome {
    Removed(Arc<TaskSnapshot>),
    Cancelled,
}

pub struct TaskListSynchronizer<B> {
    backend: Arc<B>,
    session: Arc<SessionController>,
    snapshot: ArcSwap<TaskSnapshot>,
    issued: AtomicU64,
    flights: SingleFlight,
    notice: ArcSwapOption<String>,
}

impl<B: TaskBackend> TaskListSynchronizer<B> {
    pub fn new(backend: Arc<B>, session: Arc<SessionController>) -> Self {
        Self {
            backend,
            session,
            snapshot: ArcSwap::from_pointee(TaskSnapshot::default()),
            issued: AtomicU64::new(0),
            flights: SingleFlight::default(),
            notice: ArcSwapOption::empty(),
        }
    }

    /// Entry into the task view: anonymous sessions are turned away without a request.
    pub async fn open(&self) -> Result<Arc<TaskSnapshot>, ClientError> {
        if let Err(e) = self.session.require_authenticated().await {
            if e.is_unauthorized() {
                self.reset();
            }
            return Err(e);
        }
        self.refresh().await
    }

    /// Fetch the whole collection and replace the snapshot with it.
    pub async fn refresh(&self) -> Result<Arc<TaskSnapshot>, ClientError> {
        let sequence = self.next_sequence();
        match self.backend.list_tasks().await {
            Ok(tasks) => {
                self.apply(sequence, tasks);
                Ok(self.snapshot())
            }
            Err(e) => Err(self.fail(e, FETCH_FAILED).await),
        }
    }

    /// Create a task, then refresh. An empty title never reaches the backend.
    pub async fn add_task(&self, title: &str, description: &str) -> Result<Arc<TaskSnapshot>, ClientError> {
        let _flight = self.flights.acquire(FlightKey::create())?;
        self.clear_notice();

        let new_task = NewTask::new(title, description);
        if let Err(e) = new_task.validate() {
            self.set_notice(TITLE_REQUIRED);
            return Err(e.into());
        }
        if let Err(e) = self.backend.create_task(&new_task.title, &new_task.description).await {
            return Err(self.fail(e, CREATE_FAILED).await);
        }
        info!(title = %new_task.title, "task_created");
        self.refresh().await
    }

    /// Flip the task's status as currently displayed (Pending ↔ Done), then refresh.
    pub async fn toggle_status(&self, id: TaskId) -> Result<Arc<TaskSnapshot>, ClientError> {
        let _flight = self.flights.acquire(FlightKey::set_status(id))?;
        self.clear_notice();

        let current = self
            .snapshot
            .load()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.status)
            .ok_or_else(|| ClientError::Validation(format!("task {id} is not in the current list")))?;
        let next = current.toggled();

        if let Err(e) = self.backend.set_task_status(id, next).await {
            return Err(self.fail(e, UPDATE_FAILED).await);
        }
        info!(task_id = id, from = %current, to = %next, "task_status_changed");
        self.refresh().await
    }

    /// Delete after the user confirms, then refresh. Declining sends nothing.
    pub async fn remove_task(&self, id: TaskId, confirmation: &dyn Confirmation) -> Result<RemoveOutcome, ClientError> {
        let _flight = self.flights.acquire(FlightKey::delete(id))?;
        self.clear_notice();

        if !confirmation.confirm(DELETE_PROMPT) {
            debug!(task_id = id, "delete_cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }
        if let Err(e) = self.backend.delete_task(id).await {
            return Err(self.fail(e, DELETE_FAILED).await);
        }
        info!(task_id = id, "task_deleted");
        Ok(RemoveOutcome::Removed(self.refresh().await?))
    }

    pub fn snapshot(&self) -> Arc<TaskSnapshot> {
        self.snapshot.load_full()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.snapshot.load().tasks.clone()
    }

    /// Last user-visible failure message, if any.
    pub fn notice(&self) -> Option<String> {
        self.notice.load_full().map(|n| n.as_ref().clone())
    }

    pub fn clear_notice(&self) {
        self.notice.store(None);
    }

    pub fn is_in_flight(&self, key: FlightKey) -> bool {
        self.flights.is_busy(key)
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    fn set_notice(&self, notice: &str) {
        self.notice.store(Some(Arc::new(notice.to_string())));
    }

    fn next_sequence(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `tasks` unless a newer fetch already landed. Returns whether it was installed.
    fn apply(&self, sequence: u64, tasks: Vec<Task>) -> bool {
        let fresh = Arc::new(TaskSnapshot { sequence, tasks });
        let mut installed = false;
        self.snapshot.rcu(|current| {
            installed = current.sequence < sequence;
            if installed {
                Arc::clone(&fresh)
            } else {
                Arc::clone(current)
            }
        });
        if !installed {
            debug!(sequence, "stale_snapshot_discarded");
        }
        installed
    }

    /// Drop the held collection; anything still in flight is older and will be discarded.
    fn reset(&self) {
        let sequence = self.next_sequence();
        self.apply(sequence, Vec::new());
    }

    /// Unauthorized ends the session instead of producing text; everything else
    /// becomes the generic notice for the operation.
    async fn fail(&self, err: ClientError, notice: &str) -> ClientError {
        if err.is_unauthorized() {
            self.session.invalidate().await;
            self.reset();
        } else {
            warn!(error = %err, code = err.code(), notice, "task_operation_failed");
            self.set_notice(notice);
        }
        err
    }
}
