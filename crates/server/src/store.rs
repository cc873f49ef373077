//! In-memory persistence for the reference backend: users by email, tasks by id.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use models::{Task, TaskId, TaskStatus};
use tokio::sync::RwLock;

pub type UserId = i64;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
struct TaskRecord {
    user_id: UserId,
    task: Task,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    tasks: BTreeMap<TaskId, TaskRecord>,
    next_user_id: UserId,
    next_task_id: TaskId,
}

/// Users and tasks behind one lock; every task operation is scoped to its owner.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the email is already registered.
    pub async fn insert_user(&self, email: &str, password_hash: String) -> Option<UserId> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(email) {
            return None;
        }
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.insert(email.to_string(), UserRecord { id, email: email.to_string(), password_hash });
        Some(id)
    }

    pub async fn find_user(&self, email: &str) -> Option<UserRecord> {
        self.inner.read().await.users.get(email).cloned()
    }

    /// New tasks start `Pending`.
    pub async fn insert_task(&self, user_id: UserId, title: String, description: String) -> Task {
        let mut inner = self.inner.write().await;
        inner.next_task_id += 1;
        let task = Task {
            id: inner.next_task_id,
            title,
            description,
            status: TaskStatus::Pending,
            created_at: Some(Utc::now()),
        };
        inner.tasks.insert(task.id, TaskRecord { user_id, task: task.clone() });
        task
    }

    /// The user's tasks, newest first.
    pub async fn list_tasks(&self, user_id: UserId) -> Vec<Task> {
        let inner = self.inner.read().await;
        inner
            .tasks
            .values()
            .rev()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.task.clone())
            .collect()
    }

    /// `false` when the task does not exist or belongs to someone else.
    pub async fn set_status(&self, user_id: UserId, id: TaskId, status: TaskStatus) -> bool {
        let mut inner = self.inner.write().await;
        match inner.tasks.get_mut(&id) {
            Some(r) if r.user_id == user_id => {
                r.task.status = status;
                true
            }
            _ => false,
        }
    }

    pub async fn delete_task(&self, user_id: UserId, id: TaskId) -> bool {
        let mut inner = self.inner.write().await;
        let owned = inner.tasks.get(&id).is_some_and(|r| r.user_id == user_id);
        if owned {
            inner.tasks.remove(&id);
        }
        owned
    }
}
