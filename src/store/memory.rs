use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskQuery, User};

/// Process-local store with the same observable behavior as [`PgStore`](super::PgStore),
/// tombstones included. Used by the test suites.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<UserTable>,
    tasks: RwLock<HashMap<Uuid, StoredTask>>,
}

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: HashMap<i32, User>,
}

struct StoredTask {
    task: Task,
    deleted: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks ever inserted, soft-deleted ones included.
    pub async fn task_rows(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.rows.len()
    }
}

fn matches_query(task: &Task, query: &TaskQuery) -> bool {
    if let Some(status) = &query.status {
        if &task.status != status {
            return false;
        }
    }
    if let Some(priority) = &query.priority {
        if &task.priority != priority {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let in_title = task.title.to_lowercase().contains(&needle);
        let in_description = task
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if !in_title && !in_description {
            return false;
        }
    }
    true
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.rows.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.rows.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.rows.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.into()));
        }

        users.next_id += 1;
        let now = Utc::now();
        let created = User {
            id: users.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            google_token: None,
            calendar_sync: false,
            created_at: now,
            updated_at: now,
        };
        users.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn save_user(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let stored = users
            .rows
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        stored.name = user.name.clone();
        stored.google_token = user.google_token.clone();
        stored.calendar_sync = user.calendar_sync;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&id)
            .filter(|row| !row.deleted)
            .map(|row| row.task.clone()))
    }

    async fn find_user_task(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self
            .find_task(id)
            .await?
            .filter(|task| task.user_id == user_id))
    }

    async fn list_user_tasks(
        &self,
        user_id: i32,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut listed: Vec<Task> = tasks
            .values()
            .filter(|row| !row.deleted && row.task.user_id == user_id)
            .map(|row| &row.task)
            .filter(|task| matches_query(task, query))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn create_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(AppError::StoreError(format!("duplicate task id {}", task.id)));
        }
        tasks.insert(
            task.id,
            StoredTask {
                task: task.clone(),
                deleted: false,
            },
        );
        Ok(task.clone())
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        let row = tasks
            .get_mut(&task.id)
            .filter(|row| !row.deleted && row.task.user_id == task.user_id)
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

        row.task = Task {
            updated_at: Utc::now(),
            ..task.clone()
        };
        Ok(row.task.clone())
    }

    async fn delete_user_task(&self, user_id: i32, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(row) if !row.deleted && row.task.user_id == user_id => {
                row.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
