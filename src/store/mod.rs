//! Persistence seams.
//!
//! Handlers and the synchronizer only see these traits; `PgStore` backs the server and
//! `InMemoryStore` backs tests. Soft-deleted rows are invisible through every read.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Task, TaskQuery, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Inserts a user. A live user with the same email yields
    /// `BadRequest("Email already registered")`.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Persists name, calendar credential and sync flag; bumps `updated_at`.
    async fn save_user(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Like [`find_task`](TaskStore::find_task) but only when `user_id` owns the task.
    async fn find_user_task(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Newest first.
    async fn list_user_tasks(&self, user_id: i32, query: &TaskQuery)
        -> Result<Vec<Task>, AppError>;

    async fn create_task(&self, task: &Task) -> Result<Task, AppError>;

    async fn save_task(&self, task: &Task) -> Result<Task, AppError>;

    /// Soft deletes; returns `false` when no live task matched.
    async fn delete_user_task(&self, user_id: i32, id: Uuid) -> Result<bool, AppError>;
}

pub(crate) const DUPLICATE_EMAIL: &str = "Email already registered";
