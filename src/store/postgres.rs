use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{NewUser, Task, TaskQuery, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, google_token, calendar_sync, created_at, updated_at";

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, due_date, \
     google_event_id, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::StoreError(format!("migration failed: {}", e)))
    }
}

fn map_unique_violation(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest(DUPLICATE_EMAIL.into())
        }
        _ => error.into(),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn save_user(&self, user: &User) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET name = $1, google_token = $2, calendar_sync = $3, updated_at = NOW() \
             WHERE id = $4 AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        );
        let saved = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.google_token)
            .bind(user.calendar_sync)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?;
        saved.ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_user_task(&self, user_id: i32, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_user_tasks(
        &self,
        user_id: i32,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, AppError> {
        // Filters are appended in the same order they are bound below.
        let mut sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let mut param_count = 2;

        if query.status.is_some() {
            sql.push_str(&format!(" AND status = ${}", param_count));
            param_count += 1;
        }
        if query.priority.is_some() {
            sql.push_str(&format!(" AND priority = ${}", param_count));
            param_count += 1;
        }
        if query.search.is_some() {
            sql.push_str(&format!(
                " AND (title ILIKE ${0} OR description ILIKE ${0})",
                param_count
            ));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(user_id);
        if let Some(status) = &query.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(priority) = &query.priority {
            query_builder = query_builder.bind(priority);
        }
        if let Some(search) = &query.search {
            query_builder = query_builder.bind(format!("%{}%", search));
        }

        let tasks = query_builder.fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn create_task(&self, task: &Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (id, user_id, title, description, status, priority, due_date, \
             google_event_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(&task.status)
            .bind(&task.priority)
            .bind(task.due_date)
            .bind(&task.google_event_id)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let sql = format!(
            "UPDATE tasks SET title = $1, description = $2, status = $3, priority = $4, \
             due_date = $5, google_event_id = $6, updated_at = NOW() \
             WHERE id = $7 AND user_id = $8 AND deleted_at IS NULL RETURNING {}",
            TASK_COLUMNS
        );
        let saved = sqlx::query_as::<_, Task>(&sql)
            .bind(&task.title)
            .bind(&task.description)
            .bind(&task.status)
            .bind(&task.priority)
            .bind(task.due_date)
            .bind(&task.google_event_id)
            .bind(task.id)
            .bind(task.user_id)
            .fetch_optional(&self.pool)
            .await?;
        saved.ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn delete_user_task(&self, user_id: i32, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
