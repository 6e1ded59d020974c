use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub const STATUS_PENDING: &str = "pending";
/// The only status with calendar meaning: completed tasks never keep a remote event.
pub const STATUS_COMPLETED: &str = "completed";
pub const DEFAULT_PRIORITY: &str = "medium";

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `pending`.
    #[validate(length(max = 50))]
    pub status: Option<String>,

    /// Defaults to `medium`.
    #[validate(length(max = 50))]
    pub priority: Option<String>,

    /// See [`parse_due_date`] for accepted formats.
    pub due_date: Option<String>,
}

/// Partial update of a task.
///
/// Absent or empty fields are left unchanged, except `due_date` where an empty string
/// clears the due date.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub status: Option<String>,

    #[validate(length(max = 50))]
    pub priority: Option<String>,

    pub due_date: Option<String>,
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Identifier of the owning user. Never changes after creation.
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Opaque status; only [`STATUS_COMPLETED`] matters to calendar sync.
    pub status: String,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    /// Provider id of the calendar event mirroring this task, if one exists.
    pub google_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<String>,
    /// Filter tasks by priority.
    pub priority: Option<String>,
    /// Search term matched against title or description (case-insensitive).
    pub search: Option<String>,
}

impl Task {
    /// Creates a new `Task` for `user_id` from validated input.
    pub fn new(input: CreateTaskRequest, user_id: i32) -> Result<Self, AppError> {
        let due_date = match input.due_date.as_deref() {
            Some(raw) => parse_due_date(raw)?,
            None => None,
        };
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description,
            status: non_empty(input.status).unwrap_or_else(|| STATUS_PENDING.to_string()),
            priority: non_empty(input.priority).unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            due_date,
            google_event_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update and reports whether a field mirrored on the calendar
    /// (title, description, status, due date) changed.
    pub fn apply_update(&mut self, update: UpdateTaskRequest) -> Result<bool, AppError> {
        let due_date = match update.due_date.as_deref() {
            Some(raw) => Some(parse_due_date(raw)?),
            None => None,
        };

        let mut calendar_changed = false;

        if let Some(title) = non_empty(update.title) {
            calendar_changed |= title != self.title;
            self.title = title;
        }
        if let Some(description) = non_empty(update.description) {
            calendar_changed |= self.description.as_deref() != Some(description.as_str());
            self.description = Some(description);
        }
        if let Some(status) = non_empty(update.status) {
            calendar_changed |= status != self.status;
            self.status = status;
        }
        if let Some(priority) = non_empty(update.priority) {
            self.priority = priority;
        }
        if let Some(due_date) = due_date {
            calendar_changed |= due_date != self.due_date;
            self.due_date = due_date;
        }

        self.updated_at = Utc::now();
        Ok(calendar_changed)
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn event_id(&self) -> Option<&str> {
        self.google_event_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn has_calendar_event(&self) -> bool {
        self.event_id().is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parses a due date.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SSZ`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`;
/// the last two are read as UTC. An empty string means "no due date".
pub fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    for layout in ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(Utc.from_utc_datetime(&midnight)));
    }

    Err(AppError::BadRequest("Invalid due date format".into()))
}
