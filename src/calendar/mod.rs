//! Calendar provider adapter.
//!
//! The synchronizer talks to [`CalendarClient`] only. [`GoogleCalendarClient`] is the
//! production implementation. With the `mock-calendar` feature, `MockCalendarClient`
//! records calls for tests.

pub mod google;
#[cfg(any(test, feature = "mock-calendar"))]
pub mod mock;
pub mod token;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::Task;

pub use google::GoogleCalendarClient;
#[cfg(any(test, feature = "mock-calendar"))]
pub use mock::{CalendarCall, MockBehaviour, MockCalendarClient};
pub use token::CalendarToken;

/// What a remote event should show for a task.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub title: String,
    pub description: String,
    pub due: DateTime<Utc>,
}

impl EventDetails {
    /// `None` when the task has no due date, since an event needs a start time.
    pub fn for_task(task: &Task) -> Option<Self> {
        task.due_date.map(|due| Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due,
        })
    }
}

#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// URL the user visits to grant offline calendar access; `state` is echoed back.
    fn auth_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<CalendarToken, AppError>;

    /// Creates the event and returns its provider id.
    async fn create_event(
        &self,
        token: &CalendarToken,
        event: &EventDetails,
    ) -> Result<String, AppError>;

    async fn update_event(
        &self,
        token: &CalendarToken,
        event_id: &str,
        event: &EventDetails,
    ) -> Result<(), AppError>;

    async fn delete_event(&self, token: &CalendarToken, event_id: &str) -> Result<(), AppError>;
}
