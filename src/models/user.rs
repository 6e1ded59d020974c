use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account.
///
/// `password_hash` and `google_token` never leave the server: they are skipped by serde
/// and only travel between the store, the credential manager and the synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    /// Serialized [`CalendarToken`](crate::calendar::CalendarToken), present once the user
    /// completed the Google authorization flow.
    #[serde(skip)]
    pub google_token: Option<String>,
    pub calendar_sync: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl User {
    pub fn calendar_credential(&self) -> Option<&str> {
        self.google_token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn has_calendar_credential(&self) -> bool {
        self.calendar_credential().is_some()
    }

    /// Sync runs only when the user both enabled it and holds a credential.
    pub fn calendar_sync_active(&self) -> bool {
        self.calendar_sync && self.has_calendar_credential()
    }
}
