use std::sync::Arc;

use crate::auth::TokenManager;
use crate::calendar::CalendarClient;
use crate::store::{TaskStore, UserStore};
use crate::sync::TaskSyncService;

/// Everything a handler needs, built once in `main` (or a test) and shared through
/// `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sync: TaskSyncService,
    pub tokens: TokenManager,
    pub password_cost: u32,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        calendar: Arc<dyn CalendarClient>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            users,
            tasks,
            sync: TaskSyncService::new(calendar),
            tokens,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost used for new passwords.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarClient> {
        self.sync.calendar()
    }
}
