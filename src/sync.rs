//! Task to calendar reconciliation.
//!
//! A task should have a remote event exactly when its owner has calendar sync enabled
//! with a stored credential, the task has a due date, and it is not completed.
//! The service only mutates `google_event_id` on the in-memory task; callers persist.

use std::sync::Arc;

use crate::calendar::{CalendarClient, CalendarToken, EventDetails};
use crate::error::AppError;
use crate::models::{Task, User};

/// What reconciling one task against its desired state requires.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    None,
    Create(EventDetails),
    Update(String, EventDetails),
    Remove(String),
}

/// Plans the action for `task`, assuming its owner has sync active.
pub fn plan(task: &Task) -> SyncAction {
    let desired = if task.is_completed() {
        None
    } else {
        EventDetails::for_task(task)
    };

    match (task.event_id(), desired) {
        (None, None) => SyncAction::None,
        (None, Some(event)) => SyncAction::Create(event),
        (Some(id), None) => SyncAction::Remove(id.to_string()),
        (Some(id), Some(event)) => SyncAction::Update(id.to_string(), event),
    }
}

#[derive(Clone)]
pub struct TaskSyncService {
    calendar: Arc<dyn CalendarClient>,
}

impl TaskSyncService {
    pub fn new(calendar: Arc<dyn CalendarClient>) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarClient> {
        &self.calendar
    }

    fn credential(user: &User) -> Option<Result<CalendarToken, AppError>> {
        user.calendar_credential().map(CalendarToken::from_json)
    }

    /// Creates or updates the event for `task`. Never deletes.
    pub async fn sync_task_to_calendar(&self, task: &mut Task, user: &User) -> Result<(), AppError> {
        if !user.calendar_sync_active() || task.due_date.is_none() {
            return Ok(());
        }
        let token = match Self::credential(user) {
            Some(token) => token?,
            None => return Ok(()),
        };
        let Some(event) = EventDetails::for_task(task) else {
            return Ok(());
        };

        match task.event_id() {
            Some(event_id) => {
                self.calendar.update_event(&token, event_id, &event).await?;
            }
            None => {
                let event_id = self.calendar.create_event(&token, &event).await?;
                log::debug!("task {} linked to event {}", task.id, event_id);
                task.google_event_id = Some(event_id);
            }
        }
        Ok(())
    }

    /// Deletes the task's event if it has one. Only a credential is required, the sync
    /// flag is ignored so disabling sync never strands events.
    pub async fn remove_task_from_calendar(
        &self,
        task: &mut Task,
        user: &User,
    ) -> Result<(), AppError> {
        let Some(event_id) = task.event_id() else {
            return Ok(());
        };
        let token = match Self::credential(user) {
            Some(token) => token?,
            None => return Ok(()),
        };

        self.calendar.delete_event(&token, event_id).await?;
        task.google_event_id = None;
        Ok(())
    }

    pub async fn handle_task_status_change(
        &self,
        task: &mut Task,
        user: &User,
    ) -> Result<(), AppError> {
        if task.is_completed() {
            return self.remove_task_from_calendar(task, user).await;
        }
        self.sync_task_to_calendar(task, user).await
    }

    /// Reconciles every task in order. The first create or update failure aborts the
    /// batch; tasks already handled keep their new references.
    pub async fn sync_all_user_tasks(
        &self,
        user: &User,
        tasks: &mut [Task],
    ) -> Result<(), AppError> {
        if !user.calendar_sync_active() {
            return Ok(());
        }
        let token = match Self::credential(user) {
            Some(token) => token?,
            None => return Ok(()),
        };

        for task in tasks.iter_mut() {
            match plan(task) {
                SyncAction::None => {}
                SyncAction::Create(event) => {
                    let event_id = self.calendar.create_event(&token, &event).await?;
                    task.google_event_id = Some(event_id);
                }
                SyncAction::Update(event_id, event) => {
                    self.calendar.update_event(&token, &event_id, &event).await?;
                }
                SyncAction::Remove(event_id) => {
                    if let Err(e) = self.calendar.delete_event(&token, &event_id).await {
                        log::warn!("ignoring failed delete of event {}: {}", event_id, e);
                    }
                    task.google_event_id = None;
                }
            }
        }

        log::info!("resynced {} tasks for user {}", tasks.len(), user.id);
        Ok(())
    }

    /// Drops the events of completed tasks. Delete failures are logged and ignored.
    pub async fn cleanup_completed_tasks(
        &self,
        user: &User,
        tasks: &mut [Task],
    ) -> Result<(), AppError> {
        let token = match Self::credential(user) {
            Some(token) => token?,
            None => return Ok(()),
        };

        for task in tasks.iter_mut().filter(|task| task.is_completed()) {
            let Some(event_id) = task.event_id().map(str::to_string) else {
                continue;
            };
            if let Err(e) = self.calendar.delete_event(&token, &event_id).await {
                log::warn!("ignoring failed delete of event {}: {}", event_id, e);
            }
            task.google_event_id = None;
        }
        Ok(())
    }
}
