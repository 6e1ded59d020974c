//! A calendar client that records every call instead of talking to a provider.
//!
//! Failures are scripted per operation as `(successes, failures)`: the first
//! `successes` calls pass, the next `failures` calls fail, later calls pass again.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CalendarClient, CalendarToken, EventDetails};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCall {
    Exchange { code: String },
    Create { title: String },
    Update { event_id: String, title: String },
    Delete { event_id: String },
}

#[derive(Debug, Default, Clone)]
pub struct MockBehaviour {
    pub exchange_behaviour: (u32, u32),
    pub create_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub delete_behaviour: (u32, u32),
}

impl MockBehaviour {
    fn slot_for(&mut self, call: &CalendarCall) -> &mut (u32, u32) {
        match call {
            CalendarCall::Exchange { .. } => &mut self.exchange_behaviour,
            CalendarCall::Create { .. } => &mut self.create_behaviour,
            CalendarCall::Update { .. } => &mut self.update_behaviour,
            CalendarCall::Delete { .. } => &mut self.delete_behaviour,
        }
    }

    /// Every operation fails for its next `n_fails` calls.
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            exchange_behaviour: (0, n_fails),
            create_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
        }
    }
}

#[derive(Default)]
struct MockState {
    behaviour: MockBehaviour,
    calls: Vec<CalendarCall>,
    next_event: u32,
}

#[derive(Default)]
pub struct MockCalendarClient {
    state: Mutex<MockState>,
}

impl MockCalendarClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(behaviour: MockBehaviour) -> Self {
        let mock = Self::default();
        mock.set_behaviour(behaviour);
        mock
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.lock().behaviour = behaviour;
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.lock().calls.clone()
    }

    pub fn creates(&self) -> usize {
        self.count(|call| matches!(call, CalendarCall::Create { .. }))
    }

    pub fn updates(&self) -> usize {
        self.count(|call| matches!(call, CalendarCall::Update { .. }))
    }

    pub fn deletes(&self) -> usize {
        self.count(|call| matches!(call, CalendarCall::Delete { .. }))
    }

    fn count(&self, predicate: impl Fn(&CalendarCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Records the call, then consumes one step of the scripted behaviour.
fn attempt(state: &mut MockState, call: CalendarCall) -> Result<(), AppError> {
    let description = format!("{:?}", call);
    let outcome = decrement(state.behaviour.slot_for(&call), &description);
    state.calls.push(call);
    outcome
}

fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), AppError> {
    if value.0 > 0 {
        value.0 -= 1;
        Ok(())
    } else if value.1 > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing {} ({:?})", descr, value);
        Err(AppError::ProviderError(format!(
            "mocked failure for {}",
            descr
        )))
    } else {
        Ok(())
    }
}

#[async_trait]
impl CalendarClient for MockCalendarClient {
    fn auth_url(&self, state: &str) -> String {
        format!("https://calendar.invalid/auth?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<CalendarToken, AppError> {
        let mut state = self.lock();
        attempt(
            &mut state,
            CalendarCall::Exchange {
                code: code.to_string(),
            },
        )?;

        Ok(CalendarToken {
            access_token: format!("access-{}", code),
            token_type: "Bearer".to_string(),
            refresh_token: format!("refresh-{}", code),
            expiry: None,
        })
    }

    async fn create_event(
        &self,
        _token: &CalendarToken,
        event: &EventDetails,
    ) -> Result<String, AppError> {
        let mut state = self.lock();
        attempt(
            &mut state,
            CalendarCall::Create {
                title: event.title.clone(),
            },
        )?;

        state.next_event += 1;
        Ok(format!("event-{}", state.next_event))
    }

    async fn update_event(
        &self,
        _token: &CalendarToken,
        event_id: &str,
        event: &EventDetails,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        attempt(
            &mut state,
            CalendarCall::Update {
                event_id: event_id.to_string(),
                title: event.title.clone(),
            },
        )
    }

    async fn delete_event(&self, _token: &CalendarToken, event_id: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        attempt(
            &mut state,
            CalendarCall::Delete {
                event_id: event_id.to_string(),
            },
        )
    }
}
