//! Google Calendar connection management and bulk reconciliation.
//!
//! Every endpoint acts on the authenticated user only.

use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{Task, TaskQuery},
    routes::load_user,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CallbackRequest {
    #[validate(length(min = 1))]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncToggleRequest {
    pub enable: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStatus {
    pub calendar_sync: bool,
    pub google_connected: bool,
}

/// OAuth `state` round-tripped through the provider for `user_id`.
pub fn oauth_state(user_id: i32) -> String {
    format!("user_{}", user_id)
}

#[post("/auth")]
pub async fn auth_url(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let auth_url = state.calendar().auth_url(&oauth_state(user_id.0));
    Ok(HttpResponse::Ok().json(AuthUrlResponse { auth_url }))
}

/// Exchanges the authorization code, stores the credential and turns sync on.
#[post("/callback")]
pub async fn callback(
    state: web::Data<AppState>,
    body: web::Json<CallbackRequest>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let mut user = load_user(&state, user_id).await?;
    let token = state.calendar().exchange_code(&body.code).await?;

    user.google_token = Some(token.to_json()?);
    user.calendar_sync = true;
    state.users.save_user(&user).await?;
    log::info!("user {} connected Google Calendar", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Google Calendar connected successfully",
        "sync_enabled": true
    })))
}

#[post("/sync")]
pub async fn toggle_sync(
    state: web::Data<AppState>,
    body: web::Json<SyncToggleRequest>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let mut user = load_user(&state, user_id).await?;
    user.calendar_sync = body.enable;
    state.users.save_user(&user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Calendar sync updated",
        "sync_enabled": body.enable
    })))
}

#[get("/status")]
pub async fn status(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, user_id).await?;
    Ok(HttpResponse::Ok().json(SyncStatus {
        calendar_sync: user.calendar_sync,
        google_connected: user.has_calendar_credential(),
    }))
}

/// Forgets the credential and disables sync. Existing remote events are left alone.
#[post("/disconnect")]
pub async fn disconnect(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let mut user = load_user(&state, user_id).await?;
    user.google_token = None;
    user.calendar_sync = false;
    state.users.save_user(&user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Google Calendar disconnected successfully"
    })))
}

/// Saves the tasks whose event reference differs from `before`.
async fn persist_references(
    state: &AppState,
    before: &[Task],
    after: &[Task],
) -> Result<usize, AppError> {
    let mut changed = 0;
    for (old, new) in before.iter().zip(after) {
        if old.google_event_id != new.google_event_id {
            state.tasks.save_task(new).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Reconciles every task of the caller with the calendar.
///
/// References written before a failure are saved even when the batch aborts.
#[post("/resync")]
pub async fn resync(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, user_id).await?;
    let before = state
        .tasks
        .list_user_tasks(user.id, &TaskQuery::default())
        .await?;
    let mut tasks = before.clone();

    let outcome = state.sync.sync_all_user_tasks(&user, &mut tasks).await;
    let changed = persist_references(&state, &before, &tasks).await?;
    outcome?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Tasks synced with Google Calendar",
        "tasks": tasks.len(),
        "changed": changed
    })))
}

#[post("/cleanup")]
pub async fn cleanup(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, user_id).await?;
    let before = state
        .tasks
        .list_user_tasks(user.id, &TaskQuery::default())
        .await?;
    let mut tasks = before.clone();

    let outcome = state.sync.cleanup_completed_tasks(&user, &mut tasks).await;
    let changed = persist_references(&state, &before, &tasks).await?;
    outcome?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Completed tasks removed from Google Calendar",
        "changed": changed
    })))
}
