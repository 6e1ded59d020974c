use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskRequest, Task, TaskQuery, UpdateTaskRequest},
    routes::load_user,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves a list of tasks for the authenticated user.
///
/// Supports filtering by `status` and `priority`, and a `search` term matched
/// case-insensitively against titles and descriptions. Newest tasks come first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query_params: web::Query<TaskQuery>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = state
        .tasks
        .list_user_tasks(user_id.0, &query_params)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// Status defaults to `pending` and priority to `medium`. When the owner has calendar
/// sync on and the task has a due date, the calendar event is created before the
/// task is stored, so the response already carries its `google_event_id`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: unparseable `due_date`.
/// - `422 Unprocessable Entity`: field validation failed.
/// - `502 Bad Gateway`: the calendar provider rejected the event.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<CreateTaskRequest>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let user = load_user(&state, user_id).await?;
    let mut task = Task::new(task_data.into_inner(), user.id)?;

    state.sync.handle_task_status_change(&mut task, &user).await?;

    let created = state.tasks.create_task(&task).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: the task does not exist, was deleted, or belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_user_task(user_id.0, task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates an existing task.
///
/// Only the fields present and non-empty in the body change; `"due_date": ""` clears
/// the due date. Changing the title, description, status or due date reconciles the
/// calendar event (completing a task removes it).
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `404 Not Found`: not found or not owned by the caller.
/// - `502 Bad Gateway`: the calendar provider call failed; nothing was saved.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut task = state
        .tasks
        .find_user_task(user_id.0, task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;

    if task.apply_update(task_data.into_inner())? {
        let user = load_user(&state, user_id).await?;
        state.sync.handle_task_status_change(&mut task, &user).await?;
    }

    let saved = state.tasks.save_task(&task).await?;
    Ok(HttpResponse::Ok().json(saved))
}

/// Deletes a task by its ID.
///
/// The calendar event, if any, is removed on a best-effort basis before the task is
/// deleted.
///
/// ## Responses:
/// - `200 OK`: `{ "message": "Task deleted successfully" }`.
/// - `404 Not Found`: not found or not owned by the caller.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let mut task = state
        .tasks
        .find_user_task(user_id.0, task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;

    if task.has_calendar_event() {
        let user = load_user(&state, user_id).await?;
        if let Err(e) = state.sync.remove_task_from_calendar(&mut task, &user).await {
            log::warn!("could not remove calendar event of task {}: {}", task.id, e);
        }
    }

    if !state.tasks.delete_user_task(user_id.0, task.id).await? {
        return Err(task_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
