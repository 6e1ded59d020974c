pub mod auth;
pub mod calendar;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::{auth::AuthenticatedUserId, error::AppError, models::User, state::AppState};

/// Mounts every `/api` route. The caller wraps the scope with `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/calendar")
            .service(calendar::auth_url)
            .service(calendar::callback)
            .service(calendar::toggle_sync)
            .service(calendar::status)
            .service(calendar::disconnect)
            .service(calendar::resync)
            .service(calendar::cleanup),
    );
}

/// The authenticated user's record. A valid token for a vanished account is a 404.
pub(crate) async fn load_user(
    state: &AppState,
    user_id: AuthenticatedUserId,
) -> Result<User, AppError> {
    state
        .users
        .find_user(user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
