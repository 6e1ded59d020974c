use crate::{
    auth::{hash_password_with_cost, verify_password, AuthResponse, LoginRequest, RegisterRequest},
    error::AppError,
    models::NewUser,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token together with
/// the created user.
///
/// ## Responses:
/// - `201 Created`: `{ token, user }`.
/// - `400 Bad Request`: the email is already registered.
/// - `422 Unprocessable Entity`: invalid name, email or password.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let register_data = register_data.into_inner();

    if state
        .users
        .find_user_by_email(&register_data.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_password_with_cost(&register_data.password, state.password_cost)?;

    let user = state
        .users
        .create_user(NewUser {
            name: register_data.name,
            email: register_data.email,
            password_hash,
        })
        .await?;

    let token = state.tokens.generate_token(user.id)?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown emails and
/// wrong passwords are indistinguishable to the caller.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = state
        .users
        .find_user_by_email(&login_data.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&login_data.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.generate_token(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}
