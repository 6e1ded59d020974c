//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every layer (credential manager, identity middleware, task store, calendar adapter and
//! synchronizer) reports failures through it, so handlers can simply propagate with `?`.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert application errors
//! into HTTP responses with a `{"error": ...}` JSON body. `From` implementations for
//! `sqlx::Error`, `validator::ValidationErrors` and `reqwest::Error` cover the common
//! conversions. Token and hashing failures are mapped at their call sites.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Login failed (HTTP 401). Never carries detail about which part was wrong.
    InvalidCredentials,
    /// Missing, malformed, expired or badly signed bearer token (HTTP 401).
    InvalidToken(String),
    /// Malformed request that is not a field validation failure (HTTP 400),
    /// e.g. a duplicate email or an unparseable due date.
    BadRequest(String),
    /// Failed input validation (HTTP 422 Unprocessable Entity).
    /// Wraps errors from the `validator` crate.
    ValidationError(String),
    /// The requested resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// The external calendar provider call failed (HTTP 502).
    ProviderError(String),
    /// Persistence failure (HTTP 500). Wraps errors from the `sqlx` crate.
    StoreError(String),
    /// Unexpected server-side error (HTTP 500), e.g. hashing or signing failures.
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ProviderError(msg) => write!(f, "Calendar Provider Error: {}", msg),
            AppError::StoreError(msg) => write!(f, "Store Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            AppError::StoreError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            // Store details stay in the logs.
            AppError::StoreError(msg) => {
                log::error!("store error: {}", msg);
                "Internal storage error".to_string()
            }
            AppError::InvalidToken(msg)
            | AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::ProviderError(msg)
            | AppError::InternalServerError(msg) => msg.clone(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` maps to `AppError::NotFound`, everything else becomes
/// an opaque `AppError::StoreError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::StoreError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Transport and decoding failures talking to the calendar provider.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::ProviderError(error.to_string())
    }
}
