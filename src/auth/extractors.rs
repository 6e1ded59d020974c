use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// Extracts the authenticated user's ID from request extensions.
///
/// This extractor is intended to be used on routes protected by `AuthMiddleware`,
/// which validates the JWT and inserts the user's ID into request extensions.
///
/// If the user ID is not found in the extensions (e.g. the route was mounted outside the
/// protected scope), this extractor returns `AppError::InvalidToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            None => {
                let err = AppError::InvalidToken("Authorization header required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
