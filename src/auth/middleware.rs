use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUserId;
use crate::auth::token::TokenManager;
use crate::error::AppError;

const PUBLIC_PATHS: [&str; 3] = ["/health", "/api/auth/login", "/api/auth/register"];

/// Rejects requests without a valid bearer token and attaches the verified
/// [`AuthenticatedUserId`] to the request extensions otherwise.
pub struct AuthMiddleware {
    tokens: TokenManager,
}

impl AuthMiddleware {
    pub fn new(tokens: TokenManager) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    tokens: TokenManager,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.iter().any(|public| req.path().starts_with(public)) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) });
        }

        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let verified = parse_bearer(auth_header).and_then(|token| {
            self.tokens
                .verify_token(token)
                .map_err(|_| AppError::InvalidToken("Invalid token".into()))
        });

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(AuthenticatedUserId(claims.sub));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
            }
            Err(app_err) => {
                log::debug!("rejecting {} {}: {}", req.method(), req.path(), app_err);
                let response = req
                    .into_response(app_err.error_response())
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// The header must be exactly `Bearer <token>`: a missing header and any other
/// shape are rejected with distinct messages.
pub fn parse_bearer(header_value: Option<&str>) -> Result<&str, AppError> {
    let value = match header_value {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AppError::InvalidToken("Authorization header required".into())),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(token),
        _ => Err(AppError::InvalidToken(
            "Authorization header format must be Bearer {token}".into(),
        )),
    }
}
