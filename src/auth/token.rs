use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: i32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and validates HS256 bearer tokens with a process-wide signing key.
///
/// Built once from [`Config::jwt_secret`](crate::config::Config) and shared by the
/// auth handlers and [`AuthMiddleware`](super::AuthMiddleware).
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: &str) -> Self {
        // Expiry is exact: a token is rejected from its `exp` second onwards.
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Generates a JWT for a given user ID, valid for 24 hours.
    ///
    /// # Returns
    /// Returns `AppError::InternalServerError` if token encoding fails.
    pub fn generate_token(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT string and decodes its claims.
    ///
    /// Signature and expiration are checked.
    ///
    /// # Returns
    /// Returns `AppError::InvalidToken` if the token is malformed, its signature is invalid,
    /// or it has expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(format!("Invalid token: {}", e)))
    }
}
