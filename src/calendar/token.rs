use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Access tokens this close to expiry are treated as already expired.
const EXPIRY_DELTA_SECS: i64 = 10;

/// OAuth2 credential bundle for the calendar provider.
///
/// Stored on the user as an opaque JSON string. Field names follow the common OAuth2
/// token layout so credentials written by other clients stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl CalendarToken {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::ProviderError(format!("invalid calendar credential: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::ProviderError(format!("unable to serialize credential: {}", e)))
    }

    /// A missing or zero-valued expiry never expires.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) if expiry.year() > 1 => {
                expiry - Duration::seconds(EXPIRY_DELTA_SECS) <= Utc::now()
            }
            _ => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// `Authorization` scheme; providers send `Bearer` but older credentials may omit it.
    pub fn auth_scheme(&self) -> &str {
        if self.token_type.is_empty() {
            "Bearer"
        } else {
            &self.token_type
        }
    }
}
