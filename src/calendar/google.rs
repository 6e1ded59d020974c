use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CalendarClient, CalendarToken, EventDetails};
use crate::config::GoogleConfig;
use crate::error::AppError;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const CALENDAR_ID: &str = "primary";

/// Minutes before the event start.
const EMAIL_REMINDER_MINUTES: i64 = 24 * 60;
const POPUP_REMINDER_MINUTES: i64 = 30;

/// Google Calendar v3 over REST.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    time_zone: String,
    auth_endpoint: String,
    token_endpoint: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            http: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            time_zone: config.time_zone.clone(),
            auth_endpoint: GOOGLE_AUTH_URL.to_string(),
            token_endpoint: GOOGLE_TOKEN_URL.to_string(),
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
        }
    }

    /// Points the client at other OAuth and API hosts, e.g. a local mock server.
    pub fn with_endpoints(
        mut self,
        auth_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.auth_endpoint = auth_endpoint.into();
        self.token_endpoint = token_endpoint.into();
        self.api_base = api_base.into();
        self
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.api_base, CALENDAR_ID)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), event_id)
    }

    fn event_time(&self, event: &EventDetails) -> Value {
        let end = event.due + Duration::hours(1);
        json!({
            "summary": event.title,
            "description": event.description,
            "start": {
                "dateTime": event.due.to_rfc3339_opts(SecondsFormat::Secs, true),
                "timeZone": self.time_zone,
            },
            "end": {
                "dateTime": end.to_rfc3339_opts(SecondsFormat::Secs, true),
                "timeZone": self.time_zone,
            },
        })
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(params)
            .send()
            .await?;
        let response = check_status(response, "token request failed").await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    /// Returns a usable credential, refreshing the access token in memory when it has
    /// expired and a refresh token is available.
    async fn fresh_token(&self, token: &CalendarToken) -> Result<CalendarToken, AppError> {
        if !token.is_expired() || !token.can_refresh() {
            return Ok(token.clone());
        }

        log::debug!("calendar access token expired, refreshing");
        let refreshed = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .await?;

        let mut renewed = into_calendar_token(refreshed);
        // Google omits the refresh token on refresh responses.
        if renewed.refresh_token.is_empty() {
            renewed.refresh_token = token.refresh_token.clone();
        }
        Ok(renewed)
    }

    async fn authorized(
        &self,
        request: RequestBuilder,
        token: &CalendarToken,
    ) -> Result<RequestBuilder, AppError> {
        let token = self.fresh_token(token).await?;
        Ok(request.header(
            header::AUTHORIZATION,
            format!("{} {}", token.auth_scheme(), token.access_token),
        ))
    }
}

fn into_calendar_token(response: TokenResponse) -> CalendarToken {
    CalendarToken {
        access_token: response.access_token,
        token_type: response.token_type,
        refresh_token: response.refresh_token.unwrap_or_default(),
        expiry: response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    }
}

async fn check_status(response: Response, context: &str) -> Result<Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::ProviderError(format!(
        "{}: Google API error ({}): {}",
        context, status, error_text
    )))
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    fn auth_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.client_id)
            .append_pair("prompt", "consent")
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", CALENDAR_SCOPE)
            .append_pair("state", state)
            .finish();

        let separator = if self.auth_endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.auth_endpoint, separator, query)
    }

    async fn exchange_code(&self, code: &str) -> Result<CalendarToken, AppError> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .await
            .map_err(|e| AppError::ProviderError(format!("unable to exchange code: {}", e)))?;

        Ok(into_calendar_token(response))
    }

    async fn create_event(
        &self,
        token: &CalendarToken,
        event: &EventDetails,
    ) -> Result<String, AppError> {
        let mut body = self.event_time(event);
        body["reminders"] = json!({
            "useDefault": false,
            "overrides": [
                { "method": "email", "minutes": EMAIL_REMINDER_MINUTES },
                { "method": "popup", "minutes": POPUP_REMINDER_MINUTES },
            ],
        });

        let request = self
            .authorized(self.http.post(self.events_url()), token)
            .await?;
        let response = request.json(&body).send().await?;
        let created: CreatedEvent = check_status(response, "unable to create event")
            .await?
            .json()
            .await?;

        log::info!("created calendar event {}", created.id);
        Ok(created.id)
    }

    async fn update_event(
        &self,
        token: &CalendarToken,
        event_id: &str,
        event: &EventDetails,
    ) -> Result<(), AppError> {
        let request = self
            .authorized(self.http.patch(self.event_url(event_id)), token)
            .await?;
        let response = request.json(&self.event_time(event)).send().await?;
        check_status(response, "unable to update event").await?;

        log::debug!("updated calendar event {}", event_id);
        Ok(())
    }

    async fn delete_event(&self, token: &CalendarToken, event_id: &str) -> Result<(), AppError> {
        let request = self
            .authorized(self.http.delete(self.event_url(event_id)), token)
            .await?;
        let response = request.send().await?;
        check_status(response, "unable to delete event").await?;

        log::info!("deleted calendar event {}", event_id);
        Ok(())
    }
}
