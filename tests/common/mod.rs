#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{http::header, test};
use serde_json::json;
use taskflow::auth::{AuthResponse, TokenManager};
use taskflow::calendar::MockCalendarClient;
use taskflow::store::InMemoryStore;
use taskflow::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Shared collaborators behind a test app, kept so tests can inspect them.
pub struct Harness {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub calendar: Arc<MockCalendarClient>,
    pub tokens: TokenManager,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let calendar = Arc::new(MockCalendarClient::new());
    let tokens = TokenManager::new(TEST_SECRET);
    let state = AppState::new(store.clone(), store.clone(), calendar.clone(), tokens.clone())
        .with_password_cost(4);

    Harness {
        state,
        store,
        calendar,
        tokens,
    }
}

/// Builds the same service tree as the binary around `$harness`.
macro_rules! test_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($harness.state.clone()))
                .wrap(
                    actix_cors::Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(actix_web::middleware::Logger::default())
                .service(taskflow::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(taskflow::auth::AuthMiddleware::new($harness.tokens.clone()))
                        .configure(taskflow::routes::config),
                ),
        )
        .await
    };
}

pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let auth: AuthResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    Ok(TestUser {
        id: auth.user.id,
        token: auth.token,
    })
}

/// Marks `user_id` as connected with a credential the mock calendar accepts.
pub async fn connect_calendar(harness: &Harness, user_id: i32) {
    use taskflow::store::UserStore;

    let mut user = harness
        .store
        .find_user(user_id)
        .await
        .unwrap()
        .expect("user exists");
    user.google_token = Some(r#"{"access_token":"access","token_type":"Bearer"}"#.to_string());
    user.calendar_sync = true;
    harness.store.save_user(&user).await.unwrap();
}
