#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;
use taskflow::auth::AuthResponse;
use taskflow::store::UserStore;

use common::harness;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let h = harness();
    let app = test_app!(h);

    let register_payload = json!({
        "name": "Ana",
        "email": "a@x.com",
        "password": "secret1"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert!(body["token"].as_str().map(|t| !t.is_empty()).unwrap_or(false));
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["calendar_sync"], false);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("google_token").is_none());

    // Same email again: rejected without creating a second record.
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(resp_conflict.status(), StatusCode::BAD_REQUEST);
    let conflict: serde_json::Value = test::read_body_json(resp_conflict).await;
    assert_eq!(conflict["error"], "Email already registered");
    assert_eq!(h.store.user_count().await, 1);

    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@x.com", "password": "secret1" }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    assert_eq!(resp_login.status(), StatusCode::OK);

    let login: AuthResponse = test::read_body_json(resp_login).await;
    assert_eq!(login.user.email, "a@x.com");
    let claims = h.tokens.verify_token(&login.token).unwrap();
    assert_eq!(claims.sub, login.user.id);

    // The token opens protected routes.
    let req_tasks = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", login.token)))
        .to_request();
    let resp_tasks = test::call_service(&app, req_tasks).await;
    assert_eq!(resp_tasks.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_stored_password_is_hashed() {
    let h = harness();
    let app = test_app!(h);

    common::register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();

    let user = h.store.find_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_ne!(user.password_hash, "secret1");
    assert!(user.password_hash.starts_with("$2"));
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness();
    let app = test_app!(h);
    common::register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();

    for payload in [
        json!({ "email": "a@x.com", "password": "wrong-password" }),
        json!({ "email": "nobody@x.com", "password": "secret1" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let h = harness();
    let app = test_app!(h);

    let test_cases = vec![
        // Deserialization errors
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "name": "ana", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
        ),
        // Validation errors
        (
            json!({ "name": "", "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "name": "ana", "email": "not-an-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "name": "ana", "email": "test@example.com", "password": "12345" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    ];

    for (payload, expected_status) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            expected_status,
            "Unexpected status for payload {}",
            payload
        );
    }
    assert_eq!(h.store.user_count().await, 0);
}

#[actix_rt::test]
async fn test_protected_routes_require_valid_token() {
    let h = harness();
    let app = test_app!(h);

    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let cases = [
        (None, "Authorization header required"),
        (
            Some("Basic YTpi".to_string()),
            "Authorization header format must be Bearer {token}",
        ),
        (Some("Bearer not.a.jwt".to_string()), "Invalid token"),
    ];

    for (authorization, message) in cases {
        let mut req = test::TestRequest::get().uri("/api/tasks");
        if let Some(value) = authorization {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], message);
    }
}
