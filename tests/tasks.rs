#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;
use taskflow::calendar::{CalendarCall, MockBehaviour};
use taskflow::models::Task;
use taskflow::store::TaskStore;

use common::{connect_calendar, harness, register_user};

#[actix_rt::test]
async fn test_task_crud_flow() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(user.bearer())
        .set_json(json!({ "title": "Write report", "description": "Quarterly numbers" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Task = test::read_body_json(resp).await;
    assert_eq!(created.status, "pending");
    assert_eq!(created.priority, "medium");
    assert_eq!(created.user_id, user.id);
    assert_eq!(created.google_event_id, None);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.id, created.id);

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(user.bearer())
        .set_json(json!({ "title": "", "priority": "high", "status": "in-progress" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Task = test::read_body_json(resp).await;
    assert_eq!(updated.title, "Write report");
    assert_eq!(updated.priority, "high");
    assert_eq!(updated.status, "in-progress");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Task deleted successfully");

    // Soft deleted: gone from the API, still a row in the store.
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(h.store.task_rows().await, 1);

    // No calendar connected: the provider was never called.
    assert!(h.calendar.calls().is_empty());
}

#[actix_rt::test]
async fn test_tasks_are_private_to_their_owner() {
    let h = harness();
    let app = test_app!(h);
    let owner = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();
    let other = register_user(&app, "Bia", "b@x.com", "secret2")
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(owner.bearer())
        .set_json(json!({ "title": "Private" }))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;

    let uri = format!("/api/tasks/{}", task.id);
    for req in [
        test::TestRequest::get().uri(&uri),
        test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "title": "Hijacked" })),
        test::TestRequest::delete().uri(&uri),
    ] {
        let resp = test::call_service(&app, req.insert_header(other.bearer()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(other.bearer())
        .to_request();
    let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    let stored = h.store.find_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Private");
}

#[actix_rt::test]
async fn test_list_filters() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();

    for (title, status, priority) in [
        ("Pay rent", "pending", "high"),
        ("Buy milk", "completed", "low"),
        ("Rent a car", "pending", "low"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(user.bearer())
            .set_json(json!({ "title": title, "status": status, "priority": priority }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let cases = [
        ("/api/tasks", 3),
        ("/api/tasks?status=pending", 2),
        ("/api/tasks?priority=low", 2),
        ("/api/tasks?status=pending&priority=low", 1),
        ("/api/tasks?search=rent", 2),
    ];
    for (uri, expected) in cases {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(user.bearer())
            .to_request();
        let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), expected, "unexpected count for {}", uri);
    }
}

#[actix_rt::test]
async fn test_invalid_task_inputs() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();

    let cases = [
        (json!({ "description": "no title" }), StatusCode::BAD_REQUEST),
        (json!({ "title": "" }), StatusCode::UNPROCESSABLE_ENTITY),
        (
            json!({ "title": "a".repeat(201) }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "title": "Due whenever", "due_date": "tomorrow-ish" }),
            StatusCode::BAD_REQUEST,
        ),
    ];
    for (payload, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(user.bearer())
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "payload {}", payload);
    }
    assert_eq!(h.store.task_rows().await, 0);
}

#[actix_rt::test]
async fn test_task_lifecycle_follows_calendar() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();
    connect_calendar(&h, user.id).await;

    // Due task: an event is created before the task is stored.
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(user.bearer())
        .set_json(json!({ "title": "Dentist", "due_date": "2024-06-01 13:00:00" }))
        .to_request();
    let created: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created.google_event_id.as_deref(), Some("event-1"));
    let stored = h.store.find_task(created.id).await.unwrap().unwrap();
    assert_eq!(stored.google_event_id.as_deref(), Some("event-1"));

    // Priority is not mirrored on the calendar.
    let uri = format!("/api/tasks/{}", created.id);
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(user.bearer())
        .set_json(json!({ "priority": "high" }))
        .to_request();
    let _: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(h.calendar.updates(), 0);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(user.bearer())
        .set_json(json!({ "title": "Dentist (moved)" }))
        .to_request();
    let renamed: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(renamed.google_event_id.as_deref(), Some("event-1"));
    assert_eq!(h.calendar.updates(), 1);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(user.bearer())
        .set_json(json!({ "status": "completed" }))
        .to_request();
    let completed: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(completed.google_event_id, None);

    assert_eq!(
        h.calendar.calls(),
        vec![
            CalendarCall::Create {
                title: "Dentist".to_string()
            },
            CalendarCall::Update {
                event_id: "event-1".to_string(),
                title: "Dentist (moved)".to_string()
            },
            CalendarCall::Delete {
                event_id: "event-1".to_string()
            },
        ]
    );
}

#[actix_rt::test]
async fn test_provider_failure_on_create_stores_nothing() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();
    connect_calendar(&h, user.id).await;
    h.calendar.set_behaviour(MockBehaviour::fail_now(1));

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(user.bearer())
        .set_json(json!({ "title": "Dentist", "due_date": "2024-06-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(h.store.task_rows().await, 0);
}

#[actix_rt::test]
async fn test_delete_succeeds_when_event_removal_fails() {
    let h = harness();
    let app = test_app!(h);
    let user = register_user(&app, "Ana", "a@x.com", "secret1")
        .await
        .unwrap();
    connect_calendar(&h, user.id).await;

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(user.bearer())
        .set_json(json!({ "title": "Dentist", "due_date": "2024-06-01" }))
        .to_request();
    let created: Task = test::call_and_read_body_json(&app, req).await;

    h.calendar.set_behaviour(MockBehaviour {
        delete_behaviour: (0, 1),
        ..Default::default()
    });
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.calendar.deletes(), 1);
    assert!(h.store.find_task(created.id).await.unwrap().is_none());
}
