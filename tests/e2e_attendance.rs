//! E2E tests for attendance endpoints

mod common;

use common::TestServer;
use serde_json::{Value, json};

async fn post(server: &TestServer, path: &str, token: &str, body: Value) -> reqwest::Response {
    server
        .client
        .post(server.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_attendance_requires_bearer_token() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/attendance"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .post(server.url("/api/attendance/toggle"))
        .bearer_auth("forged")
        .json(&json!({ "lab_id": "lab-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_toggle_checks_in_then_out() {
    let server = TestServer::new().await;
    let user = server.create_test_user("1", "octocat").await;
    let token = server.bearer_token(&user);

    let response = post(
        &server,
        "/api/attendance/toggle",
        &token,
        json!({ "lab_id": "lab-1", "notes": "arrived" }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["action"], "check_in");
    assert_eq!(first["status"], "created");
    assert_eq!(first["record"]["lab_id"], "lab-1");
    assert_eq!(first["record"]["user_id"], user.id);
    assert!(first["record"]["check_out"].is_null());
    assert!(first.get("duration").is_none());

    let response = post(&server, "/api/attendance/toggle", &token, json!({ "lab_id": "lab-1" })).await;
    assert_eq!(response.status(), 200);
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["action"], "check_out");
    assert_eq!(second["record"]["id"], first["record"]["id"]);
    assert!(second["record"]["check_out"].is_string());
    assert_eq!(second["record"]["notes"], "arrived");
    assert_eq!(second["duration"], "0m");
    assert!(second.get("status").is_none());
}

#[tokio::test]
async fn test_toggle_accepts_numeric_lab_id() {
    let server = TestServer::new().await;
    let user = server.create_test_user("1", "octocat").await;
    let token = server.bearer_token(&user);

    let response = post(&server, "/api/attendance/toggle", &token, json!({ "lab_id": 42 })).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["record"]["lab_id"], "42");
}

#[tokio::test]
async fn test_missing_lab_id_is_bad_request() {
    let server = TestServer::new().await;
    let user = server.create_test_user("1", "octocat").await;
    let token = server.bearer_token(&user);

    for path in ["/api/attendance/toggle", "/api/attendance/check-in"] {
        for body in [json!({}), json!({ "lab_id": "" }), json!({ "lab_id": "   " })] {
            let response = post(&server, path, &token, body).await;
            assert_eq!(response.status(), 400, "{path}");
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["error"], "lab_id is required");
        }
    }

    // No body and no Content-Type reads as `{}`
    for path in ["/api/attendance/toggle", "/api/attendance/check-in"] {
        let response = server
            .client
            .post(server.url(path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "{path} without body");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "lab_id is required");
    }

    // A lab id that is neither a string nor an integer
    for lab_id in [json!(true), json!(1.5), json!(["lab-1"])] {
        let response = post(&server, "/api/attendance/check-in", &token, json!({ "lab_id": lab_id.clone() })).await;
        assert_eq!(response.status(), 400, "lab_id {lab_id}");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    // Nothing was recorded
    assert!(server.state.db.list_attendance(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_in_conflicts_when_already_open() {
    let server = TestServer::new().await;
    let user = server.create_test_user("1", "octocat").await;
    let token = server.bearer_token(&user);

    let response = post(&server, "/api/attendance/check-in", &token, json!({ "lab_id": "lab-1" })).await;
    assert_eq!(response.status(), 201);
    let record: Value = response.json().await.unwrap();
    assert!(record["check_out"].is_null());

    let response = post(&server, "/api/attendance/check-in", &token, json!({ "lab_id": "lab-1" })).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Already checked in to this lab");
    assert_eq!(body["record"]["id"], record["id"]);

    // A different lab is independent
    let response = post(&server, "/api/attendance/check-in", &token, json!({ "lab_id": "lab-2" })).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_list_is_scoped_to_user_and_newest_first() {
    let server = TestServer::new().await;
    let alice = server.create_test_user("1", "alice").await;
    let bob = server.create_test_user("2", "bob").await;
    let alice_token = server.bearer_token(&alice);
    let bob_token = server.bearer_token(&bob);

    post(&server, "/api/attendance/toggle", &alice_token, json!({ "lab_id": "lab-1" })).await;
    post(&server, "/api/attendance/toggle", &alice_token, json!({ "lab_id": "lab-1" })).await;
    post(&server, "/api/attendance/toggle", &alice_token, json!({ "lab_id": "lab-2" })).await;
    post(&server, "/api/attendance/toggle", &bob_token, json!({ "lab_id": "lab-1" })).await;

    let records: Vec<Value> = server
        .client
        .get(server.url("/api/attendance"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record["user_id"] == alice.id));
    assert_eq!(records[0]["lab_id"], "lab-2");
    assert_eq!(records[1]["lab_id"], "lab-1");

    let records: Vec<Value> = server
        .client
        .get(server.url("/api/attendance"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_concurrent_toggles_leave_one_open_record_at_most() {
    let server = TestServer::new().await;
    let user = server.create_test_user("1", "octocat").await;
    let token = server.bearer_token(&user);

    let (a, b) = tokio::join!(
        post(&server, "/api/attendance/toggle", &token, json!({ "lab_id": "lab-1" })),
        post(&server, "/api/attendance/toggle", &token, json!({ "lab_id": "lab-1" }))
    );

    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 201]);

    let records = server.state.db.list_attendance(user.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_open());
}
