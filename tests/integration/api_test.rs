// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{start_receiver, TestApp};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use hookrelay::presentation::routes;
use serde_json::{json, Value};
use uuid::Uuid;

fn server(app: &TestApp) -> TestServer {
    TestServer::new(routes::routes(&app.services)).unwrap()
}

fn as_team(request: TestRequest, team_id: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-team-id"),
        HeaderValue::from_str(&team_id.to_string()).unwrap(),
    )
}

fn on_plan(request: TestRequest, plan: &'static str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-team-plan"),
        HeaderValue::from_static(plan),
    )
}

async fn create(server: &TestServer, team_id: Uuid, url: &str) -> Value {
    let response = on_plan(as_team(server.post("/v1/webhooks"), team_id), "paid")
        .json(&json!({
            "url": url,
            "eventTypes": ["email.sent"],
            "createdByUserId": Uuid::new_v4(),
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_and_version() {
    let app = TestApp::new();
    let server = server(&app);

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.text(), "OK");

    let version = server.get("/v1/version").await;
    assert_eq!(version.text(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_team_header_is_required() {
    let app = TestApp::new();
    let server = server(&app);

    let missing = server.get("/v1/webhooks").await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

    let invalid = server
        .get("/v1/webhooks")
        .add_header(
            HeaderName::from_static("x-team-id"),
            HeaderValue::from_static("not-a-uuid"),
        )
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

    let bad_plan = on_plan(as_team(server.post("/v1/webhooks"), Uuid::new_v4()), "gold")
        .json(&json!({
            "url": "https://example.com/hook",
            "eventTypes": ["email.sent"],
            "createdByUserId": Uuid::new_v4(),
        }))
        .await;
    assert_eq!(bad_plan.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_crud_over_http() {
    let app = TestApp::new();
    let server = server(&app);
    let team_id = Uuid::new_v4();

    let created = create(&server, team_id, "https://example.com/hook").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["secret"].as_str().unwrap().starts_with("whsec_"));
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["eventTypes"], json!(["email.sent"]));

    let fetched = as_team(server.get(&format!("/v1/webhooks/{id}")), team_id).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert!(fetched.json::<Value>().get("secret").is_none());

    let listed = as_team(server.get("/v1/webhooks"), team_id).await;
    assert_eq!(listed.json::<Vec<Value>>().len(), 1);

    let updated = as_team(server.patch(&format!("/v1/webhooks/{id}")), team_id)
        .json(&json!({ "eventTypes": ["email.opened", "email.clicked"] }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(
        updated.json::<Value>()["eventTypes"],
        json!(["email.opened", "email.clicked"])
    );

    let paused = as_team(server.put(&format!("/v1/webhooks/{id}/status")), team_id)
        .json(&json!({ "status": "PAUSED" }))
        .await;
    assert_eq!(paused.status_code(), StatusCode::OK);
    assert_eq!(paused.json::<Value>()["status"], "PAUSED");

    let to_deleted = as_team(server.put(&format!("/v1/webhooks/{id}/status")), team_id)
        .json(&json!({ "status": "DELETED" }))
        .await;
    assert_eq!(to_deleted.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let rotated = as_team(server.post(&format!("/v1/webhooks/{id}/rotate-secret")), team_id).await;
    assert_eq!(rotated.status_code(), StatusCode::OK);
    assert_ne!(rotated.json::<Value>()["secret"], created["secret"]);

    let other_team = as_team(server.get(&format!("/v1/webhooks/{id}")), Uuid::new_v4()).await;
    assert_eq!(other_team.status_code(), StatusCode::NOT_FOUND);

    let deleted = as_team(server.delete(&format!("/v1/webhooks/{id}")), team_id).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = as_team(server.get(&format!("/v1/webhooks/{id}")), team_id).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quota_and_validation_errors() {
    let app = TestApp::new();
    let server = server(&app);
    let team_id = Uuid::new_v4();

    let body = json!({
        "url": "https://example.com/hook",
        "eventTypes": ["email.sent"],
        "createdByUserId": Uuid::new_v4(),
    });

    let first = as_team(server.post("/v1/webhooks"), team_id).json(&body).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    // Free is the default plan
    let second = as_team(server.post("/v1/webhooks"), team_id).json(&body).await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    assert!(second.json::<Value>()["error"].as_str().is_some());

    let unknown = as_team(server.post("/v1/webhooks"), Uuid::new_v4())
        .json(&json!({
            "url": "https://example.com/hook",
            "eventTypes": ["email.sent", "email.teleported"],
            "createdByUserId": Uuid::new_v4(),
        }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_test_and_retry_over_http() {
    let receiver = start_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::with_policy(1, 10);
    let server = server(&app);
    let team_id = Uuid::new_v4();

    let created = create(&server, team_id, &receiver.url).await;
    let webhook_id = created["id"].as_str().unwrap().to_string();

    let published = as_team(server.post("/v1/events"), team_id)
        .json(&json!({ "eventType": "email.sent", "data": { "emailId": "http-1" } }))
        .await;
    assert_eq!(published.status_code(), StatusCode::ACCEPTED);
    let published = published.json::<Value>();
    assert_eq!(published["eventType"], "email.sent");
    assert_eq!(published["deliveries"].as_array().unwrap().len(), 1);
    assert_eq!(published["deliveries"][0]["attemptNumber"], 1);
    assert_eq!(published["deliveries"][0]["webhookId"], webhook_id.as_str());

    let unknown = as_team(server.post("/v1/events"), team_id)
        .json(&json!({ "eventType": "email.teleported", "data": {} }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

    app.drain().await;
    assert_eq!(receiver.hits(), 1);

    let tested = as_team(server.post(&format!("/v1/webhooks/{webhook_id}/test")), team_id).await;
    assert_eq!(tested.status_code(), StatusCode::OK);
    assert_eq!(tested.json::<Value>()["status"], "FAILED");
    assert_eq!(receiver.hits(), 2);

    let page = as_team(server.get("/v1/webhook-calls"), team_id)
        .add_query_param("limit", 1)
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
    let page = page.json::<Value>();
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    let next_cursor = page["nextCursor"].as_str().unwrap().to_string();

    let rest = as_team(server.get("/v1/webhook-calls"), team_id)
        .add_query_param("limit", 1)
        .add_query_param("cursor", &next_cursor)
        .await
        .json::<Value>();
    assert_eq!(rest["items"][0]["id"], next_cursor.as_str());
    assert!(rest["nextCursor"].is_null());

    let bad_cursor = as_team(server.get("/v1/webhook-calls"), team_id)
        .add_query_param("cursor", Uuid::new_v4())
        .await;
    assert_eq!(bad_cursor.status_code(), StatusCode::BAD_REQUEST);

    let call = as_team(server.get(&format!("/v1/webhook-calls/{next_cursor}")), team_id).await;
    assert_eq!(call.status_code(), StatusCode::OK);

    receiver.respond_with(StatusCode::OK);
    let retried = as_team(
        server.post(&format!("/v1/webhook-calls/{next_cursor}/retry")),
        team_id,
    )
    .await;
    assert_eq!(retried.status_code(), StatusCode::ACCEPTED);
    let retried = retried.json::<Value>();
    assert_eq!(retried["attemptNumber"], 1);
    assert_eq!(retried["status"], "PENDING");

    app.drain().await;
    assert_eq!(receiver.hits(), 3);

    let missing = as_team(
        server.post(&format!("/v1/webhook-calls/{}/retry", Uuid::new_v4())),
        team_id,
    )
    .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
