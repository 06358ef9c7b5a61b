use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::HmacSignatureVerifier;
use api_lib::config::Config;
use api_lib::web::{router, state::AppState, subscription::SIGNATURE_HEADER};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use tracing::Level;

const ADMIN: &str = "admin@example.com";
const MEMBER: &str = "member@example.com";
const IDENTITY_HEADER: &str = "x-auth-request-email";
const SECRET: &str = "webhook-test-secret";

fn test_config(data_dir: &Path) -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        log_level: Level::INFO,
        data_dir: data_dir.to_path_buf(),
        admin_email: ADMIN.to_string(),
        pix_key: "pix-key-123".to_string(),
        webhook_secret: SECRET.to_string(),
        identity_email_header: IDENTITY_HEADER.to_string(),
        storage_timeout: Duration::from_secs(5),
        cors_origin: "http://localhost:4040".to_string(),
    }
}

fn test_app() -> (TempDir, Arc<AppState>, Router) {
    let dir = tempdir().unwrap();
    let state = Arc::new(AppState::from_config(Arc::new(test_config(dir.path()))));
    let app = router(state.clone());
    (dir, state, app)
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = user {
        builder = builder.header(IDENTITY_HEADER, email);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn webhook(body: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/pix")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn sign(body: &Value) -> String {
    HmacSignatureVerifier::new(SECRET)
        .sign(body.to_string().as_bytes())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (_dir, _state, app) = test_app();
    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_prompts_and_anyone_can_browse() {
    let (_dir, _state, app) = test_app();

    let created = app
        .clone()
        .oneshot(request(
            "POST",
            "/prompts/writing",
            Some(ADMIN),
            Some(json!({ "title": "Outline", "content": "Draft an outline", "tags": "essay, school", "isPublic": true })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["category"], "writing");
    assert_eq!(created["createdBy"], ADMIN);
    assert_eq!(created["tags"], json!(["essay", "school"]));
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let listed = app
        .clone()
        .oneshot(request("GET", "/prompts/writing", None, None))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(json_body(listed).await.as_array().unwrap().len(), 1);

    let updated = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/prompts/writing/{id}"),
            Some(ADMIN),
            Some(json!({ "content": "Draft a detailed outline" })),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = json_body(updated).await;
    assert_eq!(updated["content"], "Draft a detailed outline");
    assert_eq!(updated["title"], "Outline");
    assert_eq!(updated["tags"], json!(["essay", "school"]));

    let deleted = app
        .clone()
        .oneshot(request("DELETE", &format!("/prompts/writing/{id}"), Some(ADMIN), None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .clone()
        .oneshot(request("GET", &format!("/prompts/writing/{id}"), None, None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let deleted_again = app
        .oneshot(request("DELETE", &format!("/prompts/writing/{id}"), Some(ADMIN), None))
        .await
        .unwrap();
    assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn write_routes_require_an_administrator() {
    let (_dir, state, app) = test_app();
    let body = json!({ "title": "t", "content": "c" });

    let anonymous = app
        .clone()
        .oneshot(request("POST", "/prompts/x", None, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let member = app
        .oneshot(request("POST", "/prompts/x", Some(MEMBER), Some(body)))
        .await
        .unwrap();
    assert_eq!(member.status(), StatusCode::FORBIDDEN);

    assert!(state.prompts.list_prompts().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_prompt_fields_are_bad_requests() {
    let (_dir, _state, app) = test_app();
    let response = app
        .oneshot(request(
            "POST",
            "/prompts/x",
            Some(ADMIN),
            Some(json!({ "title": "   ", "content": "c" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_prompt_bodies_are_bad_requests() {
    let (_dir, state, app) = test_app();

    for body in [
        json!({ "content": "c" }),
        json!({ "title": "t", "content": "c", "tags": [1, 2] }),
    ] {
        let response = app
            .clone()
            .oneshot(request("POST", "/prompts/x", Some(ADMIN), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let created = app
        .clone()
        .oneshot(request(
            "POST",
            "/prompts/x",
            Some(ADMIN),
            Some(json!({ "title": "t", "content": "c" })),
        ))
        .await
        .unwrap();
    let id = json_body(created).await["id"].as_str().unwrap().to_string();

    let mistyped = app
        .oneshot(request(
            "PUT",
            &format!("/prompts/x/{id}"),
            Some(ADMIN),
            Some(json!({ "isPublic": "on" })),
        ))
        .await
        .unwrap();
    assert_eq!(mistyped.status(), StatusCode::BAD_REQUEST);

    let stored = state.prompts.get_prompt_by_id(&id).await.unwrap();
    assert!(!stored.is_public);
    assert_eq!(stored.created_at, stored.updated_at);
    assert_eq!(state.prompts.list_prompts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn administrators_can_list_subscriptions() {
    let (_dir, state, app) = test_app();
    state.subscriptions.mark_user_pro(MEMBER, true).await.unwrap();

    let member = app
        .clone()
        .oneshot(request("GET", "/users", Some(MEMBER), None))
        .await
        .unwrap();
    assert_eq!(member.status(), StatusCode::FORBIDDEN);

    let admin = app
        .oneshot(request("GET", "/users", Some(ADMIN), None))
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(json_body(admin).await, json!([{ "email": MEMBER, "isPro": true }]));
}

#[tokio::test]
async fn subscription_requires_sign_in_and_exposes_the_pix_key() {
    let (_dir, _state, app) = test_app();

    let anonymous = app
        .clone()
        .oneshot(request("GET", "/subscription", None, None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let member = app
        .oneshot(request("GET", "/subscription", Some(MEMBER), None))
        .await
        .unwrap();
    assert_eq!(member.status(), StatusCode::OK);
    let body = json_body(member).await;
    assert_eq!(body["pixCopyPaste"], "pix-key-123");
    assert_eq!(body["isPro"], false);
    assert_eq!(body["status"], "free");
}

#[tokio::test]
async fn completed_payment_upgrades_the_payer() {
    let (_dir, state, app) = test_app();
    let body = json!({ "status": "COMPLETED", "correlationID": format!("sub-{MEMBER}") });

    let response = app
        .clone()
        .oneshot(webhook(&body, Some(sign(&body))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));
    assert!(state.subscriptions.is_user_pro(MEMBER).await.unwrap());

    let me = app
        .oneshot(request("GET", "/me", Some(MEMBER), None))
        .await
        .unwrap();
    let me = json_body(me).await;
    assert_eq!(me["isPro"], true);
    assert_eq!(me["isAdmin"], false);
}

#[tokio::test]
async fn unsigned_or_forged_webhooks_change_nothing() {
    let (_dir, state, app) = test_app();
    let body = json!({ "status": "COMPLETED", "correlationID": format!("sub-{MEMBER}") });

    let unsigned = app.clone().oneshot(webhook(&body, None)).await.unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let forged_signature = HmacSignatureVerifier::new("wrong-secret")
        .sign(body.to_string().as_bytes())
        .unwrap();
    let forged = app.oneshot(webhook(&body, Some(forged_signature))).await.unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    assert!(!state.subscriptions.is_user_pro(MEMBER).await.unwrap());
    assert!(state.subscriptions.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn pending_payments_are_acknowledged_without_upgrading() {
    let (_dir, state, app) = test_app();
    let body = json!({ "status": "ACTIVE", "correlationID": format!("sub-{MEMBER}") });

    let response = app.oneshot(webhook(&body, Some(sign(&body)))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!state.subscriptions.is_user_pro(MEMBER).await.unwrap());
}

#[tokio::test]
async fn malformed_notifications_are_bad_requests() {
    let (_dir, _state, app) = test_app();

    let missing_fields = json!({ "status": "COMPLETED" });
    let response = app
        .clone()
        .oneshot(webhook(&missing_fields, Some(sign(&missing_fields))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let no_email = json!({ "status": "COMPLETED", "correlationID": "sub-nobody" });
    let response = app
        .oneshot(webhook(&no_email, Some(sign(&no_email))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn corrupt_collections_surface_as_server_errors() {
    let (dir, _state, app) = test_app();
    std::fs::write(dir.path().join("prompts.json"), "not json").unwrap();

    let response = app
        .oneshot(request("GET", "/prompts/writing", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("prompts.json")).unwrap(),
        "not json"
    );
}
