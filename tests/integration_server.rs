#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        HeaderMap, Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, HOST, ORIGIN, RETRY_AFTER, SET_COOKIE},
    },
};
use chrono::Local;
use noteora::{
    api::{
        app,
        handlers::{
            auth::{AuthConfig, AuthState, clock::ManualClock},
            records::RecordsState,
        },
    },
    records::{MemoryRecordStore, Record, RecordStore},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "ABC123";
const CLIENT: &str = "1.2.3.4";
const HOST_NAME: &str = "outreach.example.com";

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
    store: Arc<MemoryRecordStore>,
}

fn harness_with(config: AuthConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(Local::now().timestamp_millis()));
    let auth_state = Arc::new(AuthState::with_clock(config, clock.clone()).unwrap());
    let store = Arc::new(MemoryRecordStore::default());
    let records_state = Arc::new(RecordsState::with_clock(
        store.clone(),
        Vec::new(),
        clock.clone(),
    ));
    Harness {
        app: app(auth_state, records_state),
        clock,
        store,
    }
}

fn harness() -> Harness {
    harness_with(
        AuthConfig::new()
            .with_secret_code(Some(SecretString::from(SECRET)))
            .with_session_key(Some(SecretString::from("integration"))),
    )
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
    }
}

fn validate_request(code: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/validate-code")
        .header(HOST, HOST_NAME)
        .header("x-forwarded-for", CLIENT)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "code": code }).to_string()))
        .unwrap()
}

fn session_cookie(reply: &Reply) -> String {
    let set_cookie = reply.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn sign_in(harness: &Harness) -> String {
    let reply = send(&harness.app, validate_request(SECRET)).await;
    assert_eq!(reply.status, StatusCode::OK);
    session_cookie(&reply)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).header(HOST, HOST_NAME);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn correct_code_after_failures_resets_attempts() {
    let harness = harness();
    for expected_remaining in [4, 3, 2, 1] {
        let reply = send(&harness.app, validate_request("wrong")).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["remainingAttempts"], expected_remaining);
        assert_eq!(reply.body["locked"], false);
    }

    let reply = send(&harness.app, validate_request(SECRET)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    let set_cookie = reply.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=86400"));
    assert!(!set_cookie.contains("Secure"));

    // History was cleared: a fresh failure starts from the full budget again.
    let reply = send(&harness.app, validate_request("wrong")).await;
    assert_eq!(reply.body["remainingAttempts"], 4);
}

#[tokio::test]
async fn fifth_failure_locks_client_out() {
    let harness = harness();
    for _ in 0..4 {
        send(&harness.app, validate_request("wrong")).await;
    }

    let reply = send(&harness.app, validate_request("wrong")).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["locked"], true);
    assert_eq!(reply.body["remainingSeconds"], 60);
    assert_eq!(reply.headers.get(RETRY_AFTER).unwrap(), "60");

    // Ten seconds later even the right code is refused.
    harness.clock.advance(10_000);
    let reply = send(&harness.app, validate_request(SECRET)).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.body["locked"], true);
    assert_eq!(reply.body["remainingSeconds"], 50);

    harness.clock.advance(50_000);
    let reply = send(&harness.app, validate_request(SECRET)).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn lockout_is_per_client() {
    let harness = harness();
    for _ in 0..5 {
        send(&harness.app, validate_request("wrong")).await;
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/validate-code")
        .header(HOST, HOST_NAME)
        .header("x-forwarded-for", "5.6.7.8")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "code": SECRET }).to_string()))
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn missing_code_is_bad_request_and_not_counted() {
    let harness = harness();
    for body in [json!({}), json!({ "code": "" })] {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/validate-code")
            .header(HOST, HOST_NAME)
            .header("x-forwarded-for", CLIENT)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let reply = send(&harness.app, request).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["message"], "Access code is required");
    }

    let reply = send(&harness.app, validate_request("wrong")).await;
    assert_eq!(reply.body["remainingAttempts"], 4);
}

#[tokio::test]
async fn missing_secret_is_server_error() {
    let harness = harness_with(AuthConfig::new());
    let reply = send(&harness.app, validate_request("anything")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["success"], false);
    assert!(reply.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn cross_origin_code_validation_is_forbidden() {
    let harness = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/validate-code")
        .header(HOST, HOST_NAME)
        .header(ORIGIN, "https://evil.example.net")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "code": SECRET }).to_string()))
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn production_cookie_is_secure() {
    let harness = harness_with(
        AuthConfig::new()
            .with_secret_code(Some(SecretString::from(SECRET)))
            .with_session_cookie_secure(true),
    );
    let reply = send(&harness.app, validate_request(SECRET)).await;
    let set_cookie = reply.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.ends_with("; Secure"));
}

#[tokio::test]
async fn check_session_reports_cookie_validity() {
    let harness = harness();
    let reply = send(&harness.app, get("/api/check-session", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["authenticated"], false);

    let cookie = sign_in(&harness).await;
    let reply = send(&harness.app, get("/api/check-session", Some(&cookie))).await;
    assert_eq!(reply.body["authenticated"], true);

    harness.clock.advance(86_400_001);
    let reply = send(&harness.app, get("/api/check-session", Some(&cookie))).await;
    assert_eq!(reply.body["authenticated"], false);
}

#[tokio::test]
async fn record_routes_require_session_and_same_origin() {
    let harness = harness();
    let reply = send(&harness.app, get("/api/search?query=abc", None)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);

    let reply = send(
        &harness.app,
        get("/api/search?query=abc", Some("session=forged")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let cookie = sign_in(&harness).await;
    let request = Request::builder()
        .uri("/api/search?query=abc")
        .header(HOST, HOST_NAME)
        .header(ORIGIN, "https://evil.example.net")
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/api/search?query=abc")
        .header(HOST, HOST_NAME)
        .header(ORIGIN, format!("https://{HOST_NAME}"))
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn add_then_search_and_today() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let today = Local::now().format("%Y-%m-%d").to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/add")
        .header(HOST, HOST_NAME)
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "ticker": "ABC",
                "projectName": "Alpha Protocol",
                "xHandle": "@alpha",
                "contactPerson": "Ash",
                "initialRecordingDate": today,
            })
            .to_string(),
        ))
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    assert_eq!(harness.store.len(), 1);

    let reply = send(&harness.app, get("/api/search?query=ALPHA", Some(&cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"][0]["ticker"], "ABC");

    let reply = send(&harness.app, get("/api/today-entries", Some(&cookie))).await;
    assert_eq!(reply.body["totalCount"], 1);
    assert_eq!(reply.body["personCounts"]["Ash"], 1);
}

#[tokio::test]
async fn add_without_identity_is_bad_request() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/add")
        .header(HOST, HOST_NAME)
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "xHandle": "@nobody" }).to_string()))
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn reports_use_default_thresholds() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let stale = (Local::now() - chrono::Duration::days(30))
        .format("%Y-%m-%d")
        .to_string();
    let due = (Local::now() - chrono::Duration::days(12))
        .format("%Y-%m-%d")
        .to_string();
    harness
        .store
        .insert(Record {
            ticker: "OLD".to_string(),
            contact_person: "Bob".to_string(),
            initial_recording_date: stale,
            ..Record::default()
        })
        .unwrap();
    harness
        .store
        .insert(Record {
            ticker: "DUE".to_string(),
            contact_person: "yvonne".to_string(),
            initial_recording_date: due,
            ..Record::default()
        })
        .unwrap();

    let reply = send(&harness.app, get("/api/inactive?days=abc", Some(&cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(reply.body["data"][0]["ticker"], "OLD");
    assert_eq!(reply.body["data"][0]["daysInactive"], 30);

    let reply = send(&harness.app, get("/api/followup", Some(&cookie))).await;
    assert_eq!(reply.body["count"], 1);
    assert_eq!(reply.body["data"][0]["ticker"], "DUE");

    let reply = send(&harness.app, get("/api/new-entry?minutes=0", Some(&cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 0);
}

#[tokio::test]
async fn oversized_day_count_is_answered() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let reply = send(
        &harness.app,
        get("/api/followup?days=9223372036854775807", Some(&cookie)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 0);
}

#[tokio::test]
async fn malformed_record_body_is_bad_request() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/add")
        .header(HOST, HOST_NAME)
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["message"], "Invalid record payload");
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn uri_authority_is_used_without_host_header() {
    let harness = harness();
    let cookie = sign_in(&harness).await;
    let request = |origin: &str| {
        Request::builder()
            .uri(format!("https://{HOST_NAME}/api/search?query=abc"))
            .header(ORIGIN, origin)
            .header(COOKIE, &cookie)
            .body(Body::empty())
            .unwrap()
    };

    let reply = send(&harness.app, request(&format!("https://{HOST_NAME}"))).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&harness.app, request("https://evil.example.net")).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let harness = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/logout")
        .header(HOST, HOST_NAME)
        .body(Body::empty())
        .unwrap();
    let reply = send(&harness.app, request).await;
    assert_eq!(reply.status, StatusCode::OK);
    let set_cookie = reply.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn health_and_request_id() {
    let harness = harness();
    let reply = send(&harness.app, get("/health", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(reply.body["records"], "ok");
    assert!(reply.headers.get("x-request-id").is_some());
    assert!(reply.headers.get("X-App").is_some());
}
