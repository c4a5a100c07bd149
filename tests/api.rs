//! HTTP-level tests of the service routes against the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use plank_back::{
    config::AppConfig, dao::store::memory::MemoryStore, routes, state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    routes::router(AppState::with_store(
        AppConfig::default(),
        Arc::new(MemoryStore::new()),
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn sign_up(app: &Router, email: &str, display_name: &str) -> String {
    let (status, _) = send(
        app,
        post_json(
            "/api/auth/register",
            None,
            json!({ "email": email, "password": "hunter22", "displayName": display_name }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        post_json(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "hunter22" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

async fn log_attempt(app: &Router, token: &str, seconds: u32) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/api/attempts",
            Some(token),
            json!({ "durationSeconds": seconds }),
        ),
    )
    .await
}

#[tokio::test]
async fn register_login_and_log_attempts() {
    let app = app();
    let token = sign_up(&app, "ann@example.com", "Ann").await;

    let (status, body) = log_attempt(&app, &token, 60).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isPersonalBest"], true);
    assert_eq!(body["message"], "New personal best!");
    assert_eq!(body["attempt"]["display"], "01:00");

    let (_, body) = log_attempt(&app, &token, 45).await;
    assert_eq!(body["isPersonalBest"], false);
    assert_eq!(body["message"], "Attempt logged successfully");

    let (_, body) = log_attempt(&app, &token, 60).await;
    assert_eq!(body["isPersonalBest"], false, "a tie keeps the old best");

    let (_, body) = log_attempt(&app, &token, 90).await;
    assert_eq!(body["isPersonalBest"], true);

    let (status, body) = send(&app, get("/api/attempts", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let attempts = body.as_array().unwrap();
    assert_eq!(attempts.len(), 4);
    let flagged: Vec<_> = attempts
        .iter()
        .filter(|attempt| attempt["isPersonalBest"] == true)
        .collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0]["durationSeconds"], 90);
}

#[tokio::test]
async fn out_of_range_duration_is_rejected_without_a_record() {
    let app = app();
    let token = sign_up(&app, "bob@example.com", "Bob").await;

    let (status, body) = log_attempt(&app, &token, 3601).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duration must be between 1 second and 1 hour");

    let (status, body) = send(
        &app,
        post_json("/api/attempts", Some(&token), json!({ "durationSeconds": "ten" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duration is required and must be a number");

    let (status, body) = send(
        &app,
        post_json(
            "/api/attempts",
            Some(&token),
            json!({ "durationSeconds": 30, "attemptedAt": "yesterday" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format");

    let (_, body) = send(&app, get("/api/attempts", Some(&token))).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = app();
    sign_up(&app, "cat@example.com", "Cat").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({ "email": "cat@example.com", "password": "another1", "displayName": "Cat Two" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    sign_up(&app, "dan@example.com", "Dan").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({ "email": "dan@example.com", "password": "nope-nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn leaderboard_ranks_best_times_and_skips_idle_users() {
    let app = app();
    let ann = sign_up(&app, "ann@example.com", "Ann").await;
    let bob = sign_up(&app, "bob@example.com", "Bob").await;
    sign_up(&app, "idle@example.com", "Idle").await;

    log_attempt(&app, &ann, 80).await;
    log_attempt(&app, &bob, 120).await;
    log_attempt(&app, &bob, 30).await;

    let (status, body) = send(&app, get("/api/leaderboard", Some(&ann))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["displayName"], "Bob");
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["bestTime"], 120);
    assert_eq!(entries[0]["isCurrentUser"], false);
    assert_eq!(entries[1]["displayName"], "Ann");
    assert_eq!(entries[1]["isCurrentUser"], true);

    let (status, body) = send(&app, get("/api/leaderboard/total", Some(&ann))).await;
    assert_eq!(status, StatusCode::OK);
    let totals = body.as_array().unwrap();
    assert_eq!(totals[0]["displayName"], "Bob");
    assert_eq!(totals[0]["totalTime"], 150);
    assert_eq!(totals[1]["totalTime"], 80);

    let (status, body) = send(&app, get("/api/leaderboard/total?year=1969", Some(&ann))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid year");
}

#[tokio::test]
async fn dashboard_reports_rank_and_placeholders() {
    let app = app();
    let ann = sign_up(&app, "ann@example.com", "Ann").await;

    let (status, body) = send(&app, get("/api/dashboard", Some(&ann))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["personalBestDisplay"], "--:--");
    assert_eq!(body["rank"], Value::Null);
    assert_eq!(body["recentAttempts"], json!([]));

    log_attempt(&app, &ann, 75).await;
    let (_, body) = send(&app, get("/api/dashboard", Some(&ann))).await;
    assert_eq!(body["personalBest"], 75);
    assert_eq!(body["personalBestDisplay"], "01:15");
    assert_eq!(body["rank"], 1);
    assert_eq!(body["totalUsers"], 1);
    assert_eq!(body["totalTime"], 75);
}

#[tokio::test]
async fn anonymous_api_calls_get_401_and_pages_redirect() {
    let app = app();

    let (status, body) = send(&app, get("/api/attempts", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn signed_in_visit_to_login_goes_home() {
    let app = app();
    let token = sign_up(&app, "eve@example.com", "Eve").await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/login")
                .header(header::COOKIE, format!("plank_session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = app();
    let token = sign_up(&app, "fay@example.com", "Fay").await;

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/logout", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let (status, _) = send(&app, get("/api/attempts", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn healthcheck_is_public() {
    let app = app();
    let (status, body) = send(&app, get("/healthcheck", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}
