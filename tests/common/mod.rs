// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::routing::{get as get_route, post};
use axum::{Form, Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // for oneshot
use washed_up_club::config::Config;
use washed_up_club::db::{NewChallenge, SqliteDb};
use washed_up_club::models::{
    Challenge, ChallengeStatus, ChallengeType, Profile, ProfileRole, TokenConnection,
};
use washed_up_club::routes::create_router;
use washed_up_club::services::identity::SESSION_COOKIE;
use washed_up_club::services::provisioning::shadow_email;
use washed_up_club::AppState;

// ─── Mock Strava ─────────────────────────────────────────────

/// Athlete the mock returns from a code exchange.
pub const MOCK_ATHLETE_ID: i64 = 4242;

#[derive(Default)]
pub struct MockCounters {
    pub token_exchanges: AtomicUsize,
    pub token_refreshes: AtomicUsize,
    pub activity_lists: AtomicUsize,
    pub activity_details: AtomicUsize,
}

#[derive(Default)]
struct MockData {
    activities: Vec<Value>,
    details: HashMap<i64, Value>,
    reject_refresh: bool,
}

#[derive(Clone, Default)]
struct MockState {
    counters: Arc<MockCounters>,
    data: Arc<Mutex<MockData>>,
}

/// Handle to a running mock of the Strava OAuth and REST endpoints.
pub struct MockStrava {
    pub oauth_base: String,
    pub api_base: String,
    pub counters: Arc<MockCounters>,
    data: Arc<Mutex<MockData>>,
}

impl MockStrava {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/oauth/token", post(mock_token))
            .route("/api/v3/athlete/activities", get_route(mock_activities))
            .route("/api/v3/activities/{id}", get_route(mock_activity))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            oauth_base: format!("http://{}/oauth", addr),
            api_base: format!("http://{}/api/v3", addr),
            counters: state.counters,
            data: state.data,
        }
    }

    /// Activities returned by the list endpoint.
    pub fn set_activities(&self, activities: Vec<Value>) {
        self.data.lock().unwrap().activities = activities;
    }

    /// Detailed activity returned for `id`.
    pub fn set_detail(&self, id: i64, detail: Value) {
        self.data.lock().unwrap().details.insert(id, detail);
    }

    /// Make the token endpoint answer refresh grants with 400 Bad Request.
    pub fn reject_refreshes(&self) {
        self.data.lock().unwrap().reject_refresh = true;
    }

    pub fn refreshes(&self) -> usize {
        self.counters.token_refreshes.load(Ordering::SeqCst)
    }

    pub fn exchanges(&self) -> usize {
        self.counters.token_exchanges.load(Ordering::SeqCst)
    }
}

async fn mock_token(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let expires_at = (Utc::now() + Duration::hours(6)).timestamp();
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            state.counters.token_exchanges.fetch_add(1, Ordering::SeqCst);
            if form.get("code").map(String::as_str) == Some("bad-code") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Bad Request" })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": "exchanged-access",
                    "refresh_token": "exchanged-refresh",
                    "expires_at": expires_at,
                    "athlete": {
                        "id": MOCK_ATHLETE_ID,
                        "username": "fastfeet",
                        "firstname": "Casey",
                        "lastname": "Runner"
                    }
                })),
            )
        }
        Some("refresh_token") => {
            let n = state.counters.token_refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            if state.data.lock().unwrap().reject_refresh {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Bad Request",
                        "errors": [{ "resource": "RefreshToken", "field": "refresh_token", "code": "invalid" }]
                    })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": format!("refreshed-access-{}", n),
                    "refresh_token": format!("refreshed-refresh-{}", n),
                    "expires_at": expires_at
                })),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "unsupported grant_type" })),
        ),
    }
}

async fn mock_activities(
    State(state): State<MockState>,
    axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>,
) -> Json<Value> {
    state.counters.activity_lists.fetch_add(1, Ordering::SeqCst);
    let page = params.get("page").map(String::as_str).unwrap_or("1");
    if page != "1" {
        return Json(json!([]));
    }
    Json(Value::Array(state.data.lock().unwrap().activities.clone()))
}

async fn mock_activity(
    State(state): State<MockState>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    state.counters.activity_details.fetch_add(1, Ordering::SeqCst);
    match state.data.lock().unwrap().details.get(&id) {
        Some(detail) => (StatusCode::OK, Json(detail.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Record Not Found" })),
        ),
    }
}

/// Activity summary as the list endpoint returns it.
pub fn activity_json(id: i64, start: DateTime<Utc>, distance: f64, elapsed: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Run {}", id),
        "sport_type": "Run",
        "start_date": start.to_rfc3339(),
        "distance": distance,
        "elapsed_time": elapsed
    })
}

// ─── Test App ────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub strava: MockStrava,
}

/// In-memory database with all tables created.
pub async fn test_db() -> SqliteDb {
    let db = SqliteDb::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db.migrate().await.expect("Failed to create tables");
    db
}

/// Full app wired to an in-memory database and a fresh mock Strava.
pub async fn create_test_app() -> TestApp {
    let strava = MockStrava::start().await;

    let mut config = Config::test_default();
    config.strava_oauth_base = strava.oauth_base.clone();
    config.strava_api_base = strava.api_base.clone();
    config.media_dir = std::env::temp_dir()
        .join(format!("wuc-media-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    config.admin_athlete_ids = vec![1];

    let db = test_db().await;
    let state = Arc::new(AppState::new(config, db).expect("Failed to build state"));

    TestApp {
        router: create_router(state.clone()),
        state,
        strava,
    }
}

// ─── Seeding ─────────────────────────────────────────────────

/// Create an account with a profile and a Strava connection whose token
/// expires at `token_expires_at`. Returns the user id.
pub async fn seed_user(
    state: &AppState,
    athlete_id: i64,
    role: ProfileRole,
    token_expires_at: DateTime<Utc>,
) -> String {
    let now = Utc::now();
    let user = state
        .identity
        .admin_create_user(&shadow_email(athlete_id), json!({}), now)
        .await
        .unwrap();

    state
        .db
        .insert_profile(&Profile {
            id: user.id.clone(),
            firstname: "Test".to_string(),
            lastname: format!("Athlete{}", athlete_id),
            username: format!("athlete{}", athlete_id),
            strava_athlete_id: Some(athlete_id),
            role,
            updated_at: now,
        })
        .await
        .unwrap();

    state
        .db
        .insert_connection(&TokenConnection {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            strava_athlete_id: athlete_id,
            access_token: format!("access-{}", athlete_id),
            refresh_token: format!("refresh-{}", athlete_id),
            expires_at: token_expires_at,
            scope: "activity:read_all,profile:read_all".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    user.id
}

/// Session JWT for a seeded user, minted the same way login does.
pub async fn session_token(state: &AppState, user_id: &str) -> String {
    let now = Utc::now();
    let user = state
        .identity
        .admin_get_user_by_id(user_id)
        .await
        .unwrap()
        .unwrap();
    let link = state
        .identity
        .admin_generate_magic_link(user.email.as_deref().unwrap(), now)
        .await
        .unwrap();
    state
        .identity
        .verify_magic_link(&link.hashed_token, now)
        .await
        .unwrap()
        .access_token
}

/// `Cookie` header value carrying a session for the user.
pub async fn session_cookie(state: &AppState, user_id: &str) -> String {
    format!("{}={}", SESSION_COOKIE, session_token(state, user_id).await)
}

/// Seeded admin with a long-lived Strava token. Returns the cookie header.
pub async fn admin_cookie(state: &AppState) -> String {
    let id = seed_user(state, 1, ProfileRole::Admin, Utc::now() + Duration::hours(6)).await;
    session_cookie(state, &id).await
}

pub async fn seed_challenge(
    state: &AppState,
    challenge_type: ChallengeType,
    goal_value: Option<i64>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: ChallengeStatus,
) -> Challenge {
    state
        .db
        .insert_challenge(
            &uuid::Uuid::new_v4().to_string(),
            &NewChallenge {
                title: "Test Challenge".to_string(),
                description: "A test challenge".to_string(),
                challenge_type,
                goal_value,
                segment_id: None,
                start_date,
                end_date,
                status,
                is_active: true,
            },
            Utc::now(),
        )
        .await
        .unwrap()
}

// ─── Requests ────────────────────────────────────────────────

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All `Set-Cookie` values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        json,
    }
}

pub async fn get(router: &Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(router, builder.body(Body::empty()).unwrap()).await
}

/// POST a urlencoded form built from `fields`.
pub async fn post_form(
    router: &Router,
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
) -> TestResponse {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(router, builder.body(Body::from(body)).unwrap()).await
}

/// Error message of a failed form action.
pub fn error_message(response: &TestResponse) -> &str {
    response.json["error"].as_str().unwrap_or_default()
}
