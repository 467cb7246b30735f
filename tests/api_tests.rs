// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health, layout, and home page endpoints.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_test_app, get, seed_user, session_cookie};
use washed_up_club::db::NewSchedule;
use washed_up_club::models::ProfileRole;

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let response = get(&app.router, "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
    assert!(response.json["build_id"].is_string());
}

#[tokio::test]
async fn test_api_responses_carry_security_headers() {
    let app = create_test_app().await;

    let response = get(&app.router, "/api/session", None).await;

    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(response.header("x-frame-options"), Some("DENY"));
    assert_eq!(response.header("cache-control"), Some("no-store"));
}

#[tokio::test]
async fn test_session_when_logged_out() {
    let app = create_test_app().await;

    let response = get(&app.router, "/api/session", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json["session"].is_null());
    assert!(response.json["user"].is_null());
    assert!(response.json["profile"].is_null());
}

#[tokio::test]
async fn test_session_when_logged_in() {
    let app = create_test_app().await;
    let user_id = seed_user(&app.state, 300, ProfileRole::User, Utc::now() + Duration::hours(2)).await;
    let cookie = session_cookie(&app.state, &user_id).await;

    let response = get(&app.router, "/api/session", Some(&cookie)).await;

    assert_eq!(response.json["user"]["id"], user_id.as_str());
    assert_eq!(response.json["profile"]["strava_athlete_id"], 300);
    assert_eq!(response.json["profile"]["role"], "user");
}

#[tokio::test]
async fn test_home_lists_active_content() {
    let app = create_test_app().await;
    let now = Utc::now();

    for (day, active) in [("Tuesday", true), ("Friday", false)] {
        let id = uuid::Uuid::new_v4().to_string();
        app.state
            .db
            .insert_schedule(
                &id,
                &NewSchedule {
                    day: day.to_string(),
                    time: "6:00 AM".to_string(),
                    location: "Rancho San Antonio".to_string(),
                    accent_color: "bg-sky-500".to_string(),
                    description: "Hill repeats".to_string(),
                },
                now,
            )
            .await
            .unwrap();
        if !active {
            app.state.db.set_schedule_active(&id, false, now).await.unwrap();
        }
    }

    let response = get(&app.router, "/api/home", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let schedules = response.json["routine_schedules"].as_array().unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0]["day"], "Tuesday");
    assert_eq!(response.json["has_session"], false);
    assert!(response.json["auth_error"].is_null());
}

#[tokio::test]
async fn test_home_explains_login_errors() {
    let app = create_test_app().await;

    let response = get(&app.router, "/api/home?error=oauth_denied", None).await;
    assert_eq!(response.json["auth_error"]["code"], "oauth_denied");
    assert_eq!(
        response.json["auth_error"]["message"],
        "Authorization was denied. Please try again."
    );

    let unknown_code = get(&app.router, "/api/home?error=something_else", None).await;
    assert!(unknown_code.json["auth_error"].is_null());
}
