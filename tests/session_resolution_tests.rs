// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request session resolution and lazy Strava token refresh.

mod common;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use common::{create_test_app, seed_user, session_token};
use washed_up_club::models::ProfileRole;
use washed_up_club::services::identity::SESSION_COOKIE;

fn jar_with(token: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.to_string()))
}

#[tokio::test]
async fn test_no_cookie_resolves_to_empty_context() {
    let app = create_test_app().await;
    let user_id = seed_user(
        &app.state,
        100,
        ProfileRole::User,
        Utc::now() - Duration::minutes(1),
    )
    .await;

    let ctx = app.state.sessions.resolve(&CookieJar::new(), Utc::now()).await;

    assert!(ctx.session.is_none());
    assert!(ctx.user.is_none());
    assert!(ctx.profile.is_none());
    assert_eq!(app.strava.refreshes(), 0, "No refresh without a session");

    // The expired token was left alone
    let conn = app
        .state
        .db
        .get_connection_by_user(&user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conn.access_token, "access-100");
}

#[tokio::test]
async fn test_token_expiring_within_margin_is_refreshed() {
    let app = create_test_app().await;
    let now = Utc::now();
    let user_id = seed_user(&app.state, 101, ProfileRole::User, now + Duration::minutes(4)).await;
    let token = session_token(&app.state, &user_id).await;

    let ctx = app.state.sessions.resolve(&jar_with(&token), now).await;

    assert_eq!(ctx.user.as_ref().map(|u| u.id.as_str()), Some(user_id.as_str()));
    assert_eq!(ctx.profile.as_ref().map(|p| p.id.as_str()), Some(user_id.as_str()));
    assert_eq!(app.strava.refreshes(), 1);

    let conn = app
        .state
        .db
        .get_connection_by_user(&user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conn.access_token, "refreshed-access-1");
    assert_eq!(conn.refresh_token, "refreshed-refresh-1");
    assert!(conn.expires_at > now + Duration::hours(1));
}

#[tokio::test]
async fn test_token_with_time_left_is_not_refreshed() {
    let app = create_test_app().await;
    let now = Utc::now();
    let user_id = seed_user(&app.state, 102, ProfileRole::User, now + Duration::minutes(10)).await;
    let token = session_token(&app.state, &user_id).await;

    let ctx = app.state.sessions.resolve(&jar_with(&token), now).await;

    assert!(ctx.authenticated_profile().is_some());
    assert_eq!(app.strava.refreshes(), 0);

    let conn = app
        .state
        .db
        .get_connection_by_user(&user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conn.access_token, "access-102");
}

#[tokio::test]
async fn test_failed_refresh_keeps_session_and_tokens() {
    let app = create_test_app().await;
    app.strava.reject_refreshes();
    let now = Utc::now();
    let expires_at = now + Duration::minutes(2);
    let user_id = seed_user(&app.state, 103, ProfileRole::User, expires_at).await;
    let token = session_token(&app.state, &user_id).await;

    let ctx = app.state.sessions.resolve(&jar_with(&token), now).await;

    assert!(ctx.session.is_some());
    assert_eq!(ctx.user.as_ref().map(|u| u.id.as_str()), Some(user_id.as_str()));
    assert!(ctx.authenticated_profile().is_some());
    assert_eq!(app.strava.refreshes(), 1);

    let conn = app
        .state
        .db
        .get_connection_by_user(&user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conn.access_token, "access-103");
    assert_eq!(conn.refresh_token, "refresh-103");
    assert_eq!(conn.expires_at.timestamp(), expires_at.timestamp());
}

#[tokio::test]
async fn test_forged_session_is_rejected() {
    let app = create_test_app().await;
    let now = Utc::now();
    let user_id = seed_user(&app.state, 103, ProfileRole::Admin, now - Duration::minutes(1)).await;

    // Valid structure, wrong key
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &serde_json::json!({
            "sub": user_id,
            "exp": (now + Duration::hours(1)).timestamp(),
            "iat": now.timestamp(),
        }),
        &jsonwebtoken::EncodingKey::from_secret(b"some other secret"),
    )
    .unwrap();

    let ctx = app.state.sessions.resolve(&jar_with(&forged), now).await;
    assert!(ctx.user.is_none());
    assert!(ctx.admin_profile().is_none());
    assert_eq!(app.strava.refreshes(), 0);

    let ctx = app.state.sessions.resolve(&jar_with("not-a-jwt"), now).await;
    assert!(ctx.session.is_none());
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let app = create_test_app().await;
    let now = Utc::now();
    let user_id = seed_user(&app.state, 104, ProfileRole::User, now + Duration::hours(1)).await;
    let token = session_token(&app.state, &user_id).await;

    let later = now + Duration::days(8);
    let ctx = app.state.sessions.resolve(&jar_with(&token), later).await;

    assert!(ctx.user.is_none());
    assert!(ctx.authenticated_profile().is_none());
}

#[tokio::test]
async fn test_user_without_connection_still_resolves() {
    let app = create_test_app().await;
    let now = Utc::now();
    let user = app
        .state
        .identity
        .admin_create_user("nobody@example.com", serde_json::json!({}), now)
        .await
        .unwrap();
    let link = app
        .state
        .identity
        .admin_generate_magic_link("nobody@example.com", now)
        .await
        .unwrap();
    let session = app
        .state
        .identity
        .verify_magic_link(&link.hashed_token, now)
        .await
        .unwrap();

    let ctx = app
        .state
        .sessions
        .resolve(&jar_with(&session.access_token), now)
        .await;

    assert_eq!(ctx.user.map(|u| u.id), Some(user.id));
    assert!(ctx.profile.is_none(), "No profile row was created");
    assert_eq!(app.strava.refreshes(), 0);
}
