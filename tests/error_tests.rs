// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use washed_up_club::error::{action_failure, ActionError, AppError};

#[test]
fn test_is_strava_token_error_matches() {
    let err = AppError::StravaUnauthorized(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(err.is_strava_token_error());

    let err = AppError::StravaUnauthorized("Strava token refresh failed: Bad Request".to_string());
    assert!(err.is_strava_token_error());
}

#[test]
fn test_is_strava_token_error_no_match() {
    assert!(!AppError::StravaRateLimited.is_strava_token_error());

    let err = AppError::StravaApi("Internal Server Error".to_string());
    assert!(!err.is_strava_token_error());

    // Message text alone never classifies an error
    let err = AppError::StravaApi("JSON parse error: invalid type: string".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::StravaApi("HTTP 500: token service unavailable".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::BadRequest("Bad Request".to_string());
    assert!(!err.is_strava_token_error());
}

#[test]
fn test_app_error_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::StravaApi("x".into()), StatusCode::BAD_GATEWAY),
        (AppError::StravaRateLimited, StatusCode::TOO_MANY_REQUESTS),
        (AppError::StravaUnauthorized("x".into()), StatusCode::UNAUTHORIZED),
        (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
        assert_eq!(err.into_response().status(), status);
    }
}

#[test]
fn test_action_errors() {
    let err = ActionError::not_found("Memory not found.");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.clone().into_response().status(), StatusCode::NOT_FOUND);

    // Infrastructure details stay in the logs
    let err = action_failure(
        AppError::Database("disk I/O error".to_string()),
        "test",
        "Failed to save memory. Please try again.",
    );
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message, "Failed to save memory. Please try again.");
}
