// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::services::identity::{Session, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::provisioning::find_or_create_shadow_user;
use crate::AppState;

/// Cookie holding the CSRF state between login and callback.
pub const STATE_COOKIE: &str = "strava_oauth_state";
const STATE_COOKIE_MAX_AGE_SECS: i64 = 5 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/strava/login", get(login))
        .route("/auth/strava/callback", get(callback))
        .route("/auth/logout", post(logout))
}

// ─── Error Codes ─────────────────────────────────────────────

/// Reasons a login can fail, as reported to the frontend in `?error=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    OauthDenied,
    InvalidState,
    MissingCode,
    UserNotFound,
    SessionFailed,
    TokenExtractionFailed,
    SessionSetFailed,
    Unknown,
}

impl AuthErrorCode {
    pub const ALL: [AuthErrorCode; 8] = [
        AuthErrorCode::OauthDenied,
        AuthErrorCode::InvalidState,
        AuthErrorCode::MissingCode,
        AuthErrorCode::UserNotFound,
        AuthErrorCode::SessionFailed,
        AuthErrorCode::TokenExtractionFailed,
        AuthErrorCode::SessionSetFailed,
        AuthErrorCode::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AuthErrorCode::OauthDenied => "oauth_denied",
            AuthErrorCode::InvalidState => "invalid_state",
            AuthErrorCode::MissingCode => "missing_code",
            AuthErrorCode::UserNotFound => "user_not_found",
            AuthErrorCode::SessionFailed => "session_failed",
            AuthErrorCode::TokenExtractionFailed => "token_extraction_failed",
            AuthErrorCode::SessionSetFailed => "session_set_failed",
            AuthErrorCode::Unknown => "unknown",
        }
    }

    /// User-facing message.
    pub fn message(self) -> &'static str {
        match self {
            AuthErrorCode::OauthDenied => "Authorization was denied. Please try again.",
            AuthErrorCode::InvalidState => "Security validation failed. Please try again.",
            AuthErrorCode::MissingCode => "Authorization code missing. Please try again.",
            AuthErrorCode::UserNotFound => "User account could not be found. Please try again.",
            AuthErrorCode::SessionFailed => "Failed to create session. Please try again.",
            AuthErrorCode::TokenExtractionFailed => {
                "Failed to process authentication. Please try again."
            }
            AuthErrorCode::SessionSetFailed => "Failed to set session. Please try again.",
            AuthErrorCode::Unknown => "An unknown error occurred. Please try again.",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == raw)
    }
}

// ─── Helpers ─────────────────────────────────────────────────

/// 302 redirect (the status browsers and the frontend expect here).
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn frontend_redirect(state: &AppState, error: Option<AuthErrorCode>) -> Response {
    let base = state.config.frontend_url.trim_end_matches('/');
    match error {
        Some(code) => found(&format!("{}/?error={}", base, code.code())),
        None => found(&format!("{}/", base)),
    }
}

fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Constant-time comparison of the state cookie and the returned state.
fn state_matches(stored: &str, returned: &str) -> bool {
    stored.as_bytes().ct_eq(returned.as_bytes()).into()
}

// ─── Handlers ────────────────────────────────────────────────

/// Start OAuth flow - set the CSRF state cookie and redirect to Strava.
async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Response) {
    let oauth_state = uuid::Uuid::new_v4().to_string();

    let cookie = Cookie::build((STATE_COOKIE, oauth_state.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE_SECS))
        .build();

    tracing::info!(
        client_id = %state.config.strava_client_id,
        "Starting OAuth flow, redirecting to Strava"
    );

    let url = state.strava.client().authorize_url(&oauth_state);
    (jar.add(cookie), found(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - provision the account and start a session.
///
/// Always redirects to the frontend, with `?error=<code>` on failure.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Response) {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return (jar, frontend_redirect(&state, Some(AuthErrorCode::OauthDenied)));
    }

    let stored = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let valid_state = match (stored.as_deref(), params.state.as_deref()) {
        (Some(stored), Some(returned)) => state_matches(stored, returned),
        _ => false,
    };
    if !valid_state {
        tracing::warn!("OAuth state mismatch");
        return (jar, frontend_redirect(&state, Some(AuthErrorCode::InvalidState)));
    }

    let jar = jar.remove(removal(STATE_COOKIE));

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (jar, frontend_redirect(&state, Some(AuthErrorCode::MissingCode)));
    };

    match complete_login(&state, &code, Utc::now()).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user_id, "Login complete");
            let cookie = session_cookie(&session, state.config.secure_cookies());
            (jar.add(cookie), frontend_redirect(&state, None))
        }
        Err(code) => (jar, frontend_redirect(&state, Some(code))),
    }
}

/// Exchange the code, provision the account, and mint a session.
async fn complete_login(
    state: &AppState,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Session, AuthErrorCode> {
    let tokens = state.strava.client().exchange_code(code).await.map_err(|e| {
        tracing::error!(error = %e, "OAuth callback error: token exchange failed");
        AuthErrorCode::Unknown
    })?;

    let user_id = find_or_create_shadow_user(
        &state.db,
        &state.identity,
        &tokens,
        &state.config.admin_athlete_ids,
        now,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, athlete_id = tokens.athlete.id, "OAuth callback error: provisioning failed");
        AuthErrorCode::Unknown
    })?;

    let user = match state.identity.admin_get_user_by_id(&user_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "Error fetching user");
            None
        }
    };
    let Some(email) = user.and_then(|u| u.email) else {
        tracing::error!(user_id = %user_id, "User email not found");
        return Err(AuthErrorCode::UserNotFound);
    };

    let link = state
        .identity
        .admin_generate_magic_link(&email, now)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to generate magic link");
            AuthErrorCode::SessionFailed
        })?;

    state
        .identity
        .verify_magic_link(&link.hashed_token, now)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to verify magic link token");
            AuthErrorCode::SessionFailed
        })
}

/// Logout - clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(removal(SESSION_COOKIE)), StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip() {
        for code in AuthErrorCode::ALL {
            assert_eq!(AuthErrorCode::parse(code.code()), Some(code));
            assert!(code.message().ends_with("Please try again."));
        }
        assert_eq!(AuthErrorCode::parse("bogus"), None);
    }

    #[test]
    fn test_state_matches() {
        assert!(state_matches("abc", "abc"));
        assert!(!state_matches("abc", "abd"));
        assert!(!state_matches("abc", "abcd"));
        assert!(!state_matches("", "x"));
    }
}
