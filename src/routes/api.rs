// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only API routes for the layout and home page.

use crate::error::Result;
use crate::models::{Memory, Profile, RoutineSchedule};
use crate::routes::auth::AuthErrorCode;
use crate::services::RequestContext;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/home", get(get_home))
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionInfo {
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserInfo {
    pub id: String,
    pub email: Option<String>,
}

/// Layout data: who is logged in.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub session: Option<SessionInfo>,
    pub user: Option<UserInfo>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub profile: Option<Profile>,
}

/// Current session, user, and profile. Empty fields when logged out.
async fn get_session(Extension(ctx): Extension<RequestContext>) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: ctx.session.map(|s| SessionInfo {
            expires_at: format_utc_rfc3339(s.expires_at),
        }),
        user: ctx.user.map(|u| UserInfo {
            id: u.id,
            email: u.email,
        }),
        profile: ctx.profile,
    })
}

// ─── Home ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthErrorInfo {
    pub code: String,
    pub message: String,
}

/// Public home page data.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HomeResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown[]"))]
    pub memories: Vec<Memory>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown[]"))]
    pub routine_schedules: Vec<RoutineSchedule>,
    pub has_session: bool,
    pub auth_error: Option<AuthErrorInfo>,
}

/// Active memories and schedules, plus the message for a failed login.
async fn get_home(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HomeParams>,
) -> Result<Json<HomeResponse>> {
    let memories = state.db.list_memories(true).await?;
    let routine_schedules = state.db.list_schedules(true).await?;

    let auth_error = params
        .error
        .as_deref()
        .and_then(AuthErrorCode::parse)
        .map(|code| AuthErrorInfo {
            code: code.code().to_string(),
            message: code.message().to_string(),
        });

    Ok(Json(HomeResponse {
        memories,
        routine_schedules,
        has_session: ctx.user.is_some(),
        auth_error,
    }))
}
