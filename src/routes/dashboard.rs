// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenges dashboard: active challenges, leaderboards, and the
//! join/leave/sync actions.

use crate::error::{action_failure, ActionError, ActionResult, ActionSuccess, AppError, Result};
use crate::models::{
    build_leaderboard, Challenge, ChallengeParticipant, ChallengeStats, LeaderboardRow, Profile,
};
use crate::services::progress::sync_participant;
use crate::services::RequestContext;
use crate::time_utils::format_time_remaining;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/join", post(join_challenge))
        .route("/api/dashboard/leave", post(leave_challenge))
        .route("/api/dashboard/sync", post(sync_progress))
}

// ─── Page Data ───────────────────────────────────────────────

/// An active challenge as seen by the caller.
#[derive(Debug, Serialize)]
pub struct DashboardChallenge {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub is_participating: bool,
    pub participant: Option<ChallengeParticipant>,
    pub joinable: bool,
    /// Countdown to the end date, `HH:MM:SS`
    pub time_left: String,
    pub leaderboard: Vec<LeaderboardRow>,
    pub stats: ChallengeStats,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub profile: Profile,
    pub challenges: Vec<DashboardChallenge>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<DashboardResponse>> {
    let profile = ctx
        .authenticated_profile()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let now = Utc::now();
    let mut challenges = Vec::new();
    for challenge in state.db.list_active_challenges().await? {
        let participants = state.db.list_participants_with_relations(&challenge).await?;
        challenges.push(dashboard_challenge(challenge, participants, &profile.id, now));
    }

    Ok(Json(DashboardResponse {
        profile,
        challenges,
    }))
}

fn dashboard_challenge(
    challenge: Challenge,
    participants: Vec<crate::models::ParticipantWithRelations>,
    profile_id: &str,
    now: DateTime<Utc>,
) -> DashboardChallenge {
    let participant = participants
        .iter()
        .find(|p| p.participant.profile_id == profile_id)
        .map(|p| p.participant.clone());

    let leaderboard = build_leaderboard(participants);
    let stats = ChallengeStats::from_rows(&leaderboard, challenge.goal_value);

    DashboardChallenge {
        is_participating: participant.is_some(),
        participant,
        joinable: challenge.is_joinable(now),
        time_left: format_time_remaining(challenge.end_date, now),
        leaderboard,
        stats,
        challenge,
    }
}

// ─── Actions ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeActionForm {
    #[serde(default)]
    challenge_id: Option<String>,
}

/// Resolve the form's challenge, in the order: logged in, id present,
/// challenge exists.
async fn load_target(
    state: &AppState,
    ctx: &RequestContext,
    form: &ChallengeActionForm,
    unauthenticated: &str,
    context: &'static str,
    failed: &str,
) -> std::result::Result<(Profile, Challenge), ActionError> {
    let profile = ctx
        .authenticated_profile()
        .cloned()
        .ok_or_else(|| ActionError::unauthorized(unauthenticated))?;

    let challenge_id = form
        .challenge_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ActionError::bad_request("Challenge ID is required"))?;

    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await
        .map_err(|e| action_failure(e, context, failed))?
        .ok_or_else(|| ActionError::not_found("Challenge not found"))?;

    Ok((profile, challenge))
}

async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ChallengeActionForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to join challenge. Please try again.";
    let (profile, challenge) = load_target(
        &state,
        &ctx,
        &form,
        "You must be logged in to join a challenge",
        "join_challenge",
        FAILED,
    )
    .await?;

    if !challenge.is_joinable(Utc::now()) {
        return Err(ActionError::bad_request(
            "Challenge is not joinable. It may have ended or is not active.",
        ));
    }

    let existing = state
        .db
        .get_participant(&challenge.id, &profile.id)
        .await
        .map_err(|e| action_failure(e, "join_challenge", FAILED))?;
    if existing.is_some() {
        return Err(ActionError::bad_request(
            "You are already participating in this challenge",
        ));
    }

    let participant = state
        .db
        .insert_participant(&challenge.id, &profile.id, Utc::now())
        .await
        .map_err(|e| action_failure(e, "join_challenge", FAILED))?;

    tracing::info!(
        participant_id = %participant.id,
        challenge_id = %challenge.id,
        "Joined challenge"
    );
    Ok(ActionSuccess::ok())
}

async fn leave_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ChallengeActionForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to leave challenge. Please try again.";
    let (profile, challenge) = load_target(
        &state,
        &ctx,
        &form,
        "You must be logged in to leave a challenge",
        "leave_challenge",
        FAILED,
    )
    .await?;

    let Some(participant) = state
        .db
        .get_participant(&challenge.id, &profile.id)
        .await
        .map_err(|e| action_failure(e, "leave_challenge", FAILED))?
    else {
        return Err(ActionError::bad_request(
            "You are not participating in this challenge",
        ));
    };

    state
        .db
        .delete_participant(&participant.id)
        .await
        .map_err(|e| action_failure(e, "leave_challenge", FAILED))?;

    tracing::info!(
        participant_id = %participant.id,
        challenge_id = %challenge.id,
        "Left challenge"
    );
    Ok(ActionSuccess::ok())
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    /// Contributions recorded by this sync
    pub recorded: usize,
    pub participant_status: crate::models::ParticipantStatus,
    pub result_display: Option<String>,
}

/// Pull the caller's Strava activities into a challenge they have joined.
async fn sync_progress(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ChallengeActionForm>,
) -> std::result::Result<Json<SyncResponse>, ActionError> {
    const FAILED: &str = "Failed to sync progress. Please try again.";
    let (profile, challenge) = load_target(
        &state,
        &ctx,
        &form,
        "You must be logged in to sync progress",
        "sync_progress",
        FAILED,
    )
    .await?;

    let now = Utc::now();
    if now < challenge.start_date {
        return Err(ActionError::bad_request("Challenge has not started yet"));
    }

    let Some(participant) = state
        .db
        .get_participant(&challenge.id, &profile.id)
        .await
        .map_err(|e| action_failure(e, "sync_progress", FAILED))?
    else {
        return Err(ActionError::bad_request(
            "You are not participating in this challenge",
        ));
    };

    let outcome = sync_participant(
        &state.db,
        &state.strava,
        &profile.id,
        &challenge,
        &participant,
        now,
    )
    .await
    .map_err(sync_failure)?;

    Ok(Json(SyncResponse {
        success: true,
        recorded: outcome.recorded,
        participant_status: outcome.result.status,
        result_display: outcome.result.result_display,
    }))
}

fn sync_failure(err: AppError) -> ActionError {
    match &err {
        AppError::NotFound(_) => {
            tracing::warn!(error = %err, "Sync without a Strava connection");
            ActionError::bad_request("No Strava connection found. Please log in again.")
        }
        AppError::StravaRateLimited => {
            tracing::warn!("Strava rate limit hit during sync");
            ActionError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Strava is busy right now. Please try again later.",
            )
        }
        _ if err.is_strava_token_error() => {
            tracing::warn!(error = %err, "Strava rejected stored credentials during sync");
            ActionError::unauthorized("Your Strava authorization has expired. Please log in again.")
        }
        _ => action_failure(err, "sync_progress", "Failed to sync progress. Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChallengeStatus, ChallengeType, ParticipantStatus, ParticipantWithRelations, ProfileRole,
    };
    use chrono::{Duration, TimeZone};

    fn challenge(now: DateTime<Utc>) -> Challenge {
        Challenge {
            id: "c1".to_string(),
            title: "March Miles".to_string(),
            description: String::new(),
            challenge_type: ChallengeType::Cumulative,
            goal_value: Some(50_000),
            segment_id: None,
            start_date: now - Duration::days(1),
            end_date: now + Duration::hours(2) + Duration::minutes(3) + Duration::seconds(4),
            status: ChallengeStatus::Active,
            is_active: true,
            created_at: now - Duration::days(2),
            updated_at: now - Duration::days(2),
        }
    }

    fn participant(profile_id: &str, status: ParticipantStatus) -> ParticipantWithRelations {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        ParticipantWithRelations {
            participant: ChallengeParticipant {
                id: format!("p-{}", profile_id),
                challenge_id: "c1".to_string(),
                profile_id: profile_id.to_string(),
                status,
                result_value: None,
                result_display: None,
                highlight_activity_id: None,
                created_at: ts,
                updated_at: ts,
            },
            profile: Profile {
                id: profile_id.to_string(),
                firstname: "Test".to_string(),
                lastname: "Runner".to_string(),
                username: profile_id.to_string(),
                strava_athlete_id: None,
                role: ProfileRole::User,
                updated_at: ts,
            },
            contributions: Vec::new(),
        }
    }

    #[test]
    fn test_dashboard_challenge_projection() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        let view = dashboard_challenge(
            challenge(now),
            vec![
                participant("alice", ParticipantStatus::Completed),
                participant("me", ParticipantStatus::InProgress),
            ],
            "me",
            now,
        );

        assert!(view.is_participating);
        assert_eq!(view.participant.unwrap().profile_id, "me");
        assert!(view.joinable);
        assert_eq!(view.time_left, "02:03:04");
        assert_eq!(view.leaderboard[0].rank, Some(1));
        assert_eq!(view.leaderboard[1].rank, None);
        assert_eq!(view.stats.total_runners, 2);
        assert_eq!(view.stats.finishers, 1);
        assert_eq!(view.stats.active_runners, 1);
        assert_eq!(view.stats.total_distance_km, "50.0");
    }

    #[test]
    fn test_dashboard_challenge_not_participating() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        let mut ended = challenge(now);
        ended.end_date = now - Duration::minutes(1);

        let view = dashboard_challenge(ended, Vec::new(), "me", now);
        assert!(!view.is_participating);
        assert!(view.participant.is_none());
        assert!(!view.joinable);
        assert_eq!(view.time_left, "00:00:00");
        assert_eq!(view.stats.total_distance_km, "0.0");
    }

    #[test]
    fn test_sync_failure_mapping() {
        let rate = sync_failure(AppError::StravaRateLimited);
        assert_eq!(rate.status, StatusCode::TOO_MANY_REQUESTS);

        let token = sync_failure(AppError::StravaUnauthorized(
            AppError::STRAVA_TOKEN_ERROR.to_string(),
        ));
        assert_eq!(token.status, StatusCode::UNAUTHORIZED);

        // Decode failures are not credential problems
        let decode = sync_failure(AppError::StravaApi(
            "JSON parse error: invalid type: null, expected i64".to_string(),
        ));
        assert_eq!(decode.status, StatusCode::INTERNAL_SERVER_ERROR);

        let missing = sync_failure(AppError::NotFound("connection".to_string()));
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);

        let db = sync_failure(AppError::Database("locked".to_string()));
        assert_eq!(db.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(db.message, "Failed to sync progress. Please try again.");
    }
}
