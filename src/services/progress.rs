// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge progress sync from Strava activities.

use chrono::{DateTime, Utc};

use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::{
    compute_result, Challenge, ChallengeContribution, ChallengeParticipant, ChallengeType,
    ParticipantResult,
};
use crate::services::strava::{StravaActivitySummary, StravaService};

/// What a sync run changed.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Contributions newly recorded by this run
    pub recorded: usize,
    pub result: ParticipantResult,
}

/// Pull the participant's activities from the challenge window, record the
/// ones that count, and recompute their result.
///
/// Safe to repeat: activities already recorded are skipped by the database.
pub async fn sync_participant(
    db: &SqliteDb,
    strava: &StravaService,
    user_id: &str,
    challenge: &Challenge,
    participant: &ChallengeParticipant,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, AppError> {
    let access_token = strava.get_valid_access_token(user_id, now).await?;
    let before = challenge.end_date.min(now);
    let activities = strava
        .list_activities_between(&access_token, challenge.start_date, before)
        .await?;

    let mut recorded = 0;
    for activity in &activities {
        let value = match qualifying_value(strava, &access_token, challenge, activity).await? {
            Some(value) => value,
            None => continue,
        };

        let contribution = ChallengeContribution {
            id: uuid::Uuid::new_v4().to_string(),
            participant_id: participant.id.clone(),
            external_activity_id: activity.id,
            activity_name: activity.name.clone(),
            value,
            is_valid: true,
            occurred_at: activity.start_date,
            created_at: now,
        };
        if db.insert_contribution(&contribution).await? {
            recorded += 1;
        }
    }

    let contributions = db.list_contributions(&participant.id).await?;
    let result = compute_result(challenge, &contributions, now);
    db.update_participant_result(&participant.id, &result, now)
        .await?;

    tracing::info!(
        participant_id = %participant.id,
        challenge_id = %challenge.id,
        fetched = activities.len(),
        recorded,
        status = ?result.status,
        "Synced challenge progress"
    );

    Ok(SyncOutcome { recorded, result })
}

/// The value an activity contributes, or `None` if it does not count.
async fn qualifying_value(
    strava: &StravaService,
    access_token: &str,
    challenge: &Challenge,
    activity: &StravaActivitySummary,
) -> Result<Option<f64>, AppError> {
    match challenge.challenge_type {
        ChallengeType::Cumulative => Ok(Some(activity.distance)),
        ChallengeType::BestEffort => Ok(challenge
            .goal_value
            .filter(|goal| activity.distance >= *goal as f64)
            .map(|_| activity.elapsed_time as f64)),
        ChallengeType::SegmentRace => {
            let Some(segment_id) = challenge.segment_id else {
                return Ok(None);
            };
            let detail = match strava.get_activity(access_token, activity.id).await {
                Ok(detail) => detail,
                Err(e @ (AppError::StravaRateLimited | AppError::StravaUnauthorized(_))) => {
                    return Err(e)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        activity_id = activity.id,
                        "Skipping activity whose details could not be fetched"
                    );
                    return Ok(None);
                }
            };
            Ok(detail
                .best_effort_on(segment_id)
                .map(|effort| effort.elapsed_time as f64))
        }
    }
}
