// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participant result computation from recorded contributions.

use chrono::{DateTime, Utc};

use crate::models::{Challenge, ChallengeContribution, ChallengeType, ParticipantStatus};
use crate::time_utils::format_hms;

/// Cached result written back to a participant row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantResult {
    pub status: ParticipantStatus,
    pub result_value: Option<f64>,
    pub result_display: Option<String>,
    pub highlight_activity_id: Option<i64>,
}

/// Recompute a participant's standing from its contributions.
///
/// Invalidated contributions are ignored. Time-based challenges keep the
/// fastest effort; cumulative challenges sum distance and complete once the
/// goal is reached. Anyone short of completion when the challenge ends is
/// marked `did_not_finish`.
pub fn compute_result(
    challenge: &Challenge,
    contributions: &[ChallengeContribution],
    now: DateTime<Utc>,
) -> ParticipantResult {
    let valid: Vec<&ChallengeContribution> = contributions.iter().filter(|c| c.is_valid).collect();

    let unfinished = |status: ParticipantStatus| {
        if challenge.has_ended(now) {
            ParticipantStatus::DidNotFinish
        } else {
            status
        }
    };

    let no_result = || ParticipantResult {
        status: unfinished(ParticipantStatus::Registered),
        result_value: None,
        result_display: None,
        highlight_activity_id: None,
    };

    match challenge.challenge_type {
        ChallengeType::BestEffort | ChallengeType::SegmentRace => {
            let Some(best) = valid.iter().min_by(|a, b| a.value.total_cmp(&b.value)) else {
                return no_result();
            };
            ParticipantResult {
                status: ParticipantStatus::Completed,
                result_value: Some(best.value),
                result_display: Some(format_hms(best.value.round() as i64)),
                highlight_activity_id: Some(best.external_activity_id),
            }
        }
        ChallengeType::Cumulative => {
            let Some(longest) = valid.iter().max_by(|a, b| a.value.total_cmp(&b.value)) else {
                return no_result();
            };
            let total: f64 = valid.iter().map(|c| c.value).sum();
            let reached = challenge
                .goal_value
                .is_some_and(|goal| goal > 0 && total >= goal as f64);

            ParticipantResult {
                status: if reached {
                    ParticipantStatus::Completed
                } else {
                    unfinished(ParticipantStatus::InProgress)
                },
                result_value: Some(total),
                result_display: Some(format!("{:.1} km", total / 1000.0)),
                highlight_activity_id: Some(longest.external_activity_id),
            }
        }
    }
}
