// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge, participant, and contribution models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Profile;

/// How a challenge measures progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ChallengeType {
    /// Fastest single activity covering the goal distance
    BestEffort,
    /// Fastest effort on a Strava segment
    SegmentRace,
    /// Total distance accumulated over the challenge window
    Cumulative,
}

impl ChallengeType {
    pub const ALL: [ChallengeType; 3] = [
        ChallengeType::BestEffort,
        ChallengeType::SegmentRace,
        ChallengeType::Cumulative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeType::BestEffort => "best_effort",
            ChallengeType::SegmentRace => "segment_race",
            ChallengeType::Cumulative => "cumulative",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    /// Whether a larger result value ranks better.
    pub fn higher_is_better(self) -> bool {
        matches!(self, ChallengeType::Cumulative)
    }

    /// Whether the challenge needs a positive goal value.
    pub fn requires_goal(self) -> bool {
        matches!(self, ChallengeType::BestEffort | ChallengeType::Cumulative)
    }
}

/// Challenge lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Completed,
}

impl ChallengeStatus {
    pub const ALL: [ChallengeStatus; 3] = [
        ChallengeStatus::Upcoming,
        ChallengeStatus::Active,
        ChallengeStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeStatus::Upcoming => "upcoming",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

/// A participant's standing in a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    InProgress,
    Completed,
    DidNotFinish,
}

/// A time-boxed fitness goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub challenge_type: ChallengeType,
    /// Meters for distance goals
    pub goal_value: Option<i64>,
    /// Strava segment for segment races
    pub segment_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ChallengeStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Whether a profile may join at `now`.
    pub fn is_joinable(&self, now: DateTime<Utc>) -> bool {
        self.status == ChallengeStatus::Active
            && self.is_active
            && now < self.end_date
            && now >= self.start_date
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}

/// Challenge with its participant count, for the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ChallengeSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub challenge: Challenge,
    pub participant_count: i64,
}

/// Join row between a profile and a challenge, with the cached result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChallengeParticipant {
    pub id: String,
    pub challenge_id: String,
    pub profile_id: String,
    pub status: ParticipantStatus,
    pub result_value: Option<f64>,
    pub result_display: Option<String>,
    /// Strava activity behind the current result
    pub highlight_activity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One Strava activity counted toward a participant's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChallengeContribution {
    pub id: String,
    pub participant_id: String,
    pub external_activity_id: i64,
    pub activity_name: String,
    /// Meters or seconds, depending on the challenge type
    pub value: f64,
    /// Cleared to soft-disqualify the activity
    pub is_valid: bool,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Participant with its profile and contributions loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantWithRelations {
    #[serde(flatten)]
    pub participant: ChallengeParticipant,
    pub profile: Profile,
    pub contributions: Vec<ChallengeContribution>,
}
