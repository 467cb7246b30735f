// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking and dashboard statistics.
//!
//! Everything here is a pure projection over participants already loaded
//! (and ordered) by the database layer; nothing is persisted.

use serde::Serialize;

use crate::models::{
    ChallengeContribution, ChallengeParticipant, ParticipantStatus, ParticipantWithRelations,
    Profile,
};

/// One row of a challenge leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardRow {
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub participant: ChallengeParticipant,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub profile: Profile,
    /// First loaded contribution, if any
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub contribution: Option<ChallengeContribution>,
    /// Dense rank among finishers; `None` for anyone who has not completed
    pub rank: Option<u32>,
}

/// Build leaderboard rows from participants in display order.
///
/// Ranks are assigned 1, 2, 3, ... to `completed` participants in the order
/// they appear; the input order is trusted as-is.
pub fn build_leaderboard(participants: Vec<ParticipantWithRelations>) -> Vec<LeaderboardRow> {
    let mut next_rank = 1u32;

    participants
        .into_iter()
        .map(|p| {
            let rank = if p.participant.status == ParticipantStatus::Completed {
                let rank = next_rank;
                next_rank += 1;
                Some(rank)
            } else {
                None
            };

            LeaderboardRow {
                contribution: p.contributions.into_iter().next(),
                participant: p.participant,
                profile: p.profile,
                rank,
            }
        })
        .collect()
}

/// Total distance covered by finishers, in km with one decimal.
///
/// Every finisher is credited with the full goal distance, regardless of
/// what their activities actually covered. Returns `"0.0"` when there is no
/// goal.
pub fn total_distance_km<'a>(
    participants: impl IntoIterator<Item = &'a ChallengeParticipant>,
    goal_value_meters: Option<i64>,
) -> String {
    let goal = match goal_value_meters {
        Some(goal) if goal != 0 => goal as f64,
        _ => return "0.0".to_string(),
    };

    let total: f64 = participants
        .into_iter()
        .filter(|p| p.status == ParticipantStatus::Completed)
        .map(|_| goal / 1000.0)
        .sum();

    format!("{:.1}", total)
}

/// Summary numbers shown above each leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeStats {
    pub total_runners: usize,
    pub finishers: usize,
    pub active_runners: usize,
    pub total_distance_km: String,
}

impl ChallengeStats {
    pub fn from_rows(rows: &[LeaderboardRow], goal_value_meters: Option<i64>) -> Self {
        let count = |status| rows.iter().filter(|r| r.participant.status == status).count();

        Self {
            total_runners: rows.len(),
            finishers: count(ParticipantStatus::Completed),
            active_runners: count(ParticipantStatus::InProgress),
            total_distance_km: total_distance_km(
                rows.iter().map(|r| &r.participant),
                goal_value_meters,
            ),
        }
    }
}
