// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod challenge;
pub mod content;
pub mod leaderboard;
pub mod progress;
pub mod user;

pub use challenge::{
    Challenge, ChallengeContribution, ChallengeParticipant, ChallengeStatus, ChallengeSummary,
    ChallengeType, ParticipantStatus, ParticipantWithRelations,
};
pub use content::{Memory, RoutineSchedule};
pub use leaderboard::{build_leaderboard, total_distance_km, ChallengeStats, LeaderboardRow};
pub use progress::{compute_result, ParticipantResult};
pub use user::{AuthUser, Profile, ProfileRole, TokenConnection, TokenSet};
