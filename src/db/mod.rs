// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite via sqlx).

mod schema;
pub mod sqlite;

pub use sqlite::{NewChallenge, NewSchedule, SqliteDb};

/// Table names as constants.
pub mod tables {
    pub const AUTH_USERS: &str = "auth_users";
    pub const ONE_TIME_TOKENS: &str = "auth_one_time_tokens";
    pub const PROFILES: &str = "profile";
    pub const CONNECTIONS: &str = "strava_connections";
    pub const CHALLENGES: &str = "challenges";
    pub const PARTICIPANTS: &str = "challenge_participants";
    pub const CONTRIBUTIONS: &str = "challenge_contributions";
    pub const MEMORIES: &str = "memories";
    pub const SCHEDULES: &str = "routine_schedules";
}
