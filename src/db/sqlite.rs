// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Identity (auth users and one-time login tokens)
//! - Profiles and Strava connections
//! - Site content (memories, routine schedules)
//! - Challenges, participants, and contributions
//!
//! Every mutation is a single statement; nothing here opens a transaction.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::db::{schema, tables};
use crate::error::AppError;
use crate::models::{
    AuthUser, Challenge, ChallengeContribution, ChallengeParticipant, ChallengeStatus,
    ChallengeSummary, ChallengeType, Memory, ParticipantResult, ParticipantStatus,
    ParticipantWithRelations, Profile, RoutineSchedule, TokenConnection, TokenSet,
};

/// Editable challenge fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub goal_value: Option<i64>,
    pub segment_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ChallengeStatus,
    pub is_active: bool,
}

/// Editable routine schedule fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub day: String,
    pub time: String,
    pub location: String,
    pub accent_color: String,
    pub description: String,
}

/// SQLite database client.
#[derive(Clone)]
pub struct SqliteDb {
    pool: Pool<Sqlite>,
}

impl SqliteDb {
    /// Open a connection pool with foreign keys enforced.
    ///
    /// In-memory databases live only as long as their connection, so they
    /// get a single connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .foreign_keys(true)
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(in_memory, "Connected to SQLite");

        Ok(Self { pool })
    }

    /// Create all tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), AppError> {
        for statement in schema::statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        tracing::debug!("Schema is up to date");
        Ok(())
    }

    // ─── Identity Operations ─────────────────────────────────────

    pub async fn insert_auth_user(&self, user: &AuthUser) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, email, email_confirmed_at, user_metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            tables::AUTH_USERS
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.email_confirmed_at)
        .bind(&user.user_metadata)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_auth_user(&self, id: &str) -> Result<Option<AuthUser>, AppError> {
        Ok(sqlx::query_as::<_, AuthUser>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            tables::AUTH_USERS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn get_auth_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AppError> {
        Ok(sqlx::query_as::<_, AuthUser>(&format!(
            "SELECT * FROM {} WHERE email = ?",
            tables::AUTH_USERS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Mark an account's email as confirmed (first magic-link login).
    pub async fn confirm_auth_user_email(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE {} SET email_confirmed_at = COALESCE(email_confirmed_at, ?), updated_at = ?
            WHERE id = ?
            "#,
            tables::AUTH_USERS
        ))
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_one_time_token(
        &self,
        token_hash: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
            tables::ONE_TIME_TOKENS
        ))
        .bind(token_hash)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a one-time token and return its owner and expiry.
    ///
    /// The delete and the read are one statement, so a token can only ever
    /// be consumed once.
    pub async fn take_one_time_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<(String, DateTime<Utc>)>, AppError> {
        Ok(sqlx::query_as::<_, (String, DateTime<Utc>)>(&format!(
            "DELETE FROM {} WHERE token_hash = ? RETURNING user_id, expires_at",
            tables::ONE_TIME_TOKENS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        Ok(sqlx::query_as::<_, Profile>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            tables::PROFILES
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, firstname, lastname, username, strava_athlete_id, role, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            tables::PROFILES
        ))
        .bind(&profile.id)
        .bind(&profile.firstname)
        .bind(&profile.lastname)
        .bind(&profile.username)
        .bind(profile.strava_athlete_id)
        .bind(profile.role)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Refresh a profile's display fields from the latest Strava athlete data.
    pub async fn update_profile_names(
        &self,
        id: &str,
        firstname: &str,
        lastname: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE {} SET firstname = ?, lastname = ?, username = ?, updated_at = ?
            WHERE id = ?
            "#,
            tables::PROFILES
        ))
        .bind(firstname)
        .bind(lastname)
        .bind(username)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Strava Connection Operations ────────────────────────────

    pub async fn get_connection_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TokenConnection>, AppError> {
        Ok(sqlx::query_as::<_, TokenConnection>(&format!(
            "SELECT * FROM {} WHERE user_id = ?",
            tables::CONNECTIONS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn get_connection_by_athlete(
        &self,
        athlete_id: i64,
    ) -> Result<Option<TokenConnection>, AppError> {
        Ok(sqlx::query_as::<_, TokenConnection>(&format!(
            "SELECT * FROM {} WHERE strava_athlete_id = ?",
            tables::CONNECTIONS
        ))
        .bind(athlete_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert_connection(&self, conn: &TokenConnection) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, user_id, strava_athlete_id, access_token, refresh_token,
                            expires_at, scope, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            tables::CONNECTIONS
        ))
        .bind(&conn.id)
        .bind(&conn.user_id)
        .bind(conn.strava_athlete_id)
        .bind(&conn.access_token)
        .bind(&conn.refresh_token)
        .bind(conn.expires_at)
        .bind(&conn.scope)
        .bind(conn.created_at)
        .bind(conn.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store new tokens (and scope) after a repeat login.
    pub async fn update_connection_for_athlete(
        &self,
        athlete_id: i64,
        tokens: &TokenSet,
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE {} SET access_token = ?, refresh_token = ?, expires_at = ?, scope = ?,
                          updated_at = ?
            WHERE strava_athlete_id = ?
            "#,
            tables::CONNECTIONS
        ))
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .bind(scope)
        .bind(now)
        .bind(athlete_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store refreshed tokens for a user's connection.
    pub async fn update_connection_tokens(
        &self,
        user_id: &str,
        tokens: &TokenSet,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE {} SET access_token = ?, refresh_token = ?, expires_at = ?, updated_at = ?
            WHERE user_id = ?
            "#,
            tables::CONNECTIONS
        ))
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Memory Operations ───────────────────────────────────────

    pub async fn list_memories(&self, active_only: bool) -> Result<Vec<Memory>, AppError> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        Ok(sqlx::query_as::<_, Memory>(&format!(
            "SELECT * FROM {} {} ORDER BY sort_order ASC, created_at ASC",
            tables::MEMORIES,
            filter
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_memory(&self, id: &str) -> Result<Option<Memory>, AppError> {
        Ok(sqlx::query_as::<_, Memory>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            tables::MEMORIES
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Sort order that places a new memory after all existing ones.
    pub async fn next_memory_sort_order(&self) -> Result<i64, AppError> {
        next_sort_order(&self.pool, tables::MEMORIES).await
    }

    pub async fn insert_memory(&self, memory: &Memory) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, src, caption, sort_order, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            tables::MEMORIES
        ))
        .bind(&memory.id)
        .bind(&memory.src)
        .bind(&memory.caption)
        .bind(memory.sort_order)
        .bind(memory.is_active)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update a memory's caption, position, and visibility. Returns false if
    /// no such memory exists.
    pub async fn update_memory(
        &self,
        id: &str,
        caption: &str,
        sort_order: i64,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET caption = ?, sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
            tables::MEMORIES
        ))
        .bind(caption)
        .bind(sort_order)
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_memory(&self, id: &str) -> Result<bool, AppError> {
        delete_by_id(&self.pool, tables::MEMORIES, id).await
    }

    /// Set each memory's sort order to its position in `ids`.
    pub async fn reorder_memories(&self, ids: &[String], now: DateTime<Utc>) -> Result<(), AppError> {
        let statement = format!(
            "UPDATE {} SET sort_order = ?, updated_at = ? WHERE id = ?",
            tables::MEMORIES
        );
        for (index, id) in ids.iter().enumerate() {
            sqlx::query(&statement)
                .bind(index as i64)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    // ─── Routine Schedule Operations ─────────────────────────────

    pub async fn list_schedules(&self, active_only: bool) -> Result<Vec<RoutineSchedule>, AppError> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        Ok(sqlx::query_as::<_, RoutineSchedule>(&format!(
            "SELECT * FROM {} {} ORDER BY sort_order ASC, created_at ASC",
            tables::SCHEDULES,
            filter
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_schedule(&self, id: &str) -> Result<Option<RoutineSchedule>, AppError> {
        Ok(sqlx::query_as::<_, RoutineSchedule>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            tables::SCHEDULES
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert_schedule(
        &self,
        id: &str,
        schedule: &NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<RoutineSchedule, AppError> {
        let sort_order = next_sort_order(&self.pool, tables::SCHEDULES).await?;
        Ok(sqlx::query_as::<_, RoutineSchedule>(&format!(
            r#"
            INSERT INTO {} (id, day, time, location, accent_color, description, sort_order,
                            is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
            tables::SCHEDULES
        ))
        .bind(id)
        .bind(&schedule.day)
        .bind(&schedule.time)
        .bind(&schedule.location)
        .bind(&schedule.accent_color)
        .bind(&schedule.description)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn update_schedule(
        &self,
        id: &str,
        schedule: &NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET day = ?, time = ?, location = ?, accent_color = ?, description = ?,
                          updated_at = ?
            WHERE id = ?
            "#,
            tables::SCHEDULES
        ))
        .bind(&schedule.day)
        .bind(&schedule.time)
        .bind(&schedule.location)
        .bind(&schedule.accent_color)
        .bind(&schedule.description)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<bool, AppError> {
        delete_by_id(&self.pool, tables::SCHEDULES, id).await
    }

    /// Show or hide a schedule. Returns false if no such schedule exists.
    pub async fn set_schedule_active(
        &self,
        id: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_active = ?, updated_at = ? WHERE id = ?",
            tables::SCHEDULES
        ))
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Challenge Operations ────────────────────────────────────

    pub async fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, AppError> {
        Ok(sqlx::query_as::<_, Challenge>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            tables::CHALLENGES
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// All challenges by start date, with participant counts.
    pub async fn list_challenge_summaries(&self) -> Result<Vec<ChallengeSummary>, AppError> {
        Ok(sqlx::query_as::<_, ChallengeSummary>(&format!(
            r#"
            SELECT c.*, COUNT(p.id) AS participant_count
            FROM {} c
            LEFT JOIN {} p ON p.challenge_id = c.id
            GROUP BY c.id
            ORDER BY c.start_date ASC
            "#,
            tables::CHALLENGES,
            tables::PARTICIPANTS
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Challenges flagged active, whatever their lifecycle status.
    pub async fn list_active_challenges(&self) -> Result<Vec<Challenge>, AppError> {
        Ok(sqlx::query_as::<_, Challenge>(&format!(
            "SELECT * FROM {} WHERE is_active = 1 ORDER BY start_date ASC",
            tables::CHALLENGES
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn insert_challenge(
        &self,
        id: &str,
        challenge: &NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, AppError> {
        Ok(sqlx::query_as::<_, Challenge>(&format!(
            r#"
            INSERT INTO {} (id, title, description, type, goal_value, segment_id, start_date,
                            end_date, status, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
            tables::CHALLENGES
        ))
        .bind(id)
        .bind(&challenge.title)
        .bind(&challenge.description)
        .bind(challenge.challenge_type)
        .bind(challenge.goal_value)
        .bind(challenge.segment_id)
        .bind(challenge.start_date)
        .bind(challenge.end_date)
        .bind(challenge.status)
        .bind(challenge.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn update_challenge(
        &self,
        id: &str,
        challenge: &NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET title = ?, description = ?, type = ?, goal_value = ?, segment_id = ?,
                          start_date = ?, end_date = ?, status = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
            tables::CHALLENGES
        ))
        .bind(&challenge.title)
        .bind(&challenge.description)
        .bind(challenge.challenge_type)
        .bind(challenge.goal_value)
        .bind(challenge.segment_id)
        .bind(challenge.start_date)
        .bind(challenge.end_date)
        .bind(challenge.status)
        .bind(challenge.is_active)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a challenge along with its participants and contributions.
    pub async fn delete_challenge(&self, id: &str) -> Result<bool, AppError> {
        delete_by_id(&self.pool, tables::CHALLENGES, id).await
    }

    // ─── Participant Operations ──────────────────────────────────

    pub async fn get_participant(
        &self,
        challenge_id: &str,
        profile_id: &str,
    ) -> Result<Option<ChallengeParticipant>, AppError> {
        Ok(sqlx::query_as::<_, ChallengeParticipant>(&format!(
            "SELECT * FROM {} WHERE challenge_id = ? AND profile_id = ?",
            tables::PARTICIPANTS
        ))
        .bind(challenge_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert_participant(
        &self,
        challenge_id: &str,
        profile_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ChallengeParticipant, AppError> {
        Ok(sqlx::query_as::<_, ChallengeParticipant>(&format!(
            r#"
            INSERT INTO {} (id, challenge_id, profile_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
            tables::PARTICIPANTS
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(challenge_id)
        .bind(profile_id)
        .bind(ParticipantStatus::Registered)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn delete_participant(&self, id: &str) -> Result<bool, AppError> {
        delete_by_id(&self.pool, tables::PARTICIPANTS, id).await
    }

    /// Write back a recomputed result.
    pub async fn update_participant_result(
        &self,
        id: &str,
        result: &ParticipantResult,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE {} SET status = ?, result_value = ?, result_display = ?,
                          highlight_activity_id = ?, updated_at = ?
            WHERE id = ?
            "#,
            tables::PARTICIPANTS
        ))
        .bind(result.status)
        .bind(result.result_value)
        .bind(&result.result_display)
        .bind(result.highlight_activity_id)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Participants of a challenge in leaderboard order, with relations.
    ///
    /// Order: completed, in progress, registered, did not finish; then by
    /// result (fastest first for timed challenges, furthest first for
    /// cumulative ones, missing results last); then by join time.
    pub async fn list_participants_with_relations(
        &self,
        challenge: &Challenge,
    ) -> Result<Vec<ParticipantWithRelations>, AppError> {
        let direction = if challenge.challenge_type.higher_is_better() {
            "DESC"
        } else {
            "ASC"
        };

        let participants = sqlx::query_as::<_, ChallengeParticipant>(&format!(
            r#"
            SELECT * FROM {}
            WHERE challenge_id = ?
            ORDER BY
                CASE status
                    WHEN 'completed' THEN 0
                    WHEN 'in_progress' THEN 1
                    WHEN 'registered' THEN 2
                    ELSE 3
                END,
                result_value IS NULL,
                result_value {},
                created_at ASC
            "#,
            tables::PARTICIPANTS,
            direction
        ))
        .bind(&challenge.id)
        .fetch_all(&self.pool)
        .await?;

        if participants.is_empty() {
            return Ok(vec![]);
        }

        let profiles = sqlx::query_as::<_, Profile>(&format!(
            r#"
            SELECT pr.* FROM {} pr
            JOIN {} p ON p.profile_id = pr.id
            WHERE p.challenge_id = ?
            "#,
            tables::PROFILES,
            tables::PARTICIPANTS
        ))
        .bind(&challenge.id)
        .fetch_all(&self.pool)
        .await?;
        let mut profiles: HashMap<String, Profile> =
            profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        let contributions = sqlx::query_as::<_, ChallengeContribution>(&format!(
            r#"
            SELECT c.* FROM {} c
            JOIN {} p ON c.participant_id = p.id
            WHERE p.challenge_id = ?
            ORDER BY c.occurred_at ASC, c.created_at ASC
            "#,
            tables::CONTRIBUTIONS,
            tables::PARTICIPANTS
        ))
        .bind(&challenge.id)
        .fetch_all(&self.pool)
        .await?;
        let mut by_participant: HashMap<String, Vec<ChallengeContribution>> = HashMap::new();
        for c in contributions {
            by_participant
                .entry(c.participant_id.clone())
                .or_default()
                .push(c);
        }

        let mut out = Vec::with_capacity(participants.len());
        for participant in participants {
            let Some(profile) = profiles.remove(&participant.profile_id) else {
                // Foreign keys make this unreachable.
                tracing::warn!(
                    participant_id = %participant.id,
                    "Participant without profile"
                );
                continue;
            };
            out.push(ParticipantWithRelations {
                contributions: by_participant.remove(&participant.id).unwrap_or_default(),
                participant,
                profile,
            });
        }
        Ok(out)
    }

    // ─── Contribution Operations ─────────────────────────────────

    pub async fn list_contributions(
        &self,
        participant_id: &str,
    ) -> Result<Vec<ChallengeContribution>, AppError> {
        Ok(sqlx::query_as::<_, ChallengeContribution>(&format!(
            "SELECT * FROM {} WHERE participant_id = ? ORDER BY occurred_at ASC, created_at ASC",
            tables::CONTRIBUTIONS
        ))
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Record a contribution. Returns false if this activity was already
    /// recorded for the participant; the existing row is left untouched.
    pub async fn insert_contribution(
        &self,
        contribution: &ChallengeContribution,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, participant_id, external_activity_id, activity_name, value,
                            is_valid, occurred_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (participant_id, external_activity_id) DO NOTHING
            "#,
            tables::CONTRIBUTIONS
        ))
        .bind(&contribution.id)
        .bind(&contribution.participant_id)
        .bind(contribution.external_activity_id)
        .bind(&contribution.activity_name)
        .bind(contribution.value)
        .bind(contribution.is_valid)
        .bind(contribution.occurred_at)
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn next_sort_order(pool: &Pool<Sqlite>, table: &str) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM {}",
        table
    ))
    .fetch_one(pool)
    .await?)
}

async fn delete_by_id(pool: &Pool<Sqlite>, table: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
