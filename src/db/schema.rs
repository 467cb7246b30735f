// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table definitions, applied idempotently at startup.

use super::tables;

/// `CREATE TABLE IF NOT EXISTS` statements in dependency order.
pub(super) fn statements() -> Vec<String> {
    vec![
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                email TEXT UNIQUE,
                email_confirmed_at TIMESTAMP,
                user_metadata TEXT NOT NULL DEFAULT '{{}}',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            tables::AUTH_USERS
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                token_hash TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                created_at TIMESTAMP NOT NULL,
                expires_at TIMESTAMP NOT NULL
            )
            "#,
            tables::ONE_TIME_TOKENS,
            tables::AUTH_USERS
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                firstname TEXT NOT NULL DEFAULT '',
                lastname TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL DEFAULT '',
                strava_athlete_id INTEGER UNIQUE,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            tables::PROFILES,
            tables::AUTH_USERS
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL UNIQUE REFERENCES {}(id) ON DELETE CASCADE,
                strava_athlete_id INTEGER NOT NULL UNIQUE,
                access_token TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                scope TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            tables::CONNECTIONS,
            tables::PROFILES
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL
                    CHECK (type IN ('best_effort', 'segment_race', 'cumulative')),
                goal_value INTEGER,
                segment_id INTEGER,
                start_date TIMESTAMP NOT NULL,
                end_date TIMESTAMP NOT NULL,
                status TEXT NOT NULL DEFAULT 'upcoming'
                    CHECK (status IN ('upcoming', 'active', 'completed')),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                CHECK (end_date > start_date)
            )
            "#,
            tables::CHALLENGES
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                challenge_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                profile_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'registered'
                    CHECK (status IN ('registered', 'in_progress', 'completed', 'did_not_finish')),
                result_value REAL,
                result_display TEXT,
                highlight_activity_id INTEGER,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                UNIQUE (challenge_id, profile_id)
            )
            "#,
            tables::PARTICIPANTS,
            tables::CHALLENGES,
            tables::PROFILES
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                participant_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                external_activity_id INTEGER NOT NULL,
                activity_name TEXT NOT NULL DEFAULT '',
                value REAL NOT NULL,
                is_valid INTEGER NOT NULL DEFAULT 1,
                occurred_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL,
                UNIQUE (participant_id, external_activity_id)
            )
            "#,
            tables::CONTRIBUTIONS,
            tables::PARTICIPANTS
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                src TEXT NOT NULL,
                caption TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            tables::MEMORIES
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY NOT NULL,
                day TEXT NOT NULL,
                time TEXT NOT NULL,
                location TEXT NOT NULL,
                accent_color TEXT NOT NULL,
                description TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
            tables::SCHEDULES
        ),
    ]
}
