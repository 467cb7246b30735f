// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity, profile, and Strava connection models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Identity record owned by the identity provider.
#[derive(Debug, Clone, FromRow)]
pub struct AuthUser {
    pub id: String,
    /// Login email (synthesized for shadow accounts)
    pub email: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    /// Free-form metadata supplied when the account was created
    pub user_metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProfileRole {
    Admin,
    User,
}

/// Internal user profile, keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    /// Linked Strava athlete (unique when present)
    pub strava_athlete_id: Option<i64>,
    pub role: ProfileRole,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }
}

/// A profile's Strava OAuth credentials.
///
/// One row per profile and one per athlete; tokens are rewritten on every
/// refresh.
#[derive(Debug, Clone, FromRow)]
pub struct TokenConnection {
    pub id: String,
    pub user_id: String,
    pub strava_athlete_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// Granted OAuth scopes (comma-separated, as Strava reports them)
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fresh token material from a code exchange or refresh.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}
