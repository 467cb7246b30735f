// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shadow account provisioning for Strava athletes.
//!
//! Every Strava athlete maps to exactly one local account, created the first
//! time the athlete logs in. The account's email is synthesized; nobody ever
//! receives mail there.

use chrono::{DateTime, Utc};

use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::{Profile, ProfileRole, TokenConnection};
use crate::services::identity::IdentityService;
use crate::services::strava::{StravaTokenResponse, STRAVA_SCOPE};

/// Synthetic email for an athlete's shadow account.
pub fn shadow_email(athlete_id: i64) -> String {
    format!("{}@strava.washed-up.club", athlete_id)
}

/// Find the account linked to this athlete, or create one.
///
/// Repeat logins store the new tokens and refresh the profile's names.
/// First logins create the auth user, profile, and Strava connection, in
/// that order; an account left behind by an interrupted first login is
/// reused. Returns the auth user id.
pub async fn find_or_create_shadow_user(
    db: &SqliteDb,
    identity: &IdentityService,
    tokens: &StravaTokenResponse,
    admin_athlete_ids: &[i64],
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let athlete = &tokens.athlete;
    let username = athlete.username.clone().unwrap_or_default();

    if let Some(existing) = db.get_connection_by_athlete(athlete.id).await? {
        db.update_connection_for_athlete(athlete.id, &tokens.token_set(), STRAVA_SCOPE, now)
            .await?;
        db.update_profile_names(
            &existing.user_id,
            &athlete.firstname,
            &athlete.lastname,
            &username,
            now,
        )
        .await?;

        tracing::info!(
            user_id = %existing.user_id,
            athlete_id = athlete.id,
            "Returning athlete, tokens updated"
        );
        return Ok(existing.user_id);
    }

    // A first login that failed after creating the account leaves it without
    // a connection; pick it up again instead of failing on the email.
    let email = shadow_email(athlete.id);
    let user = match identity.admin_get_user_by_email(&email).await? {
        Some(user) => {
            tracing::warn!(
                user_id = %user.id,
                athlete_id = athlete.id,
                "Reusing shadow account without a Strava connection"
            );
            user
        }
        None => {
            let metadata = serde_json::json!({
                "strava_athlete_id": athlete.id,
                "firstname": athlete.firstname,
                "lastname": athlete.lastname,
                "username": athlete.username,
            });
            identity
                .admin_create_user(&email, metadata, now)
                .await
                .map_err(|e| AppError::Identity(format!("Failed to create shadow user: {}", e)))?
        }
    };

    let role = if admin_athlete_ids.contains(&athlete.id) {
        ProfileRole::Admin
    } else {
        ProfileRole::User
    };
    let profile_result = match db.get_profile(&user.id).await? {
        Some(_) => {
            db.update_profile_names(
                &user.id,
                &athlete.firstname,
                &athlete.lastname,
                &username,
                now,
            )
            .await
        }
        None => {
            db.insert_profile(&Profile {
                id: user.id.clone(),
                firstname: athlete.firstname.clone(),
                lastname: athlete.lastname.clone(),
                username,
                strava_athlete_id: Some(athlete.id),
                role,
                updated_at: now,
            })
            .await
        }
    };
    if let Err(e) = profile_result {
        // The connection insert below fails if this left no profile behind.
        tracing::warn!(error = %e, user_id = %user.id, "Profile creation failed, continuing");
    }

    let token_set = tokens.token_set();
    db.insert_connection(&TokenConnection {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        strava_athlete_id: athlete.id,
        access_token: token_set.access_token,
        refresh_token: token_set.refresh_token,
        expires_at: token_set.expires_at,
        scope: STRAVA_SCOPE.to_string(),
        created_at: now,
        updated_at: now,
    })
    .await?;

    tracing::info!(
        user_id = %user.id,
        athlete_id = athlete.id,
        role = ?role,
        "Created shadow account"
    );
    Ok(user.id)
}
