// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request session resolution.

use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};

use crate::db::SqliteDb;
use crate::models::{AuthUser, Profile};
use crate::services::identity::{IdentityService, Session};
use crate::services::strava::{StravaService, TokenFreshness};

/// Who is making the request, resolved once per request.
///
/// `user` is only set when the session verified; `profile` may still be
/// missing for a verified user if it could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
}

impl RequestContext {
    /// Profile of a fully authenticated caller.
    pub fn authenticated_profile(&self) -> Option<&Profile> {
        match (&self.session, &self.user) {
            (Some(_), Some(_)) => self.profile.as_ref(),
            _ => None,
        }
    }

    /// Profile of an authenticated admin.
    pub fn admin_profile(&self) -> Option<&Profile> {
        self.authenticated_profile().filter(|p| p.is_admin())
    }
}

/// Resolves the session cookie into a [`RequestContext`].
#[derive(Clone)]
pub struct SessionResolver {
    db: SqliteDb,
    identity: IdentityService,
    strava: StravaService,
}

impl SessionResolver {
    pub fn new(db: SqliteDb, identity: IdentityService, strava: StravaService) -> Self {
        Self {
            db,
            identity,
            strava,
        }
    }

    /// Resolve the caller, refreshing their Strava token on the way if it is
    /// close to expiry.
    ///
    /// Never fails: anything that goes wrong past session verification is
    /// logged and leaves the corresponding field empty.
    pub async fn resolve(&self, jar: &CookieJar, now: DateTime<Utc>) -> RequestContext {
        let Some(session) = self.identity.get_session(jar) else {
            return RequestContext::default();
        };

        let user = match self.identity.get_user(&session, now).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Session rejected");
                return RequestContext::default();
            }
        };

        let profile = match self.db.get_profile(&user.id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Failed to load profile");
                None
            }
        };

        match self.strava.ensure_fresh_token(&user.id, now).await {
            Ok(TokenFreshness::Refreshed) => {
                tracing::debug!(user_id = %user.id, "Refreshed Strava token during session check")
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Failed to refresh Strava token");
            }
        }

        RequestContext {
            session: Some(session),
            user: Some(user),
            profile,
        }
    }
}
