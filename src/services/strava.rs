// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and token lifecycle.
//!
//! Handles:
//! - OAuth authorization URL, code exchange, and token refresh
//! - Activity listing and detail fetches (with segment efforts)
//! - Lazy refresh of stored tokens shortly before they expire
//! - Rate limit detection

use crate::config::Config;
use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::TokenSet;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// OAuth scopes requested at login.
pub const STRAVA_SCOPE: &str = "activity:read_all,profile:read_all";

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Page size for activity listing.
const ACTIVITIES_PER_PAGE: u32 = 100;
/// Upper bound on pages fetched for one sync.
const MAX_ACTIVITY_PAGES: u32 = 10;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    oauth_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl StravaClient {
    /// Create a new Strava client from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            oauth_base: config.strava_oauth_base.trim_end_matches('/').to_string(),
            api_base: config.strava_api_base.trim_end_matches('/').to_string(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
            redirect_uri: config.strava_redirect_uri.clone(),
        }
    }

    /// Authorization URL the browser is sent to at login.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.oauth_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(STRAVA_SCOPE),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for tokens and athlete info.
    pub async fn exchange_code(&self, code: &str) -> Result<StravaTokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange request failed: {}", e)))?;

        check_oauth_response(response, "Strava token exchange failed").await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        check_oauth_response(response, "Strava token refresh failed").await
    }

    /// List the athlete's activities in a time window (one page).
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        before: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// Get a detailed activity, including all segment efforts.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: i64,
    ) -> Result<StravaActivity, AppError> {
        let url = format!("{}/activities/{}", self.api_base, activity_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("include_all_efforts", "true")])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check an API response and parse its JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(AppError::StravaRateLimited);
        }

        if status.as_u16() == 401 {
            tracing::debug!(body = %body, "Strava API returned 401");
            return Err(AppError::StravaUnauthorized(
                AppError::STRAVA_TOKEN_ERROR.to_string(),
            ));
        }

        return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
}

/// Check an OAuth token endpoint response.
///
/// Failures carry Strava's own error message, prefixed with `context`.
async fn check_oauth_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        if status.as_u16() == 429 {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(AppError::StravaRateLimited);
        }

        let message = response
            .json::<StravaErrorResponse>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        tracing::error!(status = %status, message = %message, "{}", context);
        let message = format!("{}: {}", context, message);
        if status.is_client_error() {
            return Err(AppError::StravaUnauthorized(message));
        }
        return Err(AppError::StravaApi(message));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("Failed to parse token response: {}", e)))
}

/// Error body returned by the OAuth endpoints.
#[derive(Debug, Deserialize)]
struct StravaErrorResponse {
    message: Option<String>,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct StravaTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub expires_at: i64,
    pub athlete: StravaAthlete,
}

impl StravaTokenResponse {
    pub fn token_set(&self) -> TokenSet {
        TokenSet {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: timestamp_to_utc(self.expires_at),
        }
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl TokenRefreshResponse {
    pub fn token_set(&self) -> TokenSet {
        TokenSet {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: timestamp_to_utc(self.expires_at),
        }
    }
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

/// Summary activity for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sport_type: String,
    pub start_date: DateTime<Utc>,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub elapsed_time: i64,
}

/// Detailed Strava activity response.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivity {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub distance: f64,
    pub elapsed_time: i64,
    #[serde(default)]
    pub segment_efforts: Vec<StravaSegmentEffort>,
}

impl StravaActivity {
    /// Fastest effort on the given segment within this activity.
    pub fn best_effort_on(&self, segment_id: i64) -> Option<&StravaSegmentEffort> {
        self.segment_efforts
            .iter()
            .filter(|e| e.segment.id == segment_id)
            .min_by_key(|e| e.elapsed_time)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StravaSegmentEffort {
    pub id: i64,
    pub elapsed_time: i64,
    pub segment: StravaSegmentRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StravaSegmentRef {
    pub id: i64,
}

fn timestamp_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Whether a token expiring at `expires_at` should be refreshed at `now`.
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a token freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFreshness {
    /// The user has never connected Strava
    NoConnection,
    /// The stored token is good for more than the refresh margin
    StillValid,
    /// The token was refreshed and the new one stored
    Refreshed,
}

/// High-level Strava service that manages token lifecycle and API calls.
///
/// There is no cache and no locking: the connection row is the only copy of
/// the tokens, and concurrent refreshes simply overwrite each other.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    db: SqliteDb,
}

impl StravaService {
    pub fn new(client: StravaClient, db: SqliteDb) -> Self {
        Self { client, db }
    }

    pub fn client(&self) -> &StravaClient {
        &self.client
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Refresh the user's Strava token if it expires within the margin.
    pub async fn ensure_fresh_token(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenFreshness, AppError> {
        let Some(connection) = self.db.get_connection_by_user(user_id).await? else {
            return Ok(TokenFreshness::NoConnection);
        };

        if !needs_refresh(connection.expires_at, now) {
            return Ok(TokenFreshness::StillValid);
        }

        tracing::info!(
            user_id,
            athlete_id = connection.strava_athlete_id,
            "Strava token expiring, refreshing"
        );
        self.refresh_and_store(user_id, &connection.refresh_token, now)
            .await?;
        Ok(TokenFreshness::Refreshed)
    }

    /// Get a usable access token for the user, refreshing it if needed.
    pub async fn get_valid_access_token(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let connection = self
            .db
            .get_connection_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Strava connection for user {}", user_id)))?;

        if !needs_refresh(connection.expires_at, now) {
            return Ok(connection.access_token);
        }

        let tokens = self
            .refresh_and_store(user_id, &connection.refresh_token, now)
            .await?;
        Ok(tokens.access_token)
    }

    async fn refresh_and_store(
        &self,
        user_id: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, AppError> {
        let tokens = self.client.refresh_token(refresh_token).await?.token_set();
        self.db
            .update_connection_tokens(user_id, &tokens, now)
            .await?;
        tracing::info!(user_id, expires_at = %tokens.expires_at, "Strava token refreshed");
        Ok(tokens)
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// All of the athlete's activities that started inside `[after, before]`.
    pub async fn list_activities_between(
        &self,
        access_token: &str,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let mut activities = Vec::new();
        for page in 1..=MAX_ACTIVITY_PAGES {
            let batch = self
                .client
                .list_activities(
                    access_token,
                    after.timestamp(),
                    before.timestamp(),
                    page,
                    ACTIVITIES_PER_PAGE,
                )
                .await?;
            let done = batch.len() < ACTIVITIES_PER_PAGE as usize;
            activities.extend(batch);
            if done {
                break;
            }
        }
        Ok(activities)
    }

    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: i64,
    ) -> Result<StravaActivity, AppError> {
        self.client.get_activity(access_token, activity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_needs_refresh_threshold() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert!(needs_refresh(now - Duration::minutes(1), now));
        assert!(needs_refresh(now + Duration::minutes(4), now));
        assert!(needs_refresh(now + Duration::minutes(5), now));
        assert!(!needs_refresh(now + Duration::minutes(5) + Duration::seconds(1), now));
        assert!(!needs_refresh(now + Duration::minutes(10), now));
    }

    #[test]
    fn test_authorize_url_params() {
        let client = StravaClient::new(&Config::test_default());
        let url = client.authorize_url("abc-123");
        assert!(url.starts_with("http://127.0.0.1:9/oauth/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=activity%3Aread_all%2Cprofile%3Aread_all"));
        assert!(url.contains("state=abc-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fstrava%2Fcallback"
        ));
    }

    #[test]
    fn test_token_response_parsing() {
        let json = r#"{
            "token_type": "Bearer",
            "access_token": "a",
            "refresh_token": "r",
            "expires_at": 1772366400,
            "expires_in": 21600,
            "athlete": {"id": 42, "username": null, "firstname": "Ada", "lastname": "L"}
        }"#;
        let parsed: StravaTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.athlete.id, 42);
        assert_eq!(parsed.athlete.username, None);
        assert_eq!(
            parsed.token_set().expires_at,
            Utc.timestamp_opt(1_772_366_400, 0).unwrap()
        );
    }

    #[test]
    fn test_best_segment_effort() {
        let json = r#"{
            "id": 9, "name": "Hill repeats", "start_date": "2026-03-02T07:00:00Z",
            "distance": 8000.0, "elapsed_time": 3000,
            "segment_efforts": [
                {"id": 1, "elapsed_time": 410, "segment": {"id": 77}},
                {"id": 2, "elapsed_time": 395, "segment": {"id": 77}},
                {"id": 3, "elapsed_time": 120, "segment": {"id": 78}}
            ]
        }"#;
        let activity: StravaActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.best_effort_on(77).map(|e| e.id), Some(2));
        assert!(activity.best_effort_on(99).is_none());
    }

    fn oauth_response(status: u16, body: &'static str) -> reqwest::Response {
        axum::http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_oauth_rejection_carries_provider_message() {
        let err = check_oauth_response::<TokenRefreshResponse>(
            oauth_response(400, r#"{"message":"Bad Request","errors":[]}"#),
            "Strava token refresh failed",
        )
        .await
        .unwrap_err();
        assert!(err.is_strava_token_error());
        assert_eq!(err.to_string(), "Strava token refresh failed: Bad Request");
    }

    #[tokio::test]
    async fn test_oauth_rejection_without_message() {
        let err = check_oauth_response::<TokenRefreshResponse>(
            oauth_response(400, ""),
            "Strava token refresh failed",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Strava token refresh failed: Unknown error");

        let err = check_oauth_response::<TokenRefreshResponse>(
            oauth_response(503, r#"{"errors":[]}"#),
            "Strava token refresh failed",
        )
        .await
        .unwrap_err();
        assert!(!err.is_strava_token_error());
        assert!(matches!(
            err,
            AppError::StravaApi(ref msg) if msg == "Strava token refresh failed: Unknown error"
        ));
    }

    #[tokio::test]
    async fn test_oauth_rate_limit() {
        let err = check_oauth_response::<TokenRefreshResponse>(
            oauth_response(429, "{}"),
            "Strava token refresh failed",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::StravaRateLimited));
    }

    #[tokio::test]
    async fn test_api_decode_error_is_not_a_credential_error() {
        let err = check_response_json::<StravaActivity>(oauth_response(200, r#"{"id":"x"}"#))
            .await
            .unwrap_err();
        assert!(!err.is_strava_token_error());

        let err = check_response_json::<StravaActivity>(oauth_response(401, "{}"))
            .await
            .unwrap_err();
        assert!(err.is_strava_token_error());
    }
}
