// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Everything is read once
//! at startup and shared read-only through `AppState`.

use std::env;

/// Default Strava OAuth endpoint base.
pub const STRAVA_OAUTH_BASE: &str = "https://www.strava.com/oauth";
/// Default Strava REST API base.
pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Callback URL registered with Strava
    pub strava_redirect_uri: String,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Public URL of this API (used to build media URLs)
    pub api_url: String,
    /// SQLite connection string
    pub database_url: String,
    /// Directory where uploaded memory images are stored
    pub media_dir: String,
    /// Strava athletes that get the admin role when their account is created
    pub admin_athlete_ids: Vec<i64>,
    /// Server port
    pub port: u16,
    /// Strava OAuth base URL (overridden in tests)
    pub strava_oauth_base: String,
    /// Strava API base URL (overridden in tests)
    pub strava_api_base: String,

    // --- Secrets ---
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Root secret for session JWTs and magic-link hashes (raw bytes)
    pub session_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?
            .into_bytes();
        if session_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "SESSION_SECRET",
                "must be at least 32 bytes".to_string(),
            ));
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_redirect_uri: env::var("STRAVA_REDIRECT_URI")
                .map_err(|_| ConfigError::Missing("STRAVA_REDIRECT_URI"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| format!("http://localhost:{}", port)),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://washed-up-club.db?mode=rwc".to_string()),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
            admin_athlete_ids: parse_athlete_ids(
                &env::var("ADMIN_STRAVA_ATHLETE_IDS").unwrap_or_default(),
            )?,
            port,
            strava_oauth_base: env::var("STRAVA_OAUTH_BASE")
                .unwrap_or_else(|_| STRAVA_OAUTH_BASE.to_string()),
            strava_api_base: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| STRAVA_API_BASE.to_string()),

            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            session_secret,
        })
    }

    /// Config for tests. Strava endpoints point nowhere until a test overrides them.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_redirect_uri: "http://localhost:8080/auth/strava/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            database_url: "sqlite::memory:".to_string(),
            media_dir: std::env::temp_dir()
                .join("washed-up-club-test-media")
                .to_string_lossy()
                .into_owned(),
            admin_athlete_ids: vec![],
            port: 8080,
            strava_oauth_base: "http://127.0.0.1:9/oauth".to_string(),
            strava_api_base: "http://127.0.0.1:9/api/v3".to_string(),
            strava_client_secret: "test_secret".to_string(),
            session_secret: b"test_session_secret_32_bytes_min!!".to_vec(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Parse a comma-separated list of Strava athlete IDs.
fn parse_athlete_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                ConfigError::Invalid("ADMIN_STRAVA_ATHLETE_IDS", format!("'{}' is not an id", s))
            })
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
