// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local identity provider: accounts, magic links, and session tokens.
//!
//! Sessions are HS256 JWTs carried in a cookie. Magic links are single-use
//! random tokens stored only as an HMAC, and are the one way to mint a
//! session for an account.

use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::types::Json;

use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::AuthUser;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "wuc_session";

/// How long a magic link stays valid.
pub const MAGIC_LINK_TTL_SECS: i64 = 10 * 60;

/// How long a session lasts.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const JWT_KEY_INFO: &[u8] = b"washed-up-club session jwt v1";
const LINK_KEY_INFO: &[u8] = b"washed-up-club magic link v1";

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Auth user id
    pub sub: String,
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// A session as read from (or written to) the session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    /// The signed JWT
    pub access_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of generating a magic link.
#[derive(Debug, Clone)]
pub struct MagicLink {
    /// Plain token, for delivery to the user
    pub token: String,
    /// Hash that redeems the link via [`IdentityService::verify_magic_link`]
    pub hashed_token: String,
}

/// Identity provider backed by the application database.
#[derive(Clone)]
pub struct IdentityService {
    db: SqliteDb,
    jwt_key: Vec<u8>,
    link_key: Vec<u8>,
    rng: SystemRandom,
}

impl IdentityService {
    /// Derive the JWT and link-hash keys from the session secret.
    pub fn new(db: SqliteDb, session_secret: &[u8]) -> Result<Self, AppError> {
        let hk = Hkdf::<Sha256>::new(None, session_secret);
        let mut jwt_key = vec![0u8; 32];
        let mut link_key = vec![0u8; 32];
        hk.expand(JWT_KEY_INFO, &mut jwt_key)
            .and_then(|_| hk.expand(LINK_KEY_INFO, &mut link_key))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HKDF expand failed: {}", e)))?;

        Ok(Self {
            db,
            jwt_key,
            link_key,
            rng: SystemRandom::new(),
        })
    }

    // ─── Admin Operations ────────────────────────────────────────

    /// Create a confirmed account.
    pub async fn admin_create_user(
        &self,
        email: &str,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<AuthUser, AppError> {
        if self.db.get_auth_user_by_email(email).await?.is_some() {
            return Err(AppError::Identity(
                "A user with this email address has already been registered".to_string(),
            ));
        }

        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            email_confirmed_at: Some(now),
            user_metadata: Json(metadata),
            created_at: now,
            updated_at: now,
        };
        self.db
            .insert_auth_user(&user)
            .await
            .map_err(|e| AppError::Identity(format!("Failed to create user: {}", e)))?;

        tracing::info!(user_id = %user.id, "Created auth user");
        Ok(user)
    }

    pub async fn admin_get_user_by_id(&self, id: &str) -> Result<Option<AuthUser>, AppError> {
        self.db.get_auth_user(id).await
    }

    pub async fn admin_get_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AppError> {
        self.db.get_auth_user_by_email(email).await
    }

    /// Issue a single-use login link for an existing account.
    pub async fn admin_generate_magic_link(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<MagicLink, AppError> {
        let user = self
            .db
            .get_auth_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::Identity("User not found".to_string()))?;

        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Identity("Failed to generate link token".to_string()))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let hashed_token = self.hash_link_token(&token)?;

        self.db
            .insert_one_time_token(
                &hashed_token,
                &user.id,
                now,
                now + Duration::seconds(MAGIC_LINK_TTL_SECS),
            )
            .await?;

        Ok(MagicLink {
            token,
            hashed_token,
        })
    }

    /// Redeem a magic link, returning a new session.
    pub async fn verify_magic_link(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let (user_id, expires_at) = self
            .db
            .take_one_time_token(token_hash)
            .await?
            .ok_or_else(|| AppError::Identity("Magic link is invalid or already used".to_string()))?;

        if expires_at <= now {
            return Err(AppError::Identity("Magic link has expired".to_string()));
        }

        let user = self
            .db
            .get_auth_user(&user_id)
            .await?
            .ok_or_else(|| AppError::Identity("User not found".to_string()))?;
        self.db.confirm_auth_user_email(&user.id, now).await?;

        self.create_session(&user, now)
    }

    fn create_session(&self, user: &AuthUser, now: DateTime<Utc>) -> Result<Session, AppError> {
        let expires_at = now + Duration::seconds(SESSION_TTL_SECS);
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_key),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

        Ok(Session {
            access_token,
            user_id: user.id.clone(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    fn hash_link_token(&self, token: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.link_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Read the session from the cookie jar without verifying it.
    ///
    /// The result is only a claim; [`IdentityService::get_user`] must accept
    /// it before it identifies anyone.
    pub fn get_session(&self, jar: &CookieJar) -> Option<Session> {
        let token = jar.get(SESSION_COOKIE)?.value().to_string();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<SessionClaims>(&token, &DecodingKey::from_secret(&[]), &validation).ok()?;

        Some(Session {
            access_token: token,
            user_id: data.claims.sub,
            expires_at: DateTime::from_timestamp(data.claims.exp, 0)?,
        })
    }

    /// Verify a session's signature and expiry, and load its user.
    pub async fn get_user(&self, session: &Session, now: DateTime<Utc>) -> Result<AuthUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<SessionClaims>(
            &session.access_token,
            &DecodingKey::from_secret(&self.jwt_key),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        if data.claims.exp <= now.timestamp() {
            return Err(AppError::InvalidToken);
        }

        self.db
            .get_auth_user(&data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }
}
