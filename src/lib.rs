// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Washed Up Club: community running club backend
//!
//! This crate provides the API behind the club site: Strava login with
//! shadow accounts, an admin content panel, and challenge leaderboards.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SqliteDb;
use error::AppError;
use services::{IdentityService, MediaStore, SessionResolver, StravaClient, StravaService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub identity: IdentityService,
    pub strava: StravaService,
    pub sessions: SessionResolver,
    pub media: MediaStore,
}

impl AppState {
    /// Wire up services around an open database.
    pub fn new(config: Config, db: SqliteDb) -> Result<Self, AppError> {
        let identity = IdentityService::new(db.clone(), &config.session_secret)?;
        let strava = StravaService::new(StravaClient::new(&config), db.clone());
        let sessions = SessionResolver::new(db.clone(), identity.clone(), strava.clone());
        let media = MediaStore::new(&config.media_dir, &config.api_url);

        Ok(Self {
            config,
            db,
            identity,
            strava,
            sessions,
            media,
        })
    }
}
