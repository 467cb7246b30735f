// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Washed Up Club API Server
//!
//! Strava login, the admin content panel, and challenge leaderboards for
//! the club site.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use washed_up_club::{config::Config, db::SqliteDb, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Washed Up Club API");

    // Open the database and create tables
    let db = SqliteDb::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("Database ready");

    tokio::fs::create_dir_all(&config.media_dir).await?;
    tracing::info!(path = %config.media_dir, "Media directory ready");

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, db)?);

    // Build router
    let app = washed_up_club::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("washed_up_club=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
