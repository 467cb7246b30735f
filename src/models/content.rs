// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site content managed from the admin panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A photo shown in the home page gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Memory {
    pub id: String,
    /// Public URL of the uploaded image
    pub src: String,
    pub caption: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recurring group run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoutineSchedule {
    pub id: String,
    pub day: String,
    pub time: String,
    pub location: String,
    pub accent_color: String,
    pub description: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
