// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod media;
pub mod progress;
pub mod provisioning;
pub mod session;
pub mod strava;

pub use identity::{IdentityService, Session};
pub use media::MediaStore;
pub use provisioning::find_or_create_shadow_user;
pub use session::{RequestContext, SessionResolver};
pub use strava::{StravaClient, StravaService, TokenFreshness};
