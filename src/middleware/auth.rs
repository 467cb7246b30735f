// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session resolution middleware.

use crate::services::RequestContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Middleware that resolves the caller once and stores a [`RequestContext`]
/// in the request extensions.
///
/// Never rejects a request; handlers decide what an empty context means.
pub async fn load_request_context(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let context: RequestContext = state.sessions.resolve(&jar, chrono::Utc::now()).await;

    if let Some(user) = &context.user {
        tracing::Span::current().record("user_id", user.id.as_str());
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}
