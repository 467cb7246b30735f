// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security and caching headers middleware.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Path prefix of uploaded media, which the frontend embeds cross-origin.
const MEDIA_PREFIX: &str = "/media/";

/// Add security headers to all responses.
///
/// API responses are never cached. Media files may be cached indefinitely
/// (their names are unique per upload) and may be loaded from other origins.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let is_media = req.uri().path().starts_with(MEDIA_PREFIX);
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    if is_media {
        headers.insert(
            "Cross-Origin-Resource-Policy",
            HeaderValue::from_static("cross-origin"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        );
    } else {
        headers.insert(
            "Cross-Origin-Resource-Policy",
            HeaderValue::from_static("same-site"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}
