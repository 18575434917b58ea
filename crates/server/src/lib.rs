//! Tierra Querida ordering API library.
//!
//! This crate provides the server as a library so the router can be built
//! and exercised in tests without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::{services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Build the full application router.
///
/// API routes come first; anything else is served from the public directory
/// (the static site).
pub fn app(state: AppState) -> Router {
    let public = ServeDir::new(&state.config().public_dir).append_index_html_on_directories(true);

    Router::new()
        .merge(routes::routes())
        .fallback_service(public)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
