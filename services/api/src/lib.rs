// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP API service for Benchcom.
//!
//! Serves benchmark submission, browsing, comparison and the
//! pre-aggregated stats views under `/api/v1`, plus `/health`.
//! Persistence goes through the repository traits in
//! `benchcom-storage`, so integration tests can run the full router
//! against in-memory fakes.

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod auth;
pub mod background;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use benchcom_core::settings::Settings;

use crate::state::AppState;

/// Build the complete application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
