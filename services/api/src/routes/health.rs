// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub allow_anonymous_submissions: bool,
    pub allow_anonymous_browsing: bool,
}

/// Liveness check, also advertising the anonymity switches so clients
/// can decide whether to prompt for credentials.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        allow_anonymous_submissions: state.settings.auth.allow_anonymous_submissions,
        allow_anonymous_browsing: state.settings.auth.allow_anonymous_browsing,
    })
}
