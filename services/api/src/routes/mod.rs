// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod benchmarks;
pub mod health;
pub mod results;
pub mod stats;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All routes under `/api/v1`.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/benchmarks", post(benchmarks::submit).get(benchmarks::list))
        .route(
            "/benchmarks/:id",
            get(benchmarks::detail).delete(benchmarks::delete),
        )
        .route("/results/by-test", get(results::by_test))
        .route("/tests", get(results::catalog))
        .route("/stats/refresh", post(stats::refresh))
        .route("/stats/by-test", get(stats::by_test))
        .route("/stats/available-cpus", get(stats::available_cpus))
        .route("/stats/available-systems", get(stats::available_systems))
}
