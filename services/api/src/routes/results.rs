// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Raw result browsing and the test catalog.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use benchcom_storage::runs::{ResultQuery, ResultWithRun, TestCatalogEntry};

use crate::auth::{require_browsing, MaybeAuthUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ByTestQuery {
    pub test_name: Option<String>,
    pub test_category: Option<String>,
    pub limit: Option<i64>,
}

/// `GET /api/v1/results/by-test`
///
/// Raw results joined with run info, best value first (lower for
/// durations, higher for throughput).
pub async fn by_test(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(query): Query<ByTestQuery>,
) -> Result<Json<Vec<ResultWithRun>>, ApiError> {
    require_browsing(&state, &user)?;

    let rows = state
        .runs
        .results_by_test(&ResultQuery {
            test_name: query.test_name,
            test_category: query.test_category,
            limit: state.clamp_limit(query.limit),
        })
        .await?;
    Ok(Json(rows))
}

/// `GET /api/v1/tests`
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Vec<TestCatalogEntry>>, ApiError> {
    require_browsing(&state, &user)?;
    let entries = state.runs.test_catalog().await?;
    Ok(Json(entries))
}
