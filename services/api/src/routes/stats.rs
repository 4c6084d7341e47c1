// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pre-aggregated statistics endpoints.
//!
//! `by_test` reshapes stat rows around one grouping dimension. A stat
//! row whose label dimension is null (e.g. no recognizable system type)
//! is omitted from that view rather than shown as an empty label; the
//! same row still appears under the other dimensions.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use benchcom_storage::stats::{CpuEntry, StatRow, SystemEntry};

use crate::auth::{require_browsing, MaybeAuthUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub test_name: Option<String>,
}

/// `POST /api/v1/stats/refresh`
///
/// Synchronous recompute, optionally scoped to one test name. Mostly
/// for operators and tests; normal freshness comes from the background
/// refresh tasks.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.stats.recompute(query.test_name.as_deref()).await?;
    Ok(Json(json!({
        "status": "ok",
        "groups_written": outcome.groups_written,
        "groups_deleted": outcome.groups_deleted,
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatsByTestQuery {
    pub test_name: String,
    pub group_by: Option<String>,
    pub limit: Option<i64>,
}

/// One stat group reshaped around the requested dimension.
#[derive(Debug, Serialize)]
pub struct StatEntry {
    /// The grouping label: CPU model, system type or architecture.
    pub label: String,
    pub architecture: String,
    pub test_name: String,
    pub test_category: Option<String>,
    pub unit: Option<String>,
    pub median_value: f64,
    pub mean_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub std_dev: Option<f64>,
    pub sample_count: i64,
    pub last_updated: DateTime<Utc>,
}

impl StatEntry {
    fn from_row(row: StatRow, label: String) -> Self {
        Self {
            label,
            architecture: row.architecture,
            test_name: row.test_name,
            test_category: row.test_category,
            unit: row.unit,
            median_value: row.median_value,
            mean_value: row.mean_value,
            min_value: row.min_value,
            max_value: row.max_value,
            std_dev: row.std_dev,
            sample_count: row.sample_count,
            last_updated: row.last_updated,
        }
    }
}

/// `GET /api/v1/stats/by-test?test_name=...&group_by=cpu|system|architecture`
pub async fn by_test(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(query): Query<StatsByTestQuery>,
) -> Result<Json<Vec<StatEntry>>, ApiError> {
    require_browsing(&state, &user)?;

    let group_by = query.group_by.as_deref().unwrap_or("cpu");
    if !matches!(group_by, "cpu" | "system" | "architecture") {
        return Err(ApiError::bad_request(
            "group_by must be one of: cpu, system, architecture",
        ));
    }

    let limit = state.clamp_limit(query.limit);
    let rows = state.stats.by_test(&query.test_name, limit).await?;

    let entries = rows
        .into_iter()
        .filter_map(|row| {
            let label = match group_by {
                "cpu" => row.cpu_model.clone(),
                "system" => row.system_type.clone(),
                _ => Some(row.architecture.clone()),
            }?;
            Some(StatEntry::from_row(row, label))
        })
        .collect();

    Ok(Json(entries))
}

/// `GET /api/v1/stats/available-cpus`
pub async fn available_cpus(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Vec<CpuEntry>>, ApiError> {
    require_browsing(&state, &user)?;
    let cpus = state.stats.available_cpus().await?;
    Ok(Json(cpus))
}

/// `GET /api/v1/stats/available-systems`
pub async fn available_systems(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Vec<SystemEntry>>, ApiError> {
    require_browsing(&state, &user)?;
    let systems = state.stats.available_systems().await?;
    Ok(Json(systems))
}
