// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark run submission, browsing and deletion.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use benchcom_core::model::{parse_timestamp, RunSubmission};
use benchcom_storage::runs::{NewResult, NewRun, RunDetail, RunFilter, RunSummary};

use crate::auth::{require_browsing, AuthUser, MaybeAuthUser};
use crate::background::spawn_scoped_refresh;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/v1/benchmarks`
///
/// Creates the run and all results in one transaction, then kicks off
/// a background stats refresh scoped to the submitted test names.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(submission): Json<RunSubmission>,
) -> Result<Json<Value>, ApiError> {
    if user.is_none() && !state.settings.auth.allow_anonymous_submissions {
        return Err(ApiError::unauthorized("Authentication required"));
    }

    let submitter_ip = client_ip(&headers, connect_info.as_ref());
    let user_id = user.as_ref().map(|u| u.id);
    let test_names = submission.distinct_test_names();

    let dmi_info = submission
        .dmi_info
        .as_ref()
        .filter(|dmi| !dmi.is_empty())
        .and_then(|dmi| serde_json::to_value(dmi).ok());

    let new_run = NewRun {
        hostname: submission.hostname,
        architecture: submission.architecture,
        cpu_model: submission.cpu_model,
        cpu_cores: submission.cpu_cores,
        total_memory_mb: submission.total_memory_mb,
        os_info: submission.os_info,
        kernel_version: submission.kernel_version,
        benchmark_started_at: parse_timestamp(submission.benchmark_started_at.as_deref()),
        benchmark_completed_at: parse_timestamp(submission.benchmark_completed_at.as_deref()),
        user_id,
        is_anonymous: user_id.is_none(),
        benchmark_version: submission.benchmark_version,
        tags: submission.tags,
        notes: submission.notes,
        submitter_ip,
        dmi_info,
        console_output: submission.console_output,
        results: submission
            .results
            .into_iter()
            .map(|r| NewResult {
                test_name: r.test_name,
                test_category: r.test_category,
                value: r.value,
                unit: r.unit,
                raw_output: r.raw_output,
                metrics: r.metrics,
            })
            .collect(),
    };

    let id = state.runs.insert(new_run).await?;
    info!(run_id = id, "Benchmark submitted");

    spawn_scoped_refresh(state.clone(), test_names);

    Ok(Json(json!({
        "id": id,
        "message": "Benchmark submitted successfully",
    })))
}

/// First X-Forwarded-For element when behind a proxy, else the peer
/// address.
fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(forwarded.to_string());
    }
    connect_info.map(|ci| ci.0.ip().to_string())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub architecture: Option<String>,
    pub hostname: Option<String>,
}

/// `GET /api/v1/benchmarks`
pub async fn list(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RunSummary>>, ApiError> {
    require_browsing(&state, &user)?;

    let filter = RunFilter {
        architecture: query.architecture,
        hostname: query.hostname,
        limit: state.clamp_limit(query.limit),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let runs = state.runs.list(&filter).await?;
    Ok(Json(runs))
}

/// `GET /api/v1/benchmarks/:id`
///
/// Sensitive fields (console output, submitter IP, owning user id) are
/// nulled out unless the requester owns the run or is an admin.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RunDetail>, ApiError> {
    require_browsing(&state, &user)?;

    let mut run = state
        .runs
        .detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Benchmark not found"))?;

    let privileged = user
        .as_ref()
        .map(|u| u.is_admin || Some(u.id) == run.user_id)
        .unwrap_or(false);
    if !privileged {
        run.console_output = None;
        run.submitter_ip = None;
        run.user_id = None;
    }

    Ok(Json(run))
}

/// `DELETE /api/v1/benchmarks/:id`
///
/// Owners (and admins) only. Results cascade at the schema level; the
/// affected test names get a scoped stats refresh afterwards.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let run = state
        .runs
        .detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Benchmark not found"))?;

    if !user.is_admin && run.user_id != Some(user.id) {
        return Err(ApiError::forbidden(
            "You can only delete your own benchmarks",
        ));
    }

    let test_names = state
        .runs
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Benchmark not found"))?;

    info!(run_id = id, user_id = user.id, "Benchmark run deleted");
    spawn_scoped_refresh(state.clone(), test_names);

    Ok(Json(json!({"message": "Benchmark run deleted"})))
}
