// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark run and result persistence.
//!
//! A run and its results are inserted in one transaction; deleting a
//! run cascades to its results at the schema level. Deletion reports
//! the distinct test names that were affected so the caller can scope
//! the follow-up stats recompute.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use crate::Result;

/// A new run ready for insertion. Timestamps are already parsed and the
/// submitter identity resolved by the API layer.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub hostname: String,
    pub architecture: String,
    pub cpu_model: Option<String>,
    pub cpu_cores: Option<i32>,
    pub total_memory_mb: Option<i64>,
    pub os_info: Option<String>,
    pub kernel_version: Option<String>,
    pub benchmark_started_at: Option<DateTime<Utc>>,
    pub benchmark_completed_at: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    pub is_anonymous: bool,
    pub benchmark_version: String,
    pub tags: Option<Value>,
    pub notes: Option<String>,
    pub submitter_ip: Option<String>,
    pub dmi_info: Option<Value>,
    pub console_output: Option<String>,
    pub results: Vec<NewResult>,
}

/// A new result belonging to a [`NewRun`].
#[derive(Debug, Clone)]
pub struct NewResult {
    pub test_name: String,
    pub test_category: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub raw_output: Option<String>,
    pub metrics: Option<Value>,
}

/// List-view projection of a run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunSummary {
    pub id: i64,
    pub hostname: String,
    pub architecture: String,
    pub cpu_model: Option<String>,
    pub cpu_cores: Option<i32>,
    pub total_memory_mb: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub is_anonymous: bool,
    pub benchmark_version: String,
    pub username: Option<String>,
    pub result_count: i64,
    pub dmi_info: Option<Value>,
}

/// Full detail of a run, including sensitive fields. Redaction for
/// non-owners happens in the API layer, not here.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunDetail {
    pub id: i64,
    pub hostname: String,
    pub architecture: String,
    pub cpu_model: Option<String>,
    pub cpu_cores: Option<i32>,
    pub total_memory_mb: Option<i64>,
    pub os_info: Option<String>,
    pub kernel_version: Option<String>,
    pub benchmark_started_at: Option<DateTime<Utc>>,
    pub benchmark_completed_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub is_anonymous: bool,
    pub benchmark_version: String,
    pub tags: Option<Value>,
    pub notes: Option<String>,
    pub dmi_info: Option<Value>,
    pub console_output: Option<String>,
    pub submitter_ip: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub results: Vec<ResultDetail>,
}

/// A result row inside a run detail view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResultDetail {
    pub id: i64,
    pub test_name: String,
    pub test_category: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub metrics: Option<Value>,
}

/// Filters for the run list endpoint.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub architecture: Option<String>,
    pub hostname: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Query parameters for the results-by-test view.
#[derive(Debug, Clone, Default)]
pub struct ResultQuery {
    pub test_name: Option<String>,
    pub test_category: Option<String>,
    pub limit: i64,
}

/// A raw result joined with its run, for cross-machine comparison.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResultWithRun {
    pub id: i64,
    pub test_name: String,
    pub test_category: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub run_id: i64,
    pub hostname: String,
    pub cpu_model: Option<String>,
    pub cpu_cores: Option<i32>,
    pub architecture: String,
    pub submitted_at: DateTime<Utc>,
}

/// One entry of the test catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestCatalogEntry {
    pub test_name: String,
    pub test_category: String,
    pub unit: Option<String>,
    pub result_count: i64,
}

/// Repository of benchmark runs and their results.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Insert a run with all of its results atomically. Returns the run id.
    async fn insert(&self, new: NewRun) -> Result<i64>;

    /// List runs, newest first.
    async fn list(&self, filter: &RunFilter) -> Result<Vec<RunSummary>>;

    /// Fetch a run with its results. `None` when the id does not exist.
    async fn detail(&self, id: i64) -> Result<Option<RunDetail>>;

    /// Delete a run (results cascade). Returns the distinct test names
    /// the run contributed to, or `None` when the id does not exist.
    async fn delete(&self, id: i64) -> Result<Option<Vec<String>>>;

    /// Raw results joined with run info, best value first.
    async fn results_by_test(&self, query: &ResultQuery) -> Result<Vec<ResultWithRun>>;

    /// Distinct (test_name, test_category, unit) combinations with counts.
    async fn test_catalog(&self) -> Result<Vec<TestCatalogEntry>>;
}

/// PostgreSQL-backed [`RunStore`].
#[derive(Debug, Clone)]
pub struct PgRunStore {
    pool: PgPool,
}

impl PgRunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for PgRunStore {
    #[instrument(skip(self, new), fields(hostname = %new.hostname, results = new.results.len()))]
    async fn insert(&self, new: NewRun) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let run_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO benchmark_runs (
                hostname, architecture, cpu_model, cpu_cores, total_memory_mb,
                os_info, kernel_version, benchmark_started_at, benchmark_completed_at,
                user_id, is_anonymous, benchmark_version, tags, notes,
                submitter_ip, dmi_info, console_output
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(&new.hostname)
        .bind(&new.architecture)
        .bind(&new.cpu_model)
        .bind(new.cpu_cores)
        .bind(new.total_memory_mb)
        .bind(&new.os_info)
        .bind(&new.kernel_version)
        .bind(new.benchmark_started_at)
        .bind(new.benchmark_completed_at)
        .bind(new.user_id)
        .bind(new.is_anonymous)
        .bind(&new.benchmark_version)
        .bind(&new.tags)
        .bind(&new.notes)
        .bind(&new.submitter_ip)
        .bind(&new.dmi_info)
        .bind(&new.console_output)
        .fetch_one(&mut *tx)
        .await?;

        for result in &new.results {
            sqlx::query(
                r#"
                INSERT INTO benchmark_results (
                    run_id, test_name, test_category, value, unit, raw_output, metrics
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(run_id)
            .bind(&result.test_name)
            .bind(&result.test_category)
            .bind(result.value)
            .bind(&result.unit)
            .bind(&result.raw_output)
            .bind(&result.metrics)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(run_id)
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query_as::<_, RunSummary>(
            r#"
            SELECT
                br.id,
                br.hostname,
                br.architecture,
                br.cpu_model,
                br.cpu_cores,
                br.total_memory_mb,
                br.submitted_at,
                br.is_anonymous,
                br.benchmark_version,
                u.username,
                COUNT(bres.id) AS result_count,
                br.dmi_info
            FROM benchmark_runs br
            LEFT JOIN users u ON br.user_id = u.id
            LEFT JOIN benchmark_results bres ON br.id = bres.run_id
            WHERE ($1::text IS NULL OR br.architecture = $1)
              AND ($2::text IS NULL OR br.hostname = $2)
            GROUP BY br.id, u.username
            ORDER BY br.submitted_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.architecture)
        .bind(&filter.hostname)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn detail(&self, id: i64) -> Result<Option<RunDetail>> {
        let run = sqlx::query_as::<_, RunDetail>(
            r#"
            SELECT
                br.id,
                br.hostname,
                br.architecture,
                br.cpu_model,
                br.cpu_cores,
                br.total_memory_mb,
                br.os_info,
                br.kernel_version,
                br.benchmark_started_at,
                br.benchmark_completed_at,
                br.submitted_at,
                br.is_anonymous,
                br.benchmark_version,
                br.tags,
                br.notes,
                br.dmi_info,
                br.console_output,
                br.submitter_ip,
                br.user_id,
                u.username
            FROM benchmark_runs br
            LEFT JOIN users u ON br.user_id = u.id
            WHERE br.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut run) = run else {
            return Ok(None);
        };

        run.results = sqlx::query_as::<_, ResultDetail>(
            r#"
            SELECT id, test_name, test_category, value, unit, metrics
            FROM benchmark_results
            WHERE run_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(run))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        let test_names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT test_name FROM benchmark_results WHERE run_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM benchmark_runs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if deleted == 0 {
            Ok(None)
        } else {
            Ok(Some(test_names))
        }
    }

    async fn results_by_test(&self, query: &ResultQuery) -> Result<Vec<ResultWithRun>> {
        // Best first: lower is better for durations, higher for throughput.
        let rows = sqlx::query_as::<_, ResultWithRun>(
            r#"
            SELECT
                bres.id,
                bres.test_name,
                bres.test_category,
                bres.value,
                bres.unit,
                br.id AS run_id,
                br.hostname,
                br.cpu_model,
                br.cpu_cores,
                br.architecture,
                br.submitted_at
            FROM benchmark_results bres
            JOIN benchmark_runs br ON bres.run_id = br.id
            WHERE ($1::text IS NULL OR bres.test_name = $1)
              AND ($2::text IS NULL OR bres.test_category = $2)
            ORDER BY
                CASE
                    WHEN bres.unit ILIKE '%second%' THEN bres.value
                    ELSE -bres.value
                END ASC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(&query.test_name)
        .bind(&query.test_category)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn test_catalog(&self) -> Result<Vec<TestCatalogEntry>> {
        let rows = sqlx::query_as::<_, TestCatalogEntry>(
            r#"
            SELECT test_name, test_category, unit, COUNT(*) AS result_count
            FROM benchmark_results
            GROUP BY test_name, test_category, unit
            ORDER BY test_category, test_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
