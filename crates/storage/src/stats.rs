// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! The stats aggregator and stat queries.
//!
//! `recompute` is the authoritative refresh of the `benchmark_stats`
//! table, optionally scoped to one test name:
//!
//! 1. read all non-null result values joined with their run's grouping
//!    columns, in submission order
//! 2. group and compute statistics in Rust ([`crate::aggregate`])
//! 3. upsert each group in its own single-statement
//!    `INSERT ... ON CONFLICT DO UPDATE` (all statistic columns replaced
//!    together, so concurrent recomputes are last-writer-wins without
//!    partial merges)
//! 4. delete stale rows inside the scope: anything whose `last_updated`
//!    predates this recompute's start was not produced by step 3 and no
//!    longer has samples
//!
//! The stale-sweep cutoff uses the database clock, not the application
//! clock, so a concurrent writer's fresh row is never mistaken for a
//! stale one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};

use crate::aggregate::{build_groups, SourceRow};
use crate::Result;

/// One row of the `benchmark_stats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatRow {
    pub id: i64,
    pub cpu_model: Option<String>,
    pub architecture: String,
    pub system_type: Option<String>,
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

/// Outcome of one recompute pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecomputeOutcome {
    pub groups_written: u64,
    pub groups_deleted: u64,
}

/// A CPU model that has stats, with the number of covered tests.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CpuEntry {
    pub cpu_model: String,
    pub architecture: String,
    pub test_count: i64,
}

/// A system type that has stats, with the number of covered tests.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemEntry {
    pub system_type: String,
    pub test_count: i64,
}

/// Repository of pre-aggregated statistics.
#[async_trait]
pub trait StatStore: Send + Sync {
    /// Recompute stats, optionally restricted to one test name.
    async fn recompute(&self, test_name: Option<&str>) -> Result<RecomputeOutcome>;

    /// Stat rows for one test, best median first.
    async fn by_test(&self, test_name: &str, limit: i64) -> Result<Vec<StatRow>>;

    /// Distinct CPU models that have stats.
    async fn available_cpus(&self) -> Result<Vec<CpuEntry>>;

    /// Distinct system types that have stats.
    async fn available_systems(&self) -> Result<Vec<SystemEntry>>;
}

/// PostgreSQL-backed [`StatStore`].
#[derive(Debug, Clone)]
pub struct PgStatStore {
    pool: PgPool,
}

impl PgStatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatStore for PgStatStore {
    #[instrument(skip(self))]
    async fn recompute(&self, test_name: Option<&str>) -> Result<RecomputeOutcome> {
        // Database clock, read before the source rows: every row upserted
        // below gets last_updated >= started_at.
        let started_at: DateTime<Utc> = sqlx::query_scalar("SELECT now()")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT
                bres.test_name,
                bres.test_category,
                bres.unit,
                bres.value,
                br.cpu_model,
                br.architecture,
                br.dmi_info
            FROM benchmark_results bres
            JOIN benchmark_runs br ON bres.run_id = br.id
            WHERE bres.value IS NOT NULL
              AND ($1::text IS NULL OR bres.test_name = $1)
            ORDER BY br.submitted_at ASC, bres.id ASC
            "#,
        )
        .bind(test_name)
        .fetch_all(&self.pool)
        .await?;

        let groups = build_groups(rows);
        let mut groups_written: u64 = 0;

        for group in &groups {
            sqlx::query(
                r#"
                INSERT INTO benchmark_stats (
                    cpu_model, architecture, system_type, test_name,
                    test_category, unit, median_value, mean_value,
                    min_value, max_value, std_dev, sample_count, last_updated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
                ON CONFLICT ON CONSTRAINT benchmark_stats_group_key
                DO UPDATE SET
                    test_category = EXCLUDED.test_category,
                    unit = EXCLUDED.unit,
                    median_value = EXCLUDED.median_value,
                    mean_value = EXCLUDED.mean_value,
                    min_value = EXCLUDED.min_value,
                    max_value = EXCLUDED.max_value,
                    std_dev = EXCLUDED.std_dev,
                    sample_count = EXCLUDED.sample_count,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(&group.key.cpu_model)
            .bind(&group.key.architecture)
            .bind(&group.key.system_type)
            .bind(&group.key.test_name)
            .bind(&group.test_category)
            .bind(&group.unit)
            .bind(group.stats.median)
            .bind(group.stats.mean)
            .bind(group.stats.min)
            .bind(group.stats.max)
            .bind(group.stats.std_dev)
            .bind(group.stats.sample_count as i64)
            .execute(&self.pool)
            .await?;
            groups_written += 1;
        }

        // Authoritative sweep: rows in scope not refreshed above have no
        // remaining samples.
        let groups_deleted = sqlx::query(
            r#"
            DELETE FROM benchmark_stats
            WHERE ($1::text IS NULL OR test_name = $1)
              AND last_updated < $2
            "#,
        )
        .bind(test_name)
        .bind(started_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        info!(
            scope = test_name.unwrap_or("<all>"),
            groups_written, groups_deleted, "Stats recompute finished"
        );

        Ok(RecomputeOutcome {
            groups_written,
            groups_deleted,
        })
    }

    async fn by_test(&self, test_name: &str, limit: i64) -> Result<Vec<StatRow>> {
        let rows = sqlx::query_as::<_, StatRow>(
            r#"
            SELECT
                id, cpu_model, architecture, system_type, test_name,
                test_category, unit, median_value, mean_value,
                min_value, max_value, std_dev, sample_count, last_updated
            FROM benchmark_stats
            WHERE test_name = $1
            ORDER BY
                CASE
                    WHEN unit ILIKE '%second%' THEN median_value
                    ELSE -median_value
                END ASC
            LIMIT $2
            "#,
        )
        .bind(test_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn available_cpus(&self) -> Result<Vec<CpuEntry>> {
        let rows = sqlx::query_as::<_, CpuEntry>(
            r#"
            SELECT cpu_model, architecture, COUNT(*) AS test_count
            FROM benchmark_stats
            WHERE cpu_model IS NOT NULL
            GROUP BY cpu_model, architecture
            ORDER BY cpu_model, architecture
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn available_systems(&self) -> Result<Vec<SystemEntry>> {
        let rows = sqlx::query_as::<_, SystemEntry>(
            r#"
            SELECT system_type, COUNT(*) AS test_count
            FROM benchmark_stats
            WHERE system_type IS NOT NULL
            GROUP BY system_type
            ORDER BY system_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
