// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Connection pool construction and embedded migrations.

use std::time::Duration;

use benchcom_core::settings::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::Result;

/// Build a connection pool from the configured database settings.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.url())
        .await?;
    info!(
        host = %settings.host,
        database = %settings.database,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

/// Run embedded schema migrations to the latest version.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!().run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
