// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchcom API service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use benchcom_api::background::spawn_periodic_refresh;
use benchcom_api::state::AppState;
use benchcom_core::settings::Settings;
use benchcom_storage::runs::PgRunStore;
use benchcom_storage::stats::PgStatStore;
use benchcom_storage::users::PgUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "benchcom_api=info,benchcom_storage=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;

    let pool = benchcom_storage::connect(&settings.database).await?;
    benchcom_storage::migrate(&pool).await?;
    info!(
        database = %settings.database.database,
        "Connected to PostgreSQL, migrations applied"
    );

    let state = Arc::new(AppState::new(
        settings,
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgRunStore::new(pool.clone())),
        Arc::new(PgStatStore::new(pool)),
    ));

    spawn_periodic_refresh(state.clone());

    let addr = state.settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Benchcom API listening");

    axum::serve(
        listener,
        benchcom_api::app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
