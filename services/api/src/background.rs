// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Background stats refresh tasks.
//!
//! Staleness is bounded two ways: a periodic full recompute, and a
//! scoped recompute spawned after every submission or deletion for the
//! affected test names. Both go through the same idempotent
//! `StatStore::recompute`, so overlap between them is harmless.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::state::AppState;

/// Spawn the periodic full-recompute loop. The first pass runs
/// immediately so a freshly started service serves stats.
pub fn spawn_periodic_refresh(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.settings.stats.refresh_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match state.stats.recompute(None).await {
                Ok(outcome) => info!(
                    groups_written = outcome.groups_written,
                    groups_deleted = outcome.groups_deleted,
                    "Periodic stats refresh complete"
                ),
                Err(e) => error!(error = %e, "Periodic stats refresh failed"),
            }
        }
    });
}

/// Spawn a one-shot recompute scoped to the given test names.
pub fn spawn_scoped_refresh(state: Arc<AppState>, test_names: Vec<String>) {
    if test_names.is_empty() {
        return;
    }
    tokio::spawn(async move {
        for test_name in test_names {
            if let Err(e) = state.stats.recompute(Some(&test_name)).await {
                warn!(test_name = %test_name, error = %e, "Scoped stats refresh failed");
            }
        }
    });
}
