// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared application state.

use std::sync::Arc;

use benchcom_core::settings::Settings;
use benchcom_storage::runs::RunStore;
use benchcom_storage::stats::StatStore;
use benchcom_storage::users::UserStore;

/// Application state shared by every handler. The stores are trait
/// objects so tests can substitute in-memory fakes.
pub struct AppState {
    pub settings: Settings,
    pub users: Arc<dyn UserStore>,
    pub runs: Arc<dyn RunStore>,
    pub stats: Arc<dyn StatStore>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        users: Arc<dyn UserStore>,
        runs: Arc<dyn RunStore>,
        stats: Arc<dyn StatStore>,
    ) -> Self {
        Self {
            settings,
            users,
            runs,
            stats,
        }
    }

    /// Clamp a requested page size to the configured bounds.
    pub fn clamp_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.settings.api.default_page_size)
            .clamp(1, self.settings.api.max_page_size)
    }
}
