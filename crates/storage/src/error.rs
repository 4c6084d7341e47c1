// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Storage error types.

use thiserror::Error;

/// Convenience result alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the storage layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
