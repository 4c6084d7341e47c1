// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL persistence for Benchcom.
//!
//! Three repository traits cover the persisted entities — [`users::UserStore`],
//! [`runs::RunStore`] and [`stats::StatStore`] — each with a `Pg*`
//! implementation over a shared [`sqlx::PgPool`]. The traits exist so the
//! API service can run its integration tests against in-memory fakes.
//!
//! The stats aggregator lives in [`stats`] (database plumbing) and
//! [`aggregate`] (pure grouping + statistics, testable without a
//! database). Schema migrations are embedded via `sqlx::migrate!`.

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod error;
pub mod pool;
pub mod runs;
pub mod stats;
pub mod users;

pub use error::{Error, Result};
pub use pool::{connect, migrate};
