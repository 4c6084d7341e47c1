// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then environment variables
//! with the `BENCHCOM` prefix and `__` as the nesting separator, e.g.
//! `BENCHCOM__DATABASE__HOST=db` or
//! `BENCHCOM__AUTH__ALLOW_ANONYMOUS_SUBMISSIONS=false`.

use config::{Config, Environment};
use serde::Deserialize;

use crate::Result;

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub api: ApiSettings,
    pub stats: StatsSettings,
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    /// Connection URL in the form sqlx expects.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Bind address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication and anonymity settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret. Must be overridden in production.
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    /// Accept `POST /benchmarks` without a bearer token.
    pub allow_anonymous_submissions: bool,
    /// Serve list/detail/stats endpoints without a bearer token.
    pub allow_anonymous_browsing: bool,
}

/// API behaviour settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Default page size when a list request omits `limit`.
    pub default_page_size: i64,
    /// Hard cap applied to any requested `limit`.
    pub max_page_size: i64,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
}

/// Stats aggregation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsSettings {
    /// Interval between periodic full recomputes, in seconds.
    pub refresh_interval_secs: u64,
}

impl Settings {
    /// Load settings from defaults and the environment.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "benchcom")?
            .set_default("database.password", "benchcom")?
            .set_default("database.database", "benchcom")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 5)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("auth.jwt_secret", "change-me-in-production")?
            .set_default("auth.token_expiry_minutes", 30)?
            .set_default("auth.allow_anonymous_submissions", true)?
            .set_default("auth.allow_anonymous_browsing", true)?
            .set_default("api.default_page_size", 50)?
            .set_default("api.max_page_size", 500)?
            .set_default(
                "api.cors_origins",
                vec!["http://localhost:3000", "http://localhost:5173"],
            )?
            .set_default("stats.refresh_interval_secs", 900)?
            .add_source(Environment::with_prefix("BENCHCOM").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
