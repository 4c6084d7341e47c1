// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for Benchcom.
//!
//! This crate holds everything shared between the benchmark client, the
//! storage layer and the HTTP API:
//!
//! - submission payloads ([`model::RunSubmission`], [`model::ResultSubmission`])
//! - DMI hardware identification and the `system_type` normalization
//!   ([`model::DmiInfo`], [`model::system_type`])
//! - descriptive statistics over benchmark samples ([`stats::describe`])
//! - runtime configuration ([`settings::Settings`])

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod model;
pub mod settings;
pub mod stats;

pub use error::{Error, Result};
