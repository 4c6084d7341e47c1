// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark client for Benchcom.
//!
//! Shells out to system benchmarking tools (PassMark, OpenSSL speed,
//! sysbench, 7-Zip, dd-based disk I/O, a bc-based pi calculation),
//! parses their output into structured results, archives the raw
//! output, and optionally submits everything to a Benchcom API.

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod parse;
pub mod runner;
pub mod submit;
pub mod sysinfo;
pub mod tools;

use clap::Parser;

use crate::runner::{Runner, RunnerOptions};

/// Client version reported in submissions.
pub const BENCHCOM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Universal Linux benchmark client.
#[derive(Parser, Debug)]
#[command(name = "benchcom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API URL to submit results to.
    #[arg(long)]
    pub api_url: Option<String>,

    /// API bearer token for authenticated submissions.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Output directory for raw results (default: benchcom_<host>_<ts>).
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Fast mode: only run OpenSSL (quick).
    #[arg(long)]
    pub fast: bool,

    /// Full mode: run every benchmark (PassMark, OpenSSL, sysbench,
    /// 7-Zip, pi, disk I/O).
    #[arg(long)]
    pub full: bool,
}

/// Parse arguments and run the benchmark suite.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut runner = Runner::new(RunnerOptions {
        api_url: cli.api_url,
        api_token: cli.api_token,
        output_dir: cli.output_dir,
        fast: cli.fast,
        full: cli.full,
    })?;

    runner.run_all().await
}
