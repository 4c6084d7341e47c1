// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchcom client entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = benchcom_client::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
