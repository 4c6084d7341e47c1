// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Submission of a finished session to a Benchcom API.

use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use benchcom_core::model::RunSubmission;

use crate::runner::Runner;
use crate::sysinfo::SystemInfo;
use crate::BENCHCOM_VERSION;

/// POST the session's results to the configured API. Failures are
/// logged, never fatal: the local result files always survive.
pub async fn submit(runner: &mut Runner, info: SystemInfo) {
    let Some(api_url) = runner.opts.api_url.clone() else {
        return;
    };

    runner.log("");
    runner.log("================================");
    runner.log(&format!("Submitting to API: {}", api_url));
    runner.log("================================");

    let payload = RunSubmission {
        hostname: info.hostname,
        architecture: info.architecture,
        cpu_model: info.cpu_model,
        cpu_cores: Some(info.cpu_cores),
        total_memory_mb: info.total_memory_mb,
        os_info: info.os_info,
        kernel_version: info.kernel_version,
        benchmark_started_at: Some(runner.start_time.to_rfc3339()),
        benchmark_completed_at: Some(Utc::now().to_rfc3339()),
        benchmark_version: BENCHCOM_VERSION.to_string(),
        tags: Some(json!({
            "benchcom_version": BENCHCOM_VERSION,
            "tool_versions": runner.tool_versions,
        })),
        notes: None,
        dmi_info: info.dmi_info,
        console_output: Some(runner.console_output()),
        results: runner.results.clone(),
    };

    let client = reqwest::Client::new();
    let mut request = client
        .post(format!(
            "{}/api/v1/benchmarks",
            api_url.trim_end_matches('/')
        ))
        .timeout(Duration::from_secs(30))
        .json(&payload);
    if let Some(token) = &runner.opts.api_token {
        request = request.bearer_auth(token);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                runner.log(&format!(
                    "{} Successfully submitted to API (HTTP {})",
                    "✓".green(),
                    status.as_u16()
                ));
                if let Ok(body) = response.json::<serde_json::Value>().await {
                    if let Some(id) = body.get("id").and_then(|v| v.as_i64()) {
                        runner.log(&format!("  Benchmark ID: {}", id));
                    }
                }
            } else {
                let body = response.text().await.unwrap_or_default();
                runner.log(&format!(
                    "{} API submission failed (HTTP {})",
                    "✗".red(),
                    status.as_u16()
                ));
                runner.log(&format!("  Response: {}", body));
            }
        }
        Err(e) => {
            runner.log(&format!("{} API submission error: {}", "✗".red(), e));
        }
    }
}
