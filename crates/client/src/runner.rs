// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark orchestration.
//!
//! [`Runner`] owns the output directory, the console log (which becomes
//! the submitted `console_output`), the collected results and the
//! detected tool versions. The individual tool wrappers live in
//! [`crate::tools`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use benchcom_core::model::ResultSubmission;

use crate::{submit, sysinfo, tools, BENCHCOM_VERSION};

const LOGO: &str = r"
██████╗ ███████╗███╗   ██╗ ██████╗██╗  ██╗ ██████╗ ██████╗ ███╗   ███╗
██╔══██╗██╔════╝████╗  ██║██╔════╝██║  ██║██╔════╝██╔═══██╗████╗ ████║
██████╔╝█████╗  ██╔██╗ ██║██║     ███████║██║     ██║   ██║██╔████╔██║
██╔══██╗██╔══╝  ██║╚██╗██║██║     ██╔══██║██║     ██║   ██║██║╚██╔╝██║
██████╔╝███████╗██║ ╚████║╚██████╗██║  ██║╚██████╗╚██████╔╝██║ ╚═╝ ██║
╚═════╝ ╚══════╝╚═╝  ╚═══╝ ╚═════╝╚═╝  ╚═╝ ╚═════╝ ╚═════╝ ╚═╝     ╚═╝
";

/// Options controlling a benchmark session.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub output_dir: Option<String>,
    pub fast: bool,
    pub full: bool,
}

/// Orchestrates one benchmark session on this machine.
pub struct Runner {
    pub hostname: String,
    pub start_time: DateTime<Utc>,
    pub cores: usize,
    pub results: Vec<ResultSubmission>,
    pub tool_versions: BTreeMap<String, String>,
    pub output_dir: PathBuf,
    pub opts: RunnerOptions,
    console_log: Vec<String>,
}

impl Runner {
    /// Create a runner and its output directory.
    pub fn new(opts: RunnerOptions) -> anyhow::Result<Self> {
        let hostname = sysinfo::hostname();
        let start_time = Utc::now();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let output_dir = match &opts.output_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(format!(
                "benchcom_{}_{}",
                hostname,
                start_time.format("%Y%m%d_%H%M%S")
            )),
        };
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;

        Ok(Self {
            hostname,
            start_time,
            cores,
            results: Vec::new(),
            tool_versions: BTreeMap::new(),
            output_dir,
            opts,
            console_log: Vec::new(),
        })
    }

    /// Print a message, remember it for the submitted console output and
    /// append it to the summary file.
    pub fn log(&mut self, message: &str) {
        println!("{}", message);
        self.console_log.push(message.to_string());
        let summary = self.output_dir.join("benchmark_summary.txt");
        let line = format!("{}\n", message);
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(summary)
            .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
    }

    /// The accumulated console log.
    pub fn console_output(&self) -> String {
        self.console_log.join("\n")
    }

    /// Run a command with a timeout, capturing stdout and stderr combined.
    ///
    /// Returns the captured output and the exit code; a missing binary or
    /// a timeout yields empty output and `None`.
    pub async fn run_command(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> (String, Option<i32>) {
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(out)) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                (text, out.status.code())
            }
            _ => (String::new(), None),
        }
    }

    /// Run a command feeding it text on stdin.
    pub async fn run_command_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
        timeout: Duration,
    ) -> (String, Option<i32>) {
        let spawn = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let Ok(mut child) = spawn else {
            return (String::new(), None);
        };

        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(input.as_bytes()).await.is_err() {
                return (String::new(), None);
            }
        }

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(out)) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                (text, out.status.code())
            }
            _ => (String::new(), None),
        }
    }

    /// Whether a binary is available on PATH.
    pub async fn check_command(&self, cmd: &str) -> bool {
        let (_, code) = self
            .run_command("which", &[cmd], Duration::from_secs(10))
            .await;
        code == Some(0)
    }

    /// Capture the first non-empty line of a tool's version output.
    pub async fn tool_version(&mut self, tool: &str, cmd: &str, version_arg: &str) {
        let (output, _) = self
            .run_command(cmd, &[version_arg], Duration::from_secs(10))
            .await;
        if let Some(line) = output.lines().map(str::trim).find(|l| !l.is_empty()) {
            self.tool_versions.insert(tool.to_string(), line.to_string());
        }
    }

    /// Record a parsed benchmark result.
    pub fn add_result(
        &mut self,
        test_name: &str,
        test_category: &str,
        value: f64,
        unit: &str,
        raw_output: &str,
        metrics: Option<Value>,
    ) {
        self.results.push(ResultSubmission {
            test_name: test_name.to_string(),
            test_category: test_category.to_string(),
            value: Some(value),
            unit: Some(unit.to_string()),
            raw_output: Some(raw_output.to_string()),
            metrics,
        });
    }

    /// Save a tool's raw output next to the summary.
    pub fn save_raw(&self, filename: &str, contents: &str) {
        let _ = std::fs::write(self.output_dir.join(filename), contents);
    }

    /// Run the selected benchmark set, save and optionally submit results.
    pub async fn run_all(&mut self) -> anyhow::Result<()> {
        for line in LOGO.trim_matches('\n').lines() {
            self.log(line);
        }
        self.log("");
        self.log(&format!("v{} - Universal Benchmark Suite", BENCHCOM_VERSION));
        if self.opts.fast {
            self.log("(FAST MODE)");
        }
        self.log(&format!("Hostname: {}", self.hostname));
        self.log(&format!("Cores detected: {}", self.cores));
        self.log(&format!("Started: {}", self.start_time));
        self.log("================================");
        self.log("");

        let info = sysinfo::collect(self).await;
        self.log("=== SYSTEM INFO ===");
        if let Some(os) = &info.os_info {
            self.log(os);
        }
        self.log("");

        if self.opts.fast {
            tools::run_openssl(self).await;
        } else if self.opts.full {
            tools::run_passmark(self).await;
            tools::run_openssl(self).await;
            tools::run_sysbench_cpu(self).await;
            tools::run_sysbench_memory(self).await;
            tools::run_7zip(self).await;
            tools::run_pi_calculation(self).await;
            tools::run_disk_write(self).await;
            tools::run_disk_read(self).await;
        } else {
            // Default: PassMark when installed, OpenSSL as the baseline.
            tools::run_passmark(self).await;
            tools::run_openssl(self).await;
        }

        if !self.tool_versions.is_empty() {
            self.log("=== TOOL VERSIONS ===");
            let lines: Vec<String> = self
                .tool_versions
                .iter()
                .map(|(tool, version)| format!("  {}: {}", tool, version))
                .collect();
            for line in lines {
                self.log(&line);
            }
            self.log("");
        }

        self.log("================================");
        self.log(&format!("{}", "Benchmark Complete!".green().bold()));
        self.log(&format!("Finished: {}", Utc::now()));
        self.log(&format!("Results saved to: {}/", self.output_dir.display()));
        self.log("================================");

        self.save_results()?;

        if self.opts.api_url.is_some() {
            submit::submit(self, info).await;
        }

        self.create_tarball().await;
        Ok(())
    }

    /// Write results.json into the output directory.
    fn save_results(&self) -> anyhow::Result<()> {
        let data = json!({
            "benchcom_version": BENCHCOM_VERSION,
            "tool_versions": self.tool_versions,
            "results": self.results,
        });
        let path = self.output_dir.join("results.json");
        std::fs::write(&path, serde_json::to_string_pretty(&data)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Compress the output directory; best effort.
    async fn create_tarball(&mut self) {
        let tarball = format!("{}.tar.gz", self.output_dir.display());
        let dir = self.output_dir.display().to_string();
        let (_, code) = self
            .run_command(
                "tar",
                &["-czf", &tarball, &dir],
                Duration::from_secs(120),
            )
            .await;
        if code == Some(0) && Path::new(&tarball).exists() {
            self.log("");
            self.log(&format!("Compressed results: {}", tarball));
        }
    }
}
