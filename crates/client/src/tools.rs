// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wrappers around the external benchmark tools.
//!
//! Each wrapper follows the same shape: discover the binary, capture
//! its version, run it with a timeout, save the raw output into the
//! session directory, parse the metric and record a result. A missing
//! tool logs a line and skips; it never fails the session.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::parse;
use crate::runner::Runner;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const PASSMARK_TIMEOUT: Duration = Duration::from_secs(900);

const PASSMARK_PATHS: &[&str] = &[
    "/opt/passmark/pt_linux/pt_linux",
    "/opt/passmark/PerformanceTest/PerformanceTest_Linux_x86-64",
    "/opt/passmark/PerformanceTest/PerformanceTest_Linux_ARM64",
    "/opt/passmark/PerformanceTest/pt_linux_x64",
    "/opt/passmark/pt_linux_x64",
    "/opt/passmark/pt_linux_arm64",
    "/usr/local/bin/pt_linux",
    "pt_linux",
];

const DISK_READ_DEVICES: &[&str] = &["/dev/mmcblk0", "/dev/sda", "/dev/nvme0n1", "/dev/vda"];

/// 7-Zip compression benchmark, single- and multi-threaded.
pub async fn run_7zip(runner: &mut Runner) {
    // 7z: p7zip, 7za: standalone p7zip, 7zz: the 7zip Debian package.
    let mut binary = None;
    for candidate in ["7z", "7za", "7zz"] {
        if runner.check_command(candidate).await {
            binary = Some(candidate);
            break;
        }
    }
    let Some(binary) = binary else {
        runner.log("7z not found, skipping...");
        return;
    };

    runner.tool_version("7zip", binary, "--help").await;

    runner.log("=== 7-ZIP BENCHMARK (1 thread) ===");
    let (output, _) = runner
        .run_command(binary, &["b", "-mmt1"], DEFAULT_TIMEOUT)
        .await;
    if !output.is_empty() {
        runner.save_raw("7zip_1t.txt", &output);
        if let Some(mips) = parse::sevenzip_mips(&output) {
            runner.add_result("7zip_1t", "compression", mips, "MIPS", &output, None);
        }
    }

    let threads = format!("-mmt{}", runner.cores);
    let test_name = format!("7zip_{}t", runner.cores);
    runner.log(&format!("=== 7-ZIP BENCHMARK ({} threads) ===", runner.cores));
    let (output, _) = runner
        .run_command(binary, &["b", &threads], DEFAULT_TIMEOUT)
        .await;
    if !output.is_empty() {
        runner.save_raw(&format!("{}.txt", test_name), &output);
        if let Some(mips) = parse::sevenzip_mips(&output) {
            runner.add_result(&test_name, "compression", mips, "MIPS", &output, None);
        }
    }

    runner.log("");
}

/// OpenSSL speed for SHA-256 and AES-256-CBC, 16KB-block throughput.
pub async fn run_openssl(runner: &mut Runner) {
    if !runner.check_command("openssl").await {
        runner.log("openssl not found, skipping...");
        return;
    }

    runner.tool_version("openssl", "openssl", "version").await;

    for (algorithm, test_name) in [("sha256", "openssl_sha256"), ("aes-256-cbc", "openssl_aes256")]
    {
        runner.log(&format!(
            "=== OPENSSL SPEED ({}, single-threaded) ===",
            algorithm.to_uppercase()
        ));
        let (output, _) = runner
            .run_command("openssl", &["speed", "-elapsed", algorithm], DEFAULT_TIMEOUT)
            .await;
        if !output.is_empty() {
            runner.save_raw(&format!("{}.txt", test_name), &output);
            let tail: Vec<&str> = output.lines().rev().take(5).collect();
            for line in tail.into_iter().rev() {
                runner.log(line);
            }
            if let Some(speed) = parse::openssl_speed_16k(&output, algorithm) {
                runner.add_result(test_name, "cryptography", speed, "KB/s", &output, None);
            }
        }
        runner.log("");
    }
}

/// sysbench CPU, single- and multi-threaded.
pub async fn run_sysbench_cpu(runner: &mut Runner) {
    if !runner.check_command("sysbench").await {
        runner.log("sysbench not found, skipping...");
        return;
    }

    runner.tool_version("sysbench", "sysbench", "--version").await;

    runner.log("=== SYSBENCH CPU (1 thread) ===");
    let (output, code) = runner
        .run_command(
            "sysbench",
            &["cpu", "--threads=1", "--time=10", "run"],
            DEFAULT_TIMEOUT,
        )
        .await;
    if code == Some(0) && !output.is_empty() {
        runner.save_raw("sysbench_cpu_1t.txt", &output);
        if let Some(eps) = parse::sysbench_events_per_sec(&output) {
            runner.add_result("sysbench_cpu_1t", "cpu", eps, "events/sec", &output, None);
        }
    }

    let threads = format!("--threads={}", runner.cores);
    let test_name = format!("sysbench_cpu_{}t", runner.cores);
    runner.log(&format!("=== SYSBENCH CPU ({} threads) ===", runner.cores));
    let (output, code) = runner
        .run_command(
            "sysbench",
            &["cpu", &threads, "--time=10", "run"],
            DEFAULT_TIMEOUT,
        )
        .await;
    if code == Some(0) && !output.is_empty() {
        runner.save_raw(&format!("{}.txt", test_name), &output);
        if let Some(eps) = parse::sysbench_events_per_sec(&output) {
            runner.add_result(&test_name, "cpu", eps, "events/sec", &output, None);
        }
    }

    runner.log("");
}

/// sysbench memory throughput.
pub async fn run_sysbench_memory(runner: &mut Runner) {
    if !runner.check_command("sysbench").await {
        return;
    }

    runner.log("=== SYSBENCH MEMORY ===");
    let (output, code) = runner
        .run_command(
            "sysbench",
            &[
                "memory",
                "--memory-block-size=1K",
                "--memory-total-size=10G",
                "run",
            ],
            DEFAULT_TIMEOUT,
        )
        .await;
    if code == Some(0) && !output.is_empty() {
        runner.save_raw("sysbench_memory.txt", &output);
        if let Some(speed) = parse::sysbench_mib_per_sec(&output) {
            runner.add_result("sysbench_memory", "memory", speed, "MiB/sec", &output, None);
        }
    }

    runner.log("");
}

/// PassMark PerformanceTest: CPU and memory marks plus per-test metrics.
pub async fn run_passmark(runner: &mut Runner) {
    let mut binary = None;
    for path in PASSMARK_PATHS {
        if Path::new(path).exists() || runner.check_command(path).await {
            binary = Some(*path);
            break;
        }
    }
    let Some(binary) = binary else {
        runner.log("PassMark pt_linux not found, skipping...");
        return;
    };

    runner.log("=== PASSMARK PERFORMANCETEST ===");
    runner.log("Running PassMark (this may take several minutes)...");

    // -r 1 = CPU only, -r 2 = memory only, -r 3 = all.
    let (output, code) = runner
        .run_command(binary, &["-r", "3"], PASSMARK_TIMEOUT)
        .await;

    // PassMark drops results*.yml into the working directory.
    let mut results_files = find_results_yml(&std::env::current_dir().unwrap_or_default());
    if results_files.is_empty() {
        results_files = find_results_yml(&runner.output_dir);
    }

    let mut results_yaml = None;
    for file in results_files {
        if let Ok(contents) = std::fs::read_to_string(&file) {
            let dest = runner.output_dir.join(file.file_name().unwrap_or_default());
            if file != dest {
                let _ = std::fs::rename(&file, &dest);
            }
            results_yaml = Some(contents);
            break;
        }
    }

    let Some(yaml) = results_yaml else {
        runner.log(&format!(
            "PassMark: no results file found (return code: {:?})",
            code
        ));
        if !output.is_empty() {
            runner.save_raw("passmark_output.txt", &output);
        }
        runner.log("");
        return;
    };

    runner.save_raw("passmark_raw.yml", &yaml);

    if let Some(version) = parse::passmark_version(&yaml) {
        runner.tool_versions.insert("passmark".to_string(), version);
    }

    if let Some(cpu_mark) = parse::passmark_value(&yaml, "SUMM_CPU").filter(|v| *v > 0.0) {
        runner.add_result("passmark_cpu", "cpu", cpu_mark, "points", &yaml, None);
        runner.log(&format!("  CPU Mark: {:.0}", cpu_mark));
    }

    if let Some(mem_mark) = parse::passmark_value(&yaml, "SUMM_ME").filter(|v| *v > 0.0) {
        runner.add_result("passmark_memory", "memory", mem_mark, "points", &yaml, None);
        runner.log(&format!("  Memory Mark: {:.0}", mem_mark));
    }

    let cpu_tests = [
        ("integer_math", "CPU_INTEGER_MATH"),
        ("float_math", "CPU_FLOATINGPOINT_MATH"),
        ("prime", "CPU_PRIME"),
        ("sorting", "CPU_SORTING"),
        ("encryption", "CPU_ENCRYPTION"),
        ("compression", "CPU_COMPRESSION"),
        ("single_thread", "CPU_SINGLETHREAD"),
        ("physics", "CPU_PHYSICS"),
        ("sse", "CPU_MATRIX_MULT_SSE"),
    ];
    let mut metrics = Map::new();
    for (name, key) in cpu_tests {
        if let Some(value) = parse::passmark_value(&yaml, key).filter(|v| *v > 0.0) {
            metrics.insert(name.to_string(), value.into());
        }
    }

    if let Some(Value::Number(st)) = metrics.get("single_thread").cloned() {
        if let Some(st_score) = st.as_f64() {
            runner.add_result(
                "passmark_cpu_single",
                "cpu",
                st_score,
                "points",
                &yaml,
                Some(Value::Object(metrics)),
            );
        }
    }

    runner.log("PassMark complete");
    runner.log("");
}

fn find_results_yml(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("results") && n.ends_with(".yml"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// bc-based pi calculation: 5000 digits, wall-clock seconds.
pub async fn run_pi_calculation(runner: &mut Runner) {
    if !runner.check_command("bc").await {
        runner.log("bc not found, skipping pi calculation...");
        return;
    }

    runner.log("=== SIMPLE CPU TEST (calculating pi) ===");
    let started = Instant::now();
    let (_, code) = runner
        .run_command_with_stdin("bc", &["-l"], "scale=5000; 4*a(1)\n", DEFAULT_TIMEOUT)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    if code == Some(0) {
        let message = format!("Time to calculate 5000 digits of Pi: {:.9}s", elapsed);
        runner.log(&message);
        runner.add_result("pi_calculation", "cpu", elapsed, "seconds", &message, None);
    }
    runner.log("");
}

/// Sequential write: 1GB of zeroes with fdatasync.
pub async fn run_disk_write(runner: &mut Runner) {
    runner.log("=== DISK WRITE TEST (1GB) ===");

    // Home directory avoids benchmarking a tmpfs working directory.
    let test_file = std::env::var("HOME")
        .map(PathBuf::from)
        .ok()
        .filter(|p| p.exists())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join(".benchcom_disk_test");
    runner.log(&format!("Test file: {}", test_file.display()));

    let of_arg = format!("of={}", test_file.display());
    let (output, code) = runner
        .run_command(
            "dd",
            &[
                "if=/dev/zero",
                &of_arg,
                "bs=1M",
                "count=1024",
                "conv=fdatasync",
            ],
            DEFAULT_TIMEOUT,
        )
        .await;

    if code != Some(0) || output.contains("No space left") {
        runner.log("Skipping: not enough disk space");
        let _ = std::fs::remove_file(&test_file);
        runner.log("");
        return;
    }

    if !output.is_empty() {
        runner.save_raw("disk_write.txt", &output);
        runner.log(&output);
        if let Some(speed) = parse::dd_mb_per_sec(&output) {
            runner.add_result("disk_write", "disk", speed, "MB/s", &output, None);
        }
    }

    let _ = std::fs::remove_file(&test_file);
    runner.log("");
}

/// Sequential read: 1GB directly from the first readable block device.
pub async fn run_disk_read(runner: &mut Runner) {
    let device = DISK_READ_DEVICES
        .iter()
        .find(|dev| std::fs::File::open(dev).is_ok());
    let Some(device) = device else {
        runner.log("No readable disk found for read test");
        return;
    };

    runner.log(&format!("=== DISK READ TEST (1GB from {}) ===", device));

    // Flush and drop caches so we measure the device, not the page cache.
    // Dropping caches needs root; best effort.
    let _ = runner.run_command("sync", &[], Duration::from_secs(30)).await;
    let _ = std::fs::write("/proc/sys/vm/drop_caches", "3");

    let if_arg = format!("if={}", device);
    let (output, _) = runner
        .run_command(
            "dd",
            &[&if_arg, "of=/dev/null", "bs=1M", "count=1024", "iflag=direct"],
            DEFAULT_TIMEOUT,
        )
        .await;

    if !output.is_empty() {
        runner.save_raw("disk_read.txt", &output);
        runner.log(&output);
        if let Some(speed) = parse::dd_mb_per_sec(&output) {
            runner.add_result("disk_read", "disk", speed, "MB/s", &output, None);
        }
    }

    runner.log("");
}
