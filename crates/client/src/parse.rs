// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output parsers for the wrapped benchmark tools.
//!
//! Pure text-to-number functions, one per tool output format. Every
//! parser returns `None` on unrecognized output; the runner records no
//! result in that case rather than a zero.

use once_cell::sync::Lazy;
use regex::Regex;

static SEVENZIP_AVR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Avr:\s+\d+\s+\d+\s+(\d+)").expect("valid regex"));

static SYSBENCH_EVENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"events per second:\s+([\d.]+)").expect("valid regex"));

static SYSBENCH_MIB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d.]+) MiB/sec").expect("valid regex"));

static DD_GB: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s+GB/s").expect("valid regex"));

static DD_MB: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s+MB/s").expect("valid regex"));

static PASSMARK_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Major:\s*(\d+)\s+Minor:\s*(\d+)\s+Build:\s*(\d+)").expect("valid regex")
});

/// Extract compression MIPS from a 7-Zip benchmark `Avr:` line (third
/// number: the compression rating).
pub fn sevenzip_mips(output: &str) -> Option<f64> {
    SEVENZIP_AVR
        .captures(output)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Extract the 16KB-block throughput (KB/s) for one algorithm from an
/// `openssl speed` summary line. The summary row carries six block-size
/// columns; the last one is the 16384-byte column.
pub fn openssl_speed_16k(output: &str, algorithm: &str) -> Option<f64> {
    let pattern = format!(
        r"{}\s+[\d.]+k\s+[\d.]+k\s+[\d.]+k\s+[\d.]+k\s+[\d.]+k\s+([\d.]+)k",
        regex::escape(algorithm)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Extract events/sec from sysbench cpu output.
pub fn sysbench_events_per_sec(output: &str) -> Option<f64> {
    SYSBENCH_EVENTS
        .captures(output)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Extract MiB/sec from sysbench memory output.
pub fn sysbench_mib_per_sec(output: &str) -> Option<f64> {
    SYSBENCH_MIB.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Extract throughput in MB/s from dd output. dd switches to GB/s on
/// fast devices; those are converted back to MB/s.
pub fn dd_mb_per_sec(output: &str) -> Option<f64> {
    if let Some(caps) = DD_GB.captures(output) {
        return caps.get(1)?.as_str().parse::<f64>().ok().map(|g| g * 1024.0);
    }
    DD_MB.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Extract one numeric value from PassMark's results YAML by key.
pub fn passmark_value(yaml: &str, key: &str) -> Option<f64> {
    let pattern = format!(r"{}:\s*([\d.]+)", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(yaml)?.get(1)?.as_str().parse().ok()
}

/// Extract the PassMark version string from the results YAML.
pub fn passmark_version(yaml: &str) -> Option<String> {
    let caps = PASSMARK_VERSION.captures(yaml)?;
    Some(format!(
        "v{}.{} Build {}",
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3)?.as_str()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sevenzip_avr_line() {
        let output = "\
Dict     Speed Usage    R/U Rating
22:      41216   100   4010   4010
Tot:             100   3952   3952
Avr:     41216   100   4010   4010";
        assert_eq!(sevenzip_mips(output), Some(4010.0));
    }

    #[test]
    fn test_sevenzip_missing_avr() {
        assert_eq!(sevenzip_mips("no benchmark output here"), None);
    }

    #[test]
    fn test_openssl_sha256_16k_column() {
        let output = "\
type             16 bytes     64 bytes    256 bytes   1024 bytes   8192 bytes  16384 bytes
sha256          129649.09k   397808.62k   881999.27k  1322972.84k  1550601.55k  1586473.64k";
        assert_eq!(openssl_speed_16k(output, "sha256"), Some(1586473.64));
    }

    #[test]
    fn test_openssl_aes_16k_column() {
        let output =
            "aes-256-cbc     993091.45k  1066968.49k  1072536.75k  1073770.67k  1074397.18k  1074053.12k";
        assert_eq!(openssl_speed_16k(output, "aes-256-cbc"), Some(1074053.12));
    }

    #[test]
    fn test_openssl_wrong_algorithm_is_none() {
        let output =
            "sha256          129649.09k   397808.62k   881999.27k  1322972.84k  1550601.55k  1586473.64k";
        assert_eq!(openssl_speed_16k(output, "aes-256-cbc"), None);
    }

    #[test]
    fn test_sysbench_events_per_sec() {
        let output = "\
CPU speed:
    events per second:  1234.56

General statistics:
    total time:                          10.0002s";
        assert_eq!(sysbench_events_per_sec(output), Some(1234.56));
    }

    #[test]
    fn test_sysbench_memory_throughput() {
        let output = "10240.00 MiB transferred (5120.33 MiB/sec)";
        assert_eq!(sysbench_mib_per_sec(output), Some(5120.33));
    }

    #[test]
    fn test_dd_mb_per_sec() {
        let output = "1073741824 bytes (1.1 GB, 1.0 GiB) copied, 2.48113 s, 433 MB/s";
        assert_eq!(dd_mb_per_sec(output), Some(433.0));
    }

    #[test]
    fn test_dd_gb_per_sec_converted() {
        let output = "1073741824 bytes (1.1 GB, 1.0 GiB) copied, 0.5 s, 2.1 GB/s";
        assert_eq!(dd_mb_per_sec(output), Some(2.1 * 1024.0));
    }

    #[test]
    fn test_dd_no_rate_is_none() {
        assert_eq!(dd_mb_per_sec("dd: error writing: No space left on device"), None);
    }

    #[test]
    fn test_passmark_values() {
        let yaml = "\
Version:
  Major: 11
  Minor: 0
  Build: 1002
Results:
  SUMM_CPU: 14523.4
  SUMM_ME: 2890.1
  CPU_INTEGER_MATH: 45123.0
  CPU_SINGLETHREAD: 3456.7";
        assert_eq!(passmark_value(yaml, "SUMM_CPU"), Some(14523.4));
        assert_eq!(passmark_value(yaml, "SUMM_ME"), Some(2890.1));
        assert_eq!(passmark_value(yaml, "CPU_SINGLETHREAD"), Some(3456.7));
        assert_eq!(passmark_value(yaml, "CPU_PRIME"), None);
        assert_eq!(
            passmark_version(yaml),
            Some("v11.0 Build 1002".to_string())
        );
    }
}
