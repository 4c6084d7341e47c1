// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! System and hardware information collection.
//!
//! Linux-first: /proc and /sys are the primary sources, with a
//! dmidecode fallback for DMI fields and a device-tree fallback for ARM
//! boards that have no DMI tables at all. macOS gets a reduced set via
//! `system_profiler`.

use std::time::Duration;

use benchcom_core::model::DmiInfo;

use crate::runner::Runner;

/// Firmware values that carry no information and must not be recorded.
const DMI_PLACEHOLDERS: &[&str] = &["To Be Filled By O.E.M.", "Default string"];

/// Everything we know about the machine, ready for submission.
#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub hostname: String,
    pub architecture: String,
    pub cpu_model: Option<String>,
    pub cpu_cores: i32,
    pub total_memory_mb: Option<i64>,
    pub os_info: Option<String>,
    pub kernel_version: Option<String>,
    pub dmi_info: Option<DmiInfo>,
}

/// Best-effort hostname.
pub fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Collect system information for this machine.
pub async fn collect(runner: &Runner) -> SystemInfo {
    let (arch_out, _) = runner
        .run_command("uname", &["-m"], Duration::from_secs(10))
        .await;
    let architecture = arch_out.trim().to_string();
    let architecture = if architecture.is_empty() {
        std::env::consts::ARCH.to_string()
    } else {
        architecture
    };

    let cpu_model = std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|s| parse_cpu_model(&s));

    let total_memory_mb = std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|s| parse_mem_total_mb(&s));

    let kernel_version = std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty());

    let pretty_name = std::fs::read_to_string("/etc/os-release")
        .ok()
        .and_then(|s| parse_os_pretty_name(&s));
    let os_info = match (&pretty_name, &kernel_version) {
        (Some(name), Some(kernel)) => Some(format!("{} {} {}", name, kernel, architecture)),
        (Some(name), None) => Some(name.clone()),
        (None, Some(kernel)) => Some(format!("{} {}", kernel, architecture)),
        (None, None) => None,
    };

    SystemInfo {
        hostname: runner.hostname.clone(),
        architecture,
        cpu_model,
        cpu_cores: runner.cores as i32,
        total_memory_mb,
        os_info,
        kernel_version,
        dmi_info: collect_dmi(runner).await,
    }
}

/// Extract the CPU model from /proc/cpuinfo. x86 uses `model name`; many
/// ARM kernels expose `Hardware` instead.
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    for line in cpuinfo.lines() {
        if line.starts_with("model name") || line.starts_with("Hardware") {
            if let Some((_, value)) = line.split_once(':') {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Extract MemTotal in MB from /proc/meminfo (the kernel reports kB).
pub fn parse_mem_total_mb(meminfo: &str) -> Option<i64> {
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kb: i64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb / 1024);
        }
    }
    None
}

/// Extract PRETTY_NAME from /etc/os-release.
pub fn parse_os_pretty_name(os_release: &str) -> Option<String> {
    for line in os_release.lines() {
        if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Filter one raw DMI field value: trim, drop empties and placeholders.
pub fn filter_dmi_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || DMI_PLACEHOLDERS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Collect DMI/SMBIOS hardware identification.
#[cfg(not(target_os = "macos"))]
pub async fn collect_dmi(runner: &Runner) -> Option<DmiInfo> {
    let mut dmi = read_sys_dmi();

    // dmidecode sees fields /sys hides, but usually needs root.
    if dmi.is_empty() {
        dmi = dmidecode_dmi(runner).await;
    }

    // ARM boards without DMI tables expose a device-tree model string.
    if dmi.is_empty() {
        if let Ok(model) = std::fs::read_to_string("/proc/device-tree/model") {
            let model = model.trim_end_matches('\0').trim();
            if !model.is_empty() {
                dmi.product = Some(model.to_string());
            }
        }
    }

    if dmi.is_empty() {
        None
    } else {
        Some(dmi)
    }
}

#[cfg(not(target_os = "macos"))]
fn read_sys_dmi() -> DmiInfo {
    let read = |path: &str| {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| filter_dmi_value(&s))
    };
    DmiInfo {
        manufacturer: read("/sys/class/dmi/id/sys_vendor"),
        product: read("/sys/class/dmi/id/product_name"),
        version: read("/sys/class/dmi/id/product_version"),
        board: read("/sys/class/dmi/id/board_name"),
        chip: None,
    }
}

#[cfg(not(target_os = "macos"))]
async fn dmidecode_dmi(runner: &Runner) -> DmiInfo {
    if !runner.check_command("dmidecode").await {
        return DmiInfo::default();
    }

    let field = |output: (String, Option<i32>)| -> Option<String> {
        let (text, code) = output;
        if code != Some(0) || text.contains("Permission denied") {
            return None;
        }
        filter_dmi_value(&text)
    };

    let timeout = Duration::from_secs(10);
    DmiInfo {
        manufacturer: field(
            runner
                .run_command("dmidecode", &["-s", "system-manufacturer"], timeout)
                .await,
        ),
        product: field(
            runner
                .run_command("dmidecode", &["-s", "system-product-name"], timeout)
                .await,
        ),
        version: field(
            runner
                .run_command("dmidecode", &["-s", "system-version"], timeout)
                .await,
        ),
        board: field(
            runner
                .run_command("dmidecode", &["-s", "baseboard-product-name"], timeout)
                .await,
        ),
        chip: None,
    }
}

/// Collect hardware identification on macOS via system_profiler.
#[cfg(target_os = "macos")]
pub async fn collect_dmi(runner: &Runner) -> Option<DmiInfo> {
    let (output, code) = runner
        .run_command(
            "system_profiler",
            &["SPHardwareDataType"],
            Duration::from_secs(30),
        )
        .await;
    if code != Some(0) || output.is_empty() {
        return None;
    }

    let mut dmi = DmiInfo {
        manufacturer: Some("Apple".to_string()),
        ..Default::default()
    };
    for line in output.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("Model Name:") {
            dmi.product = filter_dmi_value(value);
        } else if let Some(value) = line.strip_prefix("Model Identifier:") {
            dmi.version = filter_dmi_value(value);
        } else if let Some(value) = line.strip_prefix("Chip:") {
            dmi.chip = filter_dmi_value(value);
        }
    }
    Some(dmi)
}
