// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared between the benchmark client and the API.
//!
//! The submission payloads here are the wire contract for
//! `POST /api/v1/benchmarks`: the client serializes them, the API
//! deserializes them. Timestamps are carried as ISO-8601 strings on the
//! wire because old clients sent a mix of `Z` and `+00:00` suffixes;
//! [`parse_timestamp`] normalizes both.
//!
//! # Grouping invariant
//!
//! [`system_type`] is the single normalization point for DMI
//! manufacturer/product pairs. Every consumer (the stats aggregator in
//! particular) must derive `system_type` through this function so that
//! runs from identical hardware land in the same stat group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Firmware placeholder that must never contribute to a system type.
pub const DMI_UNKNOWN: &str = "Unknown";

/// DMI/SMBIOS hardware identification collected by the client.
///
/// All fields are optional; firmware frequently leaves them blank or
/// filled with placeholder strings. Placeholder filtering happens at
/// collection time in the client and again in [`system_type`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmiInfo {
    /// System manufacturer (e.g. "Dell Inc.").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Product name (e.g. "XPS 13 9310").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Product version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Baseboard product name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    /// SoC/chip name (populated on macOS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
}

impl DmiInfo {
    /// Whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.manufacturer.is_none()
            && self.product.is_none()
            && self.version.is_none()
            && self.board.is_none()
            && self.chip.is_none()
    }

    /// Derive the normalized system type for this hardware.
    pub fn system_type(&self) -> Option<String> {
        system_type(self.manufacturer.as_deref(), self.product.as_deref())
    }
}

/// Derive a stat-grouping system type from DMI manufacturer and product.
///
/// Rules (deterministic, so identical hardware always groups together):
/// - both fields are trimmed; empty string and missing are equivalent
/// - the literal placeholder `Unknown` (case-sensitive) counts as missing
/// - both fields must survive filtering, otherwise the result is `None`
/// - the result is `"{manufacturer} {product}"`, single space separator
pub fn system_type(manufacturer: Option<&str>, product: Option<&str>) -> Option<String> {
    let manufacturer = normalize_dmi_field(manufacturer)?;
    let product = normalize_dmi_field(product)?;
    Some(format!("{} {}", manufacturer, product))
}

/// Derive a system type from a loosely structured DMI JSON document.
///
/// The database stores `dmi_info` as JSONB; this accepts whatever shape
/// is in the column and only looks at string-valued `manufacturer` and
/// `product` keys.
pub fn system_type_from_json(dmi: Option<&Value>) -> Option<String> {
    let dmi = dmi?;
    system_type(
        dmi.get("manufacturer").and_then(Value::as_str),
        dmi.get("product").and_then(Value::as_str),
    )
}

fn normalize_dmi_field(field: Option<&str>) -> Option<&str> {
    let trimmed = field?.trim();
    if trimmed.is_empty() || trimmed == DMI_UNKNOWN {
        None
    } else {
        Some(trimmed)
    }
}

/// One measured metric inside a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSubmission {
    /// Test identifier, e.g. `openssl_sha256` or `7zip_4t`.
    pub test_name: String,
    /// Category, e.g. `cpu`, `compression`, `disk`.
    pub test_category: String,
    /// Measured value; `None` when the tool ran but produced no number.
    #[serde(default)]
    pub value: Option<f64>,
    /// Unit of measurement, e.g. `MIPS`, `MB/s`, `seconds`.
    #[serde(default)]
    pub unit: Option<String>,
    /// Raw tool output the value was parsed from.
    #[serde(default)]
    pub raw_output: Option<String>,
    /// Additional structured metrics (per-subtest scores etc.).
    #[serde(default)]
    pub metrics: Option<Value>,
}

/// A complete benchmark run submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSubmission {
    pub hostname: String,
    pub architecture: String,
    #[serde(default)]
    pub cpu_model: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<i32>,
    #[serde(default)]
    pub total_memory_mb: Option<i64>,
    #[serde(default)]
    pub os_info: Option<String>,
    #[serde(default)]
    pub kernel_version: Option<String>,
    /// ISO-8601; parsed leniently, invalid values become `None`.
    #[serde(default)]
    pub benchmark_started_at: Option<String>,
    /// ISO-8601; parsed leniently, invalid values become `None`.
    #[serde(default)]
    pub benchmark_completed_at: Option<String>,
    #[serde(default = "default_benchmark_version")]
    pub benchmark_version: String,
    /// Free-form labels (client version, tool versions, ...).
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub dmi_info: Option<DmiInfo>,
    /// Everything the client printed during the run.
    #[serde(default)]
    pub console_output: Option<String>,
    pub results: Vec<ResultSubmission>,
}

fn default_benchmark_version() -> String {
    "1.0".to_string()
}

impl RunSubmission {
    /// The distinct test names contained in this submission, used to
    /// scope the post-submission stats refresh.
    pub fn distinct_test_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.results.iter().map(|r| r.test_name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Leniently parse an ISO-8601 timestamp from a client.
///
/// Accepts both `Z` and explicit offsets; anything unparseable maps to
/// `None` rather than rejecting the whole submission.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_type_joins_manufacturer_and_product() {
        assert_eq!(
            system_type(Some("Dell"), Some("XPS")),
            Some("Dell XPS".to_string())
        );
    }

    #[test]
    fn test_system_type_trims_fields() {
        assert_eq!(
            system_type(Some("  Dell "), Some(" XPS 13\n")),
            Some("Dell XPS 13".to_string())
        );
    }

    #[test]
    fn test_system_type_rejects_unknown_placeholder() {
        assert_eq!(system_type(Some("Unknown"), Some("XPS")), None);
        assert_eq!(system_type(Some("Dell"), Some("Unknown")), None);
    }

    #[test]
    fn test_system_type_placeholder_match_is_case_sensitive() {
        // "unknown" in lowercase is a real (if odd) vendor string.
        assert_eq!(
            system_type(Some("unknown"), Some("Board")),
            Some("unknown Board".to_string())
        );
    }

    #[test]
    fn test_system_type_empty_equals_missing() {
        assert_eq!(system_type(Some(""), Some("XPS")), None);
        assert_eq!(system_type(Some("   "), Some("XPS")), None);
        assert_eq!(system_type(None, Some("XPS")), None);
        assert_eq!(system_type(Some("Dell"), None), None);
    }

    #[test]
    fn test_system_type_is_deterministic_across_runs() {
        let a = DmiInfo {
            manufacturer: Some("Dell".into()),
            product: Some("XPS".into()),
            ..Default::default()
        };
        let b = DmiInfo {
            manufacturer: Some("Dell".into()),
            product: Some("XPS".into()),
            version: Some("different version".into()),
            ..Default::default()
        };
        assert_eq!(a.system_type(), b.system_type());
    }

    #[test]
    fn test_system_type_from_json() {
        let dmi = json!({"manufacturer": "Raspberry Pi Foundation", "product": "Raspberry Pi 4"});
        assert_eq!(
            system_type_from_json(Some(&dmi)),
            Some("Raspberry Pi Foundation Raspberry Pi 4".to_string())
        );
        assert_eq!(system_type_from_json(None), None);
        assert_eq!(system_type_from_json(Some(&json!({"board": "X570"}))), None);
        // Non-string values are ignored rather than stringified.
        assert_eq!(
            system_type_from_json(Some(&json!({"manufacturer": 1, "product": "X"}))),
            None
        );
    }

    #[test]
    fn test_parse_timestamp_accepts_z_and_offset() {
        let z = parse_timestamp(Some("2025-06-01T12:00:00Z")).unwrap();
        let offset = parse_timestamp(Some("2025-06-01T12:00:00+00:00")).unwrap();
        assert_eq!(z, offset);
    }

    #[test]
    fn test_parse_timestamp_invalid_is_none() {
        assert_eq!(parse_timestamp(Some("not a timestamp")), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn test_submission_deserializes_with_defaults() {
        let payload = json!({
            "hostname": "box",
            "architecture": "x86_64",
            "results": [
                {"test_name": "pi_calculation", "test_category": "cpu", "value": 12.5, "unit": "seconds"}
            ]
        });
        let sub: RunSubmission = serde_json::from_value(payload).unwrap();
        assert_eq!(sub.benchmark_version, "1.0");
        assert!(sub.dmi_info.is_none());
        assert_eq!(sub.results.len(), 1);
    }

    #[test]
    fn test_distinct_test_names_sorted_and_deduped() {
        let sub = RunSubmission {
            hostname: "box".into(),
            architecture: "x86_64".into(),
            cpu_model: None,
            cpu_cores: None,
            total_memory_mb: None,
            os_info: None,
            kernel_version: None,
            benchmark_started_at: None,
            benchmark_completed_at: None,
            benchmark_version: "1.1".into(),
            tags: None,
            notes: None,
            dmi_info: None,
            console_output: None,
            results: vec![
                ResultSubmission {
                    test_name: "b".into(),
                    test_category: "cpu".into(),
                    value: Some(1.0),
                    unit: None,
                    raw_output: None,
                    metrics: None,
                },
                ResultSubmission {
                    test_name: "a".into(),
                    test_category: "cpu".into(),
                    value: Some(2.0),
                    unit: None,
                    raw_output: None,
                    metrics: None,
                },
                ResultSubmission {
                    test_name: "b".into(),
                    test_category: "cpu".into(),
                    value: None,
                    unit: None,
                    raw_output: None,
                    metrics: None,
                },
            ],
        };
        assert_eq!(sub.distinct_test_names(), vec!["a", "b"]);
    }
}
