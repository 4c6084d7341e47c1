// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pure grouping core of the stats aggregator.
//!
//! [`build_groups`] turns the raw (result, run) join rows into one
//! [`GroupStats`] per distinct (cpu_model, architecture, system_type,
//! test_name) key. It is deterministic and free of I/O, which is where
//! the aggregator's idempotence guarantee comes from: the database side
//! in [`crate::stats`] only reads rows, upserts the groups produced
//! here and sweeps what is no longer produced.
//!
//! Rows must arrive in submission order; `test_category` and `unit`
//! are carried from the latest contributing result of each group.

use std::collections::BTreeMap;

use benchcom_core::model::system_type_from_json;
use benchcom_core::stats::{describe, SampleStats};
use serde_json::Value;
use sqlx::FromRow;

/// One row of the results-joined-with-runs read, in submission order.
#[derive(Debug, Clone, FromRow)]
pub struct SourceRow {
    pub test_name: String,
    pub test_category: String,
    pub unit: Option<String>,
    pub value: f64,
    pub cpu_model: Option<String>,
    pub architecture: String,
    pub dmi_info: Option<Value>,
}

/// The stat group key. Null cpu_model and null system_type are valid
/// keys, not discarded rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub cpu_model: Option<String>,
    pub architecture: String,
    pub system_type: Option<String>,
    pub test_name: String,
}

/// Aggregated statistics for one group, ready to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: GroupKey,
    pub test_category: String,
    pub unit: Option<String>,
    pub stats: SampleStats,
}

struct GroupAcc {
    values: Vec<f64>,
    test_category: String,
    unit: Option<String>,
}

/// Group source rows and compute per-group statistics.
///
/// Groups whose values are all non-finite produce no output row; the
/// caller's stale sweep then removes any previously stored row for
/// that key.
pub fn build_groups(rows: impl IntoIterator<Item = SourceRow>) -> Vec<GroupStats> {
    let mut groups: BTreeMap<GroupKey, GroupAcc> = BTreeMap::new();

    for row in rows {
        let key = GroupKey {
            cpu_model: row.cpu_model,
            architecture: row.architecture,
            system_type: system_type_from_json(row.dmi_info.as_ref()),
            test_name: row.test_name,
        };
        let acc = groups.entry(key).or_insert_with(|| GroupAcc {
            values: Vec::new(),
            test_category: row.test_category.clone(),
            unit: row.unit.clone(),
        });
        acc.values.push(row.value);
        // Latest contributing result wins for the descriptive columns.
        acc.test_category = row.test_category;
        acc.unit = row.unit;
    }

    groups
        .into_iter()
        .filter_map(|(key, acc)| {
            describe(&acc.values).map(|stats| GroupStats {
                key,
                test_category: acc.test_category,
                unit: acc.unit,
                stats,
            })
        })
        .collect()
}
