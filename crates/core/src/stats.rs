// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Descriptive statistics over benchmark samples.
//!
//! This is the numeric heart of the stats aggregator: given the
//! non-null values of one stat group, [`describe`] produces the row
//! that ends up in `benchmark_stats`.
//!
//! Conventions, fixed here so every caller agrees:
//! - standard deviation is the **sample** standard deviation (n - 1
//!   divisor) and is undefined (`None`) below two samples
//! - median of an even-sized set is the mean of the two middle values
//!   after ascending sort
//! - non-finite inputs (NaN, infinities) are discarded before any
//!   computation, the same way nulls are discarded upstream

use serde::{Deserialize, Serialize};

/// Descriptive statistics for one set of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    /// Number of values that contributed (after filtering).
    pub sample_count: u64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (average of two middles for even counts).
    pub median: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Sample standard deviation; `None` when fewer than two samples.
    pub std_dev: Option<f64>,
}

/// Compute descriptive statistics over a slice of samples.
///
/// Returns `None` when no finite values remain after filtering; the
/// aggregator treats that as "group no longer observed".
pub fn describe(values: &[f64]) -> Option<SampleStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let mean = sum / n as f64;

    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let std_dev = if n < 2 {
        None
    } else {
        let sum_sq: f64 = sorted.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((sum_sq / (n - 1) as f64).sqrt())
    };

    Some(SampleStats {
        sample_count: n as u64,
        mean,
        median,
        min: sorted[0],
        max: sorted[n - 1],
        std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input_yields_none() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_single_value() {
        let s = describe(&[42.0]).unwrap();
        assert_eq!(s.sample_count, 1);
        assert_eq!(s.mean, 42.0);
        assert_eq!(s.median, 42.0);
        assert_eq!(s.min, 42.0);
        assert_eq!(s.max, 42.0);
        assert!(s.std_dev.is_none());
    }

    #[test]
    fn test_two_values_ten_twenty() {
        // Two runs with values [10, 20]: count=2, mean=15, median=15,
        // min=10, max=20, sample stddev = sqrt(50).
        let s = describe(&[10.0, 20.0]).unwrap();
        assert_eq!(s.sample_count, 2);
        assert!(close(s.mean, 15.0));
        assert!(close(s.median, 15.0));
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 20.0);
        assert!(close(s.std_dev.unwrap(), 50.0_f64.sqrt()));
    }

    #[test]
    fn test_three_values_skewed() {
        // [1, 2, 100]: median is the middle value, not the mean.
        let s = describe(&[1.0, 2.0, 100.0]).unwrap();
        assert!(close(s.median, 2.0));
        assert!(close(s.mean, 103.0 / 3.0));
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 100.0);
    }

    #[test]
    fn test_median_even_count_averages_middles() {
        let s = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!(close(s.median, 2.5));
    }

    #[test]
    fn test_median_unsorted_input() {
        let s = describe(&[100.0, 1.0, 2.0]).unwrap();
        assert!(close(s.median, 2.0));
    }

    #[test]
    fn test_ordering_invariants() {
        let samples = [3.5, 9.1, 0.2, 4.4, 4.4, 7.0];
        let s = describe(&samples).unwrap();
        assert!(s.min <= s.median && s.median <= s.max);
        assert!(s.min <= s.mean && s.mean <= s.max);
    }

    #[test]
    fn test_non_finite_values_are_discarded() {
        let s = describe(&[f64::NAN, 10.0, f64::INFINITY, 20.0]).unwrap();
        assert_eq!(s.sample_count, 2);
        assert!(close(s.mean, 15.0));
    }

    #[test]
    fn test_all_non_finite_yields_none() {
        assert!(describe(&[f64::NAN, f64::NEG_INFINITY]).is_none());
    }

    #[test]
    fn test_identical_values_zero_stddev() {
        let s = describe(&[5.0, 5.0, 5.0]).unwrap();
        assert!(close(s.std_dev.unwrap(), 0.0));
        assert_eq!(s.median, 5.0);
    }

    #[test]
    fn test_describe_is_deterministic() {
        let samples = [2.0, 7.5, 3.3, 9.9];
        assert_eq!(describe(&samples), describe(&samples));
    }
}
