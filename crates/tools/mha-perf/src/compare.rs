//! Joining two reports and computing speedup statistics.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::CompareError;
use crate::report::BenchmarkRow;

/// One configuration present in both reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Configuration index.
    pub index: i64,
    /// Throughput from the first report.
    #[serde(rename = "fwd_TFLOPS_file1")]
    pub fwd_tflops_file1: f64,
    /// Throughput from the second report.
    #[serde(rename = "fwd_TFLOPS_file2")]
    pub fwd_tflops_file2: f64,
    /// `file2 / file1`, or `None` when the baseline is zero or the ratio is
    /// not finite.
    pub speedup: Option<f64>,
}

/// Result of an inner join on configuration index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    /// Matched rows, in the first report's order.
    pub rows: Vec<ComparisonRow>,
    /// Row count of the first report.
    pub left_rows: usize,
    /// Row count of the second report.
    pub right_rows: usize,
    /// Rows of the first report with no partner in the second.
    pub only_left: usize,
    /// Rows of the second report with no partner in the first.
    pub only_right: usize,
}

/// A speedup value together with the configuration it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    /// Speedup ratio.
    pub value: f64,
    /// Configuration index of the row.
    pub index: i64,
}

/// Aggregate speedup over rows whose speedup is defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedupStats {
    /// Arithmetic mean of the defined speedups.
    pub mean: f64,
    /// Largest speedup (first occurrence on ties).
    pub best: Extremum,
    /// Smallest speedup (first occurrence on ties).
    pub worst: Extremum,
}

/// Summary statistics for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Mean throughput of the first report.
    pub mean_file1: f64,
    /// Mean throughput of the second report.
    pub mean_file2: f64,
    /// Maximum throughput of the first report.
    pub max_file1: f64,
    /// Maximum throughput of the second report.
    pub max_file2: f64,
    /// Speedup statistics, absent when no row has a defined speedup.
    pub speedup: Option<SpeedupStats>,
    /// Rows excluded from the speedup statistics.
    pub undefined_speedups: usize,
}

/// Everything written by a JSON export.
#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    /// Legend label of the first report.
    pub label1: &'a str,
    /// Legend label of the second report.
    pub label2: &'a str,
    /// Joined rows and join counts.
    pub comparison: &'a Comparison,
    /// Summary statistics.
    pub summary: &'a SummaryStats,
    /// Malformed lines skipped in the first report.
    pub malformed_file1: usize,
    /// Malformed lines skipped in the second report.
    pub malformed_file2: usize,
}

/// Ratio of `file2` to `file1`, undefined for a zero baseline.
pub fn speedup(file1: f64, file2: f64) -> Option<f64> {
    if file1 == 0.0 {
        return None;
    }
    let ratio = file2 / file1;
    ratio.is_finite().then_some(ratio)
}

/// Inner-join two tables on configuration index.
///
/// Output follows `left`'s order. If `right` repeats an index, its first
/// occurrence is used.
pub fn join(left: &[BenchmarkRow], right: &[BenchmarkRow]) -> Comparison {
    let mut by_index: HashMap<i64, &BenchmarkRow> = HashMap::with_capacity(right.len());
    for row in right {
        by_index.entry(row.index).or_insert(row);
    }

    let mut rows = Vec::with_capacity(left.len().min(right.len()));
    let mut only_left = 0;
    for l in left {
        match by_index.get(&l.index) {
            Some(r) => rows.push(ComparisonRow {
                index: l.index,
                fwd_tflops_file1: l.fwd_tflops,
                fwd_tflops_file2: r.fwd_tflops,
                speedup: speedup(l.fwd_tflops, r.fwd_tflops),
            }),
            None => only_left += 1,
        }
    }

    let left_indices: HashSet<i64> = left.iter().map(|r| r.index).collect();
    let only_right = right
        .iter()
        .filter(|r| !left_indices.contains(&r.index))
        .count();

    Comparison {
        rows,
        left_rows: left.len(),
        right_rows: right.len(),
        only_left,
        only_right,
    }
}

impl Comparison {
    /// Returns `true` if no configuration matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compute summary statistics over the matched rows.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::EmptyJoin`] when there are no matched rows.
    pub fn summary(&self) -> Result<SummaryStats, CompareError> {
        if self.rows.is_empty() {
            return Err(CompareError::EmptyJoin {
                left_rows: self.left_rows,
                right_rows: self.right_rows,
            });
        }

        let file1: Vec<f64> = self.rows.iter().map(|r| r.fwd_tflops_file1).collect();
        let file2: Vec<f64> = self.rows.iter().map(|r| r.fwd_tflops_file2).collect();

        let defined: Vec<Extremum> = self
            .rows
            .iter()
            .filter_map(|r| r.speedup.map(|value| Extremum { value, index: r.index }))
            .collect();

        Ok(SummaryStats {
            mean_file1: mean(&file1),
            mean_file2: mean(&file2),
            max_file1: max(&file1),
            max_file2: max(&file2),
            speedup: speedup_stats(&defined),
            undefined_speedups: self.rows.len() - defined.len(),
        })
    }
}

/// Mean of the non-NaN values.
#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return f64::NAN;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Maximum of the non-NaN values.
fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::max)
}

#[allow(clippy::cast_precision_loss)]
fn speedup_stats(defined: &[Extremum]) -> Option<SpeedupStats> {
    let first = *defined.first()?;

    let mut best = first;
    let mut worst = first;
    let mut sum = 0.0;
    for s in defined {
        sum += s.value;
        if s.value > best.value {
            best = *s;
        }
        if s.value < worst.value {
            worst = *s;
        }
    }

    Some(SpeedupStats {
        mean: sum / defined.len() as f64,
        best,
        worst,
    })
}

/// Write the joined rows and summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns an I/O error if serialization or the write fails.
pub fn save_json(report: &ComparisonReport<'_>, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
}
