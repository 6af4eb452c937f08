//! Benchmark report parsing.
//!
//! A report is plain text: free-form preamble, a header line naming the
//! columns (recognized by containing both `BATCH` and `HQ`), then one
//! whitespace-separated record per configuration:
//!
//! ```text
//! fused-attention-fwd:
//!      BATCH    HQ   HK  N_CTX_Q  N_CTX_K  fwd(TFLOPS)
//! 0      1.0  16.0 16.0   1024.0   1024.0   87.412
//! 1      1.0  16.0 16.0   2048.0   2048.0  131.207
//! ```
//!
//! Only the first seven tokens of a record are used; trailing columns are
//! ignored.

use std::path::Path;

use serde::Serialize;

use crate::error::ReportError;

/// Minimum number of tokens a record must have to be considered.
pub const MIN_TOKENS: usize = 7;

/// One configuration's measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenchmarkRow {
    /// Configuration index.
    pub index: i64,
    /// Batch size.
    #[serde(rename = "BATCH")]
    pub batch: f64,
    /// Query head count.
    #[serde(rename = "HQ")]
    pub hq: f64,
    /// Key/value head count.
    #[serde(rename = "HK")]
    pub hk: f64,
    /// Query context length.
    #[serde(rename = "N_CTX_Q")]
    pub n_ctx_q: f64,
    /// Key context length.
    #[serde(rename = "N_CTX_K")]
    pub n_ctx_k: f64,
    /// Forward-pass throughput.
    #[serde(rename = "fwd_TFLOPS")]
    pub fwd_tflops: f64,
}

/// A record line that had enough tokens but failed numeric conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    /// 1-based line number within the report.
    pub line_no: usize,
    /// The trimmed line text.
    pub text: String,
    /// Which field failed and why.
    pub reason: String,
}

/// Rows parsed from a single report, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkTable {
    /// Accepted rows.
    pub rows: Vec<BenchmarkRow>,
    /// 1-based line number of the column header, if one was found.
    pub header_line: Option<usize>,
    /// Record lines skipped because a field did not parse.
    pub malformed: Vec<MalformedRow>,
}

impl BenchmarkTable {
    /// Number of accepted rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows were accepted.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read and parse the report at `path`.
///
/// # Errors
///
/// Returns [`ReportError::FileNotFound`] if `path` does not exist and
/// [`ReportError::Io`] for any other read failure. Malformed records are
/// not errors; they are collected in [`BenchmarkTable::malformed`].
pub fn parse_report(path: &Path) -> Result<BenchmarkTable, ReportError> {
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReportError::FileNotFound(path.to_path_buf())
        } else {
            ReportError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    Ok(parse_str(&String::from_utf8_lossy(&data)))
}

/// Parse report text already held in memory.
pub fn parse_str(text: &str) -> BenchmarkTable {
    let lines: Vec<&str> = text.lines().collect();

    let header = lines
        .iter()
        .position(|line| line.contains("BATCH") && line.contains("HQ"));
    let data_start = header.map_or(0, |i| i + 1);

    let mut table = BenchmarkTable {
        rows: Vec::new(),
        header_line: header.map(|i| i + 1),
        malformed: Vec::new(),
    };

    for (offset, raw) in lines[data_start..].iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < MIN_TOKENS {
            continue;
        }

        match parse_row(&tokens) {
            Ok(row) => table.rows.push(row),
            Err(reason) => table.malformed.push(MalformedRow {
                line_no: data_start + offset + 1,
                text: line.to_string(),
                reason,
            }),
        }
    }

    table
}

/// Map the positional tokens of one record onto a [`BenchmarkRow`].
fn parse_row(tokens: &[&str]) -> Result<BenchmarkRow, String> {
    let index = tokens[0]
        .parse::<i64>()
        .map_err(|e| format!("index '{}': {e}", tokens[0]))?;

    let field = |pos: usize, name: &str| -> Result<f64, String> {
        let value = tokens[pos]
            .parse::<f64>()
            .map_err(|e| format!("{name} '{}': {e}", tokens[pos]))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{name} '{}': not a finite number", tokens[pos]))
        }
    };

    Ok(BenchmarkRow {
        index,
        batch: field(1, "BATCH")?,
        hq: field(2, "HQ")?,
        hk: field(3, "HK")?,
        n_ctx_q: field(4, "N_CTX_Q")?,
        n_ctx_k: field(5, "N_CTX_K")?,
        fwd_tflops: field(6, "fwd_TFLOPS")?,
    })
}

/// Legend label for a report: its file name without the extension.
///
/// Falls back to the full path text when there is no file name (e.g. `..`).
pub fn report_label(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}
