//! Error types for report loading, comparison, and chart styling.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading a benchmark report.
#[derive(Debug)]
pub enum ReportError {
    /// The report path does not exist.
    FileNotFound(PathBuf),
    /// The report exists but could not be read.
    Io {
        /// Path of the report being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "file '{}' not found", path.display()),
            Self::Io { path, source } => write!(f, "reading '{}': {source}", path.display()),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::FileNotFound(_) => None,
        }
    }
}

/// Errors that can occur while joining two reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// The two reports share no configuration index.
    EmptyJoin {
        /// Rows in the first report.
        left_rows: usize,
        /// Rows in the second report.
        right_rows: usize,
    },
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyJoin {
                left_rows,
                right_rows,
            } => write!(
                f,
                "no overlapping configuration indices ({left_rows} rows vs {right_rows} rows)"
            ),
        }
    }
}

impl std::error::Error for CompareError {}

/// Errors that can occur while loading a chart style file.
#[derive(Debug)]
pub enum StyleError {
    /// I/O error reading the style file.
    Io(io::Error),
    /// The style file is not valid TOML for [`crate::style::ChartStyle`].
    Parse(toml::de::Error),
    /// A color is not of the form `#rrggbb`.
    InvalidColor(String),
    /// A style value is out of range.
    Invalid(String),
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "style I/O error: {e}"),
            Self::Parse(e) => write!(f, "style parse error: {e}"),
            Self::InvalidColor(s) => write!(f, "invalid color '{s}' (expected #rrggbb)"),
            Self::Invalid(msg) => write!(f, "invalid style: {msg}"),
        }
    }
}

impl std::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StyleError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for StyleError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}
