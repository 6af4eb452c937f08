//! Throughput analysis for multi-head-attention benchmark reports.
//!
//! Parses the whitespace-delimited tables emitted by the MHA kernel
//! benchmarks, joins two runs by configuration index, computes speedup
//! statistics, and renders a grouped bar chart to PNG.
//!
//! Pipeline: [`report::parse_report`] → [`compare::join`] →
//! [`compare::Comparison::summary`] → [`chart::BarChart`] /
//! [`output::print_summary`].

pub mod chart;
pub mod compare;
pub mod error;
pub mod output;
pub mod report;
pub mod style;
