//! Terminal output formatting for comparison results.

use std::fmt::Write;

use crate::compare::{Comparison, SummaryStats};

/// Width of the `=` separator lines around the summary.
const RULE_WIDTH: usize = 60;

/// Render the summary statistics block.
pub fn format_summary(stats: &SummaryStats, label1: &str, label2: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    // `write!` into a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Summary Statistics:");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{label1} - Mean: {:.2} TFLOPS", stats.mean_file1);
    let _ = writeln!(out, "{label2} - Mean: {:.2} TFLOPS", stats.mean_file2);
    let _ = writeln!(out);
    let _ = writeln!(out, "{label1} - Max: {:.2} TFLOPS", stats.max_file1);
    let _ = writeln!(out, "{label2} - Max: {:.2} TFLOPS", stats.max_file2);
    let _ = writeln!(out);

    match &stats.speedup {
        Some(s) => {
            let _ = writeln!(out, "Average Speedup ({label2}/{label1}): {:.3}x", s.mean);
            let _ = writeln!(out, "Best case: {:.3}x (config {})", s.best.value, s.best.index);
            let _ = writeln!(
                out,
                "Worst case: {:.3}x (config {})",
                s.worst.value, s.worst.index
            );
        }
        None => {
            let _ = writeln!(out, "Average Speedup ({label2}/{label1}): n/a");
            let _ = writeln!(out, "Best case: n/a");
            let _ = writeln!(out, "Worst case: n/a");
        }
    }
    if stats.undefined_speedups > 0 {
        let _ = writeln!(
            out,
            "Undefined speedup (zero baseline): {} config(s)",
            stats.undefined_speedups
        );
    }
    let _ = writeln!(out, "{rule}");

    out
}

/// Print the summary statistics block.
pub fn print_summary(stats: &SummaryStats, label1: &str, label2: &str) {
    println!();
    print!("{}", format_summary(stats, label1, label2));
}

/// Render the per-configuration comparison table.
pub fn format_table(cmp: &Comparison, label1: &str, label2: &str) -> String {
    let w1 = label1.len().max(10);
    let w2 = label2.len().max(10);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:>8}  {:>w1$}  {:>w2$}  {:>9}",
        "Config", label1, label2, "Speedup"
    );
    let _ = writeln!(out, "  {:->8}  {:->w1$}  {:->w2$}  {:->9}", "", "", "", "");

    for row in &cmp.rows {
        let speedup = row
            .speedup
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:.3}x"));
        let _ = writeln!(
            out,
            "  {:>8}  {:>w1$.2}  {:>w2$.2}  {:>9}",
            row.index, row.fwd_tflops_file1, row.fwd_tflops_file2, speedup
        );
    }

    out
}

/// Print the per-configuration comparison table.
pub fn print_table(cmp: &Comparison, label1: &str, label2: &str) {
    if cmp.rows.is_empty() {
        println!("  No matched configurations to display.");
        return;
    }
    println!();
    print!("{}", format_table(cmp, label1, label2));
}
