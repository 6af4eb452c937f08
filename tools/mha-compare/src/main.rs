//! Compare MHA kernel throughput between two benchmark reports.
//!
//! Pipeline: parse both reports → join on configuration index → render the
//! grouped bar chart → print summary statistics (and optionally a table and
//! a JSON export).

mod cli;
mod verbose;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use mha_perf::chart::BarChart;
use mha_perf::compare::{self, ComparisonReport};
use mha_perf::output;
use mha_perf::report::{self, BenchmarkTable};
use mha_perf::style::ChartStyle;

use verbose::{Timer, Verbosity, dprintln, vprintln, warnln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(Verbosity::from_flags(cli.quiet, cli.verbose));
    run(&cli)
}

fn run(cli: &cli::Cli) -> Result<()> {
    let style = match &cli.style {
        Some(path) => ChartStyle::load(path)
            .with_context(|| format!("loading chart style {}", path.display()))?,
        None => ChartStyle::default(),
    };

    let label1 = report::report_label(&cli.file1);
    let label2 = report::report_label(&cli.file2);

    dprintln!("Loading file 1: {}", cli.file1.display());
    let table1 = load_report(&cli.file1, &label1)?;

    dprintln!("Loading file 2: {}", cli.file2.display());
    let table2 = load_report(&cli.file2, &label2)?;

    let cmp = compare::join(&table1.rows, &table2.rows);
    vprintln!(
        "  Joined {} configurations ({} only in {label1}, {} only in {label2})",
        cmp.rows.len(),
        cmp.only_left,
        cmp.only_right
    );
    let summary = cmp
        .summary()
        .with_context(|| format!("cannot compare '{label1}' with '{label2}'"))?;

    {
        let _t = Timer::start("render");
        let chart = BarChart::from_comparison(&style, &cmp, &label1, &label2);
        let rendered = chart
            .save(&cli.output)
            .with_context(|| format!("writing plot to {}", cli.output.display()))?;
        vprintln!(
            "  {}x{} px at {} DPI, {} bytes, {} annotated configs",
            rendered.width,
            rendered.height,
            style.dpi,
            rendered.bytes,
            chart.annotated().len()
        );
    }
    dprintln!("\nPlot saved as '{}'", cli.output.display());

    if let Some(json_path) = &cli.json {
        let report = ComparisonReport {
            label1: &label1,
            label2: &label2,
            comparison: &cmp,
            summary: &summary,
            malformed_file1: table1.malformed.len(),
            malformed_file2: table2.malformed.len(),
        };
        compare::save_json(&report, json_path)
            .with_context(|| format!("writing JSON to {}", json_path.display()))?;
        dprintln!("Comparison data saved to '{}'", json_path.display());
    }

    if cli.table {
        output::print_table(&cmp, &label1, &label2);
    }
    output::print_summary(&summary, &label1, &label2);

    Ok(())
}

/// Parse one report, surfacing skipped rows as warnings.
fn load_report(path: &Path, label: &str) -> Result<BenchmarkTable> {
    let _t = Timer::start(format!("parse {label}"));
    let table = report::parse_report(path)?;

    match table.header_line {
        Some(line) => vprintln!("  Header found on line {line}"),
        None => vprintln!("  No BATCH/HQ header found; parsing from line 1"),
    }
    for bad in &table.malformed {
        warnln!(
            "{}:{}: skipping malformed row ({})",
            path.display(),
            bad.line_no,
            bad.reason
        );
        vprintln!("    {}", bad.text);
    }
    vprintln!(
        "  {} rows parsed, {} skipped",
        table.len(),
        table.malformed.len()
    );

    Ok(table)
}
