//! Integration tests for the mha-compare binary.
//!
//! Each test writes fixture reports into its own scratch directory and runs
//! the compiled binary against them. Charts are rendered at a low DPI to
//! keep the tests fast.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

const REPORT_A: &str = "\
fused-attention-fwd-d128-layoutbhsd:
     BATCH    HQ    HK  N_CTX_Q  N_CTX_K  fwd(TFLOPS)
1      1.0  16.0  16.0   1024.0   1024.0    50.0
2      1.0  16.0  16.0   2048.0   2048.0   200.0
3      4.0  48.0   8.0   4096.0   4096.0   150.0
";

const REPORT_B: &str = "\
fused-attention-fwd-d128-layoutbhsd:
     BATCH    HQ    HK  N_CTX_Q  N_CTX_K  fwd(TFLOPS)
1      1.0  16.0  16.0   1024.0   1024.0   100.0
2      1.0  16.0  16.0   2048.0   2048.0   100.0
4      8.0  64.0   8.0   8192.0   8192.0   300.0
";

const FAST_STYLE: &str = "dpi = 40\n";

/// Scratch directory for one test, recreated empty.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mha-compare-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("failed to create scratch directory");
    std::fs::write(dir.join("style.toml"), FAST_STYLE).expect("failed to write style");
    dir
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write fixture");
    path
}

/// Run the binary with the fast style plus `args`.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mha-compare"))
        .arg("--style")
        .arg(dir.join("style.toml"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to execute mha-compare")
}

/// Like [`run`], but kills the process and fails if it outlives `limit`.
fn run_within(dir: &Path, args: &[&str], limit: Duration) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mha-compare"))
        .arg("--style")
        .arg(dir.join("style.toml"))
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn mha-compare");

    let deadline = Instant::now() + limit;
    while child.try_wait().expect("failed to poll mha-compare").is_none() {
        if Instant::now() > deadline {
            let _ = child.kill();
            let _ = child.wait();
            panic!("mha-compare {args:?} did not finish within {limit:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    child.wait_with_output().expect("failed to collect mha-compare output")
}

fn describe(output: &Output) -> String {
    format!(
        "exit={:?}\nstdout:\n{}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn compares_two_reports() {
    let dir = scratch("basic");
    write(&dir, "run_a.txt", REPORT_A);
    write(&dir, "run_b.txt", REPORT_B);

    let output = run(&dir, &["run_a.txt", "run_b.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Loading file 1: run_a.txt"));
    assert!(stdout.contains("Loading file 2: run_b.txt"));
    assert!(stdout.contains("Plot saved as 'chart.png'"));
    assert!(stdout.contains(&"=".repeat(60)));
    assert!(stdout.contains("run_a - Mean: 125.00 TFLOPS"));
    assert!(stdout.contains("run_b - Max: 100.00 TFLOPS"));
    assert!(stdout.contains("Average Speedup (run_b/run_a): 1.250x"));
    assert!(stdout.contains("Best case: 2.000x (config 1)"));
    assert!(stdout.contains("Worst case: 0.500x (config 2)"));

    let png = std::fs::read(dir.join("chart.png")).expect("chart was not written");
    assert_eq!(&png[1..4], b"PNG");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn default_output_name() {
    let dir = scratch("default-output");
    write(&dir, "a.txt", REPORT_A);
    write(&dir, "b.txt", REPORT_B);

    let output = run(&dir, &["a.txt", "b.txt"]);
    assert!(output.status.success(), "{}", describe(&output));
    assert!(dir.join("mha_tflops_comparison.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_exits_with_one() {
    let dir = scratch("missing");
    write(&dir, "a.txt", REPORT_A);

    let output = run(&dir, &["a.txt", "nope.txt", "-o", "chart.png"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("file 'nope.txt' not found"), "{}", describe(&output));
    assert!(!dir.join("chart.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_first_file_stops_before_second() {
    let dir = scratch("missing-first");
    write(&dir, "b.txt", REPORT_B);

    let output = run(&dir, &["nope.txt", "b.txt", "-o", "chart.png"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Loading file 1: nope.txt"));
    assert!(!stdout.contains("Loading file 2"));
    assert!(stderr.contains("file 'nope.txt' not found"), "{}", describe(&output));
    assert!(!dir.join("chart.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn extreme_magnitudes_still_render() {
    let dir = scratch("extreme");
    for (name, value) in [("tiny", "4e-323"), ("huge", "1.75e308")] {
        let a = write(&dir, &format!("{name}_a.txt"), &format!("BATCH HQ\n0 1 1 1 1 1 {value}\n"));
        let b = write(&dir, &format!("{name}_b.txt"), &format!("BATCH HQ\n0 1 1 1 1 1 {value}\n"));
        let png = format!("{name}.png");

        let output = run_within(
            &dir,
            &[a.to_str().unwrap(), b.to_str().unwrap(), "-o", &png],
            Duration::from_secs(60),
        );
        assert!(output.status.success(), "{}", describe(&output));
        assert!(dir.join(&png).exists());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Average Speedup"), "{}", describe(&output));
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn non_finite_rows_are_skipped() {
    let dir = scratch("non-finite");
    write(&dir, "a.txt", "BATCH HQ\n1 1 1 1 1 1 10.0\n2 1 1 1 1 1 inf\n");
    write(&dir, "b.txt", "BATCH HQ\n1 1 1 1 1 1 20.0\n2 1 1 1 1 1 nan\n");

    let output = run(&dir, &["a.txt", "b.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("a.txt:3: skipping malformed row"));
    assert!(stderr.contains("b.txt:3: skipping malformed row"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a - Max: 10.00 TFLOPS"));
    assert!(!stdout.contains("inf TFLOPS"));
    assert!(!stdout.contains("Undefined speedup"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn disjoint_reports_fail_without_chart() {
    let dir = scratch("disjoint");
    write(&dir, "a.txt", "BATCH HQ\n1 1 1 1 1 1 10.0\n");
    write(&dir, "b.txt", "BATCH HQ\n2 1 1 1 1 1 10.0\n");

    let output = run(&dir, &["a.txt", "b.txt", "-o", "chart.png"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no overlapping configuration indices"));
    assert!(!dir.join("chart.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_positional_is_usage_error() {
    let dir = scratch("usage");
    let output = run(&dir, &["only-one.txt"]);
    assert_eq!(output.status.code(), Some(2), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_rows_are_skipped_with_warning() {
    let dir = scratch("malformed");
    write(&dir, "a.txt", "BATCH HQ\n1 1 1 1 1 1 10.0\n2 1 1 1 1 1 n/a\n");
    write(&dir, "b.txt", "BATCH HQ\n1 1 1 1 1 1 20.0\n2 1 1 1 1 1 30.0\n");

    let output = run(&dir, &["a.txt", "b.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: a.txt:3: skipping malformed row"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Best case: 2.000x (config 1)"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_baseline_is_reported_as_undefined() {
    let dir = scratch("zero");
    write(&dir, "a.txt", "BATCH HQ\n1 1 1 1 1 1 0\n2 1 1 1 1 1 10\n");
    write(&dir, "b.txt", "BATCH HQ\n1 1 1 1 1 1 5\n2 1 1 1 1 1 15\n");

    let output = run(&dir, &["a.txt", "b.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Average Speedup (b/a): 1.500x"));
    assert!(stdout.contains("Undefined speedup (zero baseline): 1 config(s)"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn quiet_keeps_only_summary() {
    let dir = scratch("quiet");
    write(&dir, "a.txt", REPORT_A);
    write(&dir, "b.txt", REPORT_B);

    let output = run(&dir, &["-q", "a.txt", "b.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Loading file"));
    assert!(!stdout.contains("Plot saved"));
    assert!(stdout.contains("Summary Statistics:"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_export_and_table() {
    let dir = scratch("json");
    write(&dir, "a.txt", REPORT_A);
    write(&dir, "b.txt", REPORT_B);

    let output = run(
        &dir,
        &["a.txt", "b.txt", "-o", "chart.png", "--json", "out/cmp.json", "--table"],
    );
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config"));
    assert!(stdout.contains("Comparison data saved to 'out/cmp.json'"));

    let json = std::fs::read_to_string(dir.join("out/cmp.json")).expect("JSON was not written");
    assert!(json.contains("\"label1\": \"a\""));
    assert!(json.contains("\"only_left\": 1"));
    assert!(json.contains("\"fwd_TFLOPS_file1\": 200.0"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn self_comparison_is_unit_speedup() {
    let dir = scratch("self");
    write(&dir, "a.txt", REPORT_A);

    let output = run(&dir, &["a.txt", "a.txt", "-o", "chart.png"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Average Speedup (a/a): 1.000x"));
    assert!(stdout.contains("Best case: 1.000x (config 1)"));
    assert!(stdout.contains("Worst case: 1.000x (config 1)"));

    let _ = std::fs::remove_dir_all(&dir);
}
