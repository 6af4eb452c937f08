//! Leveled console output.
//!
//! The level is chosen once from `-q` / `-v` and read by the printing macros:
//! - **Quiet**: errors and the summary block
//! - **Normal**: plus progress lines and malformed-row warnings
//! - **Verbose**: plus row counts, join diagnostics, image size, and stage timings

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Console output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet = 0,
    Normal = 1,
    Verbose = 2,
}

impl Verbosity {
    /// Level selected by the `--quiet` / `--verbose` flags.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Set the process-wide output level.
pub fn init(level: Verbosity) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current output level.
pub fn level() -> Verbosity {
    match LEVEL.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Returns `true` if messages at `at` should be printed.
pub fn enabled(at: Verbosity) -> bool {
    level() >= at
}

/// `println!` that only prints in verbose mode.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Verbose) {
            println!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `println!` that is silenced by `--quiet`.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Normal) {
            println!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Warning on stderr, silenced by `--quiet`.
macro_rules! warnln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Normal) {
            eprintln!("Warning: {}", format_args!($($arg)*));
        }
    };
}

pub(crate) use warnln;

/// Stage timer; reports its elapsed time on drop in verbose mode.
///
/// ```ignore
/// let _t = Timer::start("parse run_a");
/// // prints "  parse run_a: 1.2ms" when it goes out of scope
/// ```
pub struct Timer {
    stage: String,
    start: Instant,
}

impl Timer {
    /// Begin timing `stage`.
    pub fn start(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if enabled(Verbosity::Verbose) {
            println!("  {}: {:.1?}", self.stage, self.start.elapsed());
        }
    }
}
