//! Stderr logging for analysis runs, gated on `AnalysisConfig::verbosity`.
//!
//! Nothing is formatted below the configured level. Lines look like
//! `[taskdeps detail] date-mismatch: ...` so a run can be grepped by level.

pub const VERBOSITY_SILENT: u8 = 0;
/// One line per analysis, plus degenerate results.
pub const VERBOSITY_SUMMARY: u8 = 1;
/// Each conflict found and each critical node.
pub const VERBOSITY_DETAIL: u8 = 2;
/// Per-node forward and backward pass values.
pub const VERBOSITY_TRACE: u8 = 3;

/// Tag printed for a level.
pub fn level_name(level: u8) -> &'static str {
    match level {
        VERBOSITY_SILENT => "silent",
        VERBOSITY_SUMMARY => "summary",
        VERBOSITY_DETAIL => "detail",
        _ => "trace",
    }
}

/// Emit at `$level` when `$verbosity` reaches it. Prefer the named macros.
#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:expr, $verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $level {
            eprintln!(
                "[taskdeps {}] {}",
                $crate::logging::level_name($level),
                format_args!($($arg)*)
            );
        }
    };
}

#[macro_export]
macro_rules! log_summary {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_SUMMARY, $verbosity, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_detail {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_DETAIL, $verbosity, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_trace {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_TRACE, $verbosity, $($arg)*)
    };
}
