//! Statement Tracing
//!
//! One log event per executed statement, leveled by outcome:
//! error on failure, warn when slow, info in debug mode, debug otherwise.

use std::time::Duration;

use crate::constants::STATEMENT_SLOW_THRESHOLD_MS;
use crate::context::Context;
use crate::error::StorageError;

/// Log level chosen for a finished statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Failed,
    Slow,
    Verbose,
    Quiet,
}

pub(crate) fn verdict(elapsed: Duration, failed: bool, debug: bool) -> Verdict {
    if failed {
        Verdict::Failed
    } else if elapsed.as_millis() > STATEMENT_SLOW_THRESHOLD_MS {
        Verdict::Slow
    } else if debug {
        Verdict::Verbose
    } else {
        Verdict::Quiet
    }
}

/// Record one executed statement.
pub(crate) fn record(
    ctx: &Context,
    sql: &str,
    elapsed: Duration,
    rows: Option<u64>,
    error: Option<&StorageError>,
    debug: bool,
) {
    let trace_id = ctx.trace_id().unwrap_or_default();
    let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
    let rows = rows.map_or(-1, |r| i64::try_from(r).unwrap_or(i64::MAX));

    match verdict(elapsed, error.is_some(), debug) {
        Verdict::Failed => tracing::error!(
            trace_id,
            elapsed_ms,
            rows,
            sql,
            error = %error.map(ToString::to_string).unwrap_or_default(),
            "statement failed"
        ),
        Verdict::Slow => tracing::warn!(trace_id, elapsed_ms, rows, sql, "slow statement"),
        Verdict::Verbose => tracing::info!(trace_id, elapsed_ms, rows, sql, "statement"),
        Verdict::Quiet => tracing::debug!(trace_id, elapsed_ms, rows, sql, "statement"),
    }
}
