use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{ParserError, Result};

/// Timestamp prefix written by the server in front of every log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for session ids and per-session export file names.
pub const SESSION_STEM_FORMAT: &str = "%Y-%m-%d_%H%M%S";

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD HH:MM:SS` log timestamp.
///
/// Server logs carry local wall-clock time without an offset, so the result
/// is a naive datetime.
pub fn parse_log_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), LOG_TIMESTAMP_FORMAT)
        .map_err(|_| ParserError::TimestampParse(s.to_string()))
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Session id / export file stem, e.g. `2015-05-19_202801`.
pub fn session_file_stem(ts: NaiveDateTime) -> String {
    ts.format(SESSION_STEM_FORMAT).to_string()
}

/// Whole minutes in `delta`, truncated toward zero.
pub fn whole_minutes(delta: TimeDelta) -> i64 {
    delta.num_minutes()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
