//! Per-session JSON export for archival.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uhc_core::error::{ParserError, Result};
use uhc_core::models::ServerSession;

/// Write each session to `<dir>/<session id>.json` as pretty JSON.
///
/// Sessions sharing an id (restarts in the same second across files) get a
/// `-2`, `-3`, ... suffix. The directory is created if needed; existing
/// files are overwritten. Returns the written paths in session order.
pub fn export_sessions(dir: &Path, sessions: &[&ServerSession]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| ParserError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(sessions.len());
    let mut seen: BTreeMap<&str, u32> = BTreeMap::new();
    for session in sessions {
        let copies = seen.entry(session.id.as_str()).or_default();
        *copies += 1;
        let stem = if *copies == 1 {
            session.id.clone()
        } else {
            warn!("Session id {} exported {} times", session.id, copies);
            format!("{}-{}", session.id, copies)
        };
        let path = dir.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, json).map_err(|source| ParserError::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote session {} to {}", session.id, path.display());
        written.push(path);
    }
    Ok(written)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
