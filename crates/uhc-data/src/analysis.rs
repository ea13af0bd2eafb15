//! Analysis pipeline.
//!
//! Per file: read, classify and replay into sessions ([`analyze_file`]).
//! Across files: validate, merge identities and rank ([`build_highscore`]).

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uhc_core::error::Result;
use uhc_core::models::{HighscoreEntry, ServerSession};
use uhc_core::settings::{ParserConfig, SessionPolicy};

use crate::highscore::rank_sessions;
use crate::reader::{ensure_readable, read_events};
use crate::reconstructor::{reconstruct, Reconstruction};
use crate::validator::{validate_session, Rejection};

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything reconstructed from one log file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub path: PathBuf,
    /// Classified events read from the file.
    pub events_read: usize,
    pub reconstruction: Reconstruction,
    /// Wall-clock seconds spent reading and replaying.
    pub elapsed_seconds: f64,
}

impl FileAnalysis {
    pub fn sessions(&self) -> &[ServerSession] {
        &self.reconstruction.sessions
    }
}

/// Position of one session: `file` indexes the analyses, `session` that
/// file's sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    pub file: usize,
    pub session: usize,
}

impl SessionRef {
    pub fn get<'a>(&self, analyses: &'a [FileAnalysis]) -> Option<&'a ServerSession> {
        analyses.get(self.file)?.sessions().get(self.session)
    }
}

/// Metadata produced alongside the highscore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    pub files_analyzed: usize,
    pub events_read: usize,
    pub orphan_events: usize,
    pub sessions_found: usize,
}

/// The ranked table plus the bookkeeping needed to explain it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighscoreReport {
    pub entries: Vec<HighscoreEntry>,
    /// Ids of the sessions that were counted, in input order.
    pub countable_sessions: Vec<String>,
    /// Where each counted session came from, parallel to `countable_sessions`.
    pub counted: Vec<SessionRef>,
    pub rejected: Vec<Rejection>,
    pub metadata: ReportMetadata,
}

impl HighscoreReport {
    /// Number of counted games (countable sessions).
    pub fn games(&self) -> usize {
        self.counted.len()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Read one log file and replay it into sessions.
pub fn analyze_file(path: &Path, policy: &SessionPolicy) -> Result<FileAnalysis> {
    let started = std::time::Instant::now();
    let events = read_events(path)?;
    let events_read = events.len();
    let reconstruction = reconstruct(events, policy);

    info!(
        "{}: {} events, {} sessions, {} orphans",
        path.display(),
        events_read,
        reconstruction.sessions.len(),
        reconstruction.orphan_events
    );

    Ok(FileAnalysis {
        path: path.to_path_buf(),
        events_read,
        reconstruction,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    })
}

/// Validate every session of every file and rank the countable ones.
///
/// Inputs are read-only; the same analyses always produce the same report
/// apart from `metadata.generated_at`.
pub fn build_highscore(analyses: &[FileAnalysis], config: &ParserConfig) -> HighscoreReport {
    let mut counted = Vec::new();
    let mut countable = Vec::new();
    let mut rejected = Vec::new();
    for (file, analysis) in analyses.iter().enumerate() {
        for (index, session) in analysis.sessions().iter().enumerate() {
            match validate_session(session, &config.policy) {
                Ok(()) => {
                    counted.push(SessionRef {
                        file,
                        session: index,
                    });
                    countable.push(session);
                }
                Err(reason) => {
                    debug!(
                        "Session {} of {} rejected: {}",
                        session.id,
                        analysis.path.display(),
                        reason
                    );
                    rejected.push(Rejection {
                        session_id: session.id.clone(),
                        reason,
                    });
                }
            }
        }
    }

    let entries = rank_sessions(&countable, &config.scoring);

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        files_analyzed: analyses.len(),
        events_read: analyses.iter().map(|a| a.events_read).sum(),
        orphan_events: analyses.iter().map(|a| a.reconstruction.orphan_events).sum(),
        sessions_found: analyses.iter().map(|a| a.sessions().len()).sum(),
    };

    info!(
        "{} of {} sessions countable, {} players ranked",
        countable.len(),
        metadata.sessions_found,
        entries.len()
    );

    HighscoreReport {
        entries,
        countable_sessions: countable.iter().map(|s| s.id.clone()).collect(),
        counted,
        rejected,
        metadata,
    }
}

/// Sequential pipeline: check every input, analyze each in order, rank.
pub fn analyze_paths(paths: &[PathBuf], config: &ParserConfig) -> Result<(Vec<FileAnalysis>, HighscoreReport)> {
    ensure_readable(paths)?;
    let analyses = paths
        .iter()
        .map(|p| analyze_file(p, &config.policy))
        .collect::<Result<Vec<_>>>()?;
    let report = build_highscore(&analyses, config);
    Ok((analyses, report))
}

/// Sessions that passed validation, across all analyses, in input order.
pub fn countable_sessions<'a>(
    analyses: &'a [FileAnalysis],
    report: &HighscoreReport,
) -> Vec<&'a ServerSession> {
    report
        .counted
        .iter()
        .filter_map(|r| r.get(analyses))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
