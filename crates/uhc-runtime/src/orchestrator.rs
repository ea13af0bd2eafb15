//! Concurrent parse orchestrator.
//!
//! Every input file is replayed on its own blocking task; files share no
//! state, so the only synchronization point is the final merge that
//! validates, merges identities and ranks once all files are done.

use std::path::PathBuf;
use std::sync::Arc;

use uhc_core::error::{ParserError, Result};
use uhc_core::models::ServerSession;
use uhc_core::settings::ParserConfig;
use uhc_data::analysis::{analyze_file, build_highscore, countable_sessions, FileAnalysis, HighscoreReport};
use uhc_data::reader::ensure_readable;

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of one `parse` run.
#[derive(Debug, Clone)]
pub struct ParseRun {
    /// Per-file reconstructions, in input order.
    pub analyses: Vec<FileAnalysis>,
    pub report: HighscoreReport,
}

impl ParseRun {
    /// Sessions that made it into the highscore, in input order.
    pub fn countable_sessions(&self) -> Vec<&ServerSession> {
        countable_sessions(&self.analyses, &self.report)
    }
}

// ── ParseOrchestrator ─────────────────────────────────────────────────────────

/// Fans reconstruction out over files and merges the results.
pub struct ParseOrchestrator {
    config: Arc<ParserConfig>,
}

impl ParseOrchestrator {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Analyze `paths` and build the highscore.
    ///
    /// Every file is checked for readability before any parsing starts; one
    /// unreadable file fails the whole run.
    pub async fn run(&self, paths: &[PathBuf]) -> Result<ParseRun> {
        ensure_readable(paths)?;

        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| {
                let config = Arc::clone(&self.config);
                tokio::task::spawn_blocking(move || analyze_file(&path, &config.policy))
            })
            .collect();

        // Awaiting in spawn order keeps the analyses in input order.
        let mut analyses = Vec::with_capacity(handles.len());
        for handle in handles {
            let analysis = handle
                .await
                .map_err(|e| ParserError::Other(anyhow_join_error(e)))??;
            analyses.push(analysis);
        }

        tracing::debug!("Reconstructed {} files, merging", analyses.len());
        let report = build_highscore(&analyses, &self.config);
        Ok(ParseRun { analyses, report })
    }
}

/// Analyze `paths` with `config` on the current tokio runtime.
pub async fn analyze_files(paths: &[PathBuf], config: &ParserConfig) -> Result<ParseRun> {
    ParseOrchestrator::new(config.clone()).run(paths).await
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn anyhow_join_error(e: tokio::task::JoinError) -> anyhow::Error {
    anyhow::anyhow!("file analysis task failed: {e}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
