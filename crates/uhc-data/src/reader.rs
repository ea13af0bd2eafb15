//! Log file discovery and loading.
//!
//! Turns the command-line inputs (files or directories) into a sorted list of
//! server logs and reads each one into a stream of classified [`Event`]s.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uhc_core::error::{ParserError, Result};
use uhc_core::models::Event;

use crate::classifier::classify;

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.log` files recursively under `dir`, sorted by path.
pub fn find_log_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Log directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "log")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand the given inputs into concrete log files.
///
/// Files are taken as given (whatever their extension); directories are
/// searched with [`find_log_files`]. A directory without any log contributes
/// nothing. Only [`ensure_readable`] turns bad inputs into errors.
pub fn resolve_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = find_log_files(path);
            if found.is_empty() {
                warn!("No log files found in {}", path.display());
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Fail fast when any input cannot be opened for reading.
pub fn ensure_readable(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        std::fs::File::open(path).map_err(|source| ParserError::FileRead {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Read one log file into its classified events, in file order.
///
/// Lines are decoded lossily, so stray bytes in chat messages never abort a
/// file; lines that are not recognized are dropped.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let file = std::fs::File::open(path).map_err(|source| ParserError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    let mut lines_read = 0u64;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ParserError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        lines_read += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        if let Some(event) = classify(line) {
            events.push(event);
        }
    }

    debug!(
        "File {}: {} lines read, {} events classified",
        path.display(),
        lines_read,
        events.len()
    );

    Ok(events)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use uhc_core::models::EventKind;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_log(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // ── find_log_files ────────────────────────────────────────────────────────

    #[test]
    fn test_find_log_files_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "b.log", &[]);
        write_log(dir.path(), "nested/a.log", &[]);
        write_log(dir.path(), "notes.txt", &[]);

        let files = find_log_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.log"));
        assert!(files[1].ends_with("nested/a.log"));
    }

    #[test]
    fn test_find_log_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(find_log_files(&dir.path().join("nope")).is_empty());
    }

    // ── resolve_inputs / ensure_readable ──────────────────────────────────────

    #[test]
    fn test_resolve_inputs_mixes_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        let single = write_log(dir.path(), "server.txt", &[]);
        let logs = dir.path().join("logs");
        write_log(&logs, "one.log", &[]);
        write_log(&logs, "two.log", &[]);

        let files = resolve_inputs(&[single.clone(), logs]);
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], single);
    }

    #[test]
    fn test_resolve_inputs_empty_dir_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let single = write_log(dir.path(), "server.log", &[]);
        let empty = dir.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();

        assert!(resolve_inputs(&[empty.clone()]).is_empty());
        assert_eq!(resolve_inputs(&[empty, single.clone()]), vec![single]);
    }

    #[test]
    fn test_resolve_inputs_keeps_missing_file_for_readability_check() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.log");
        let files = resolve_inputs(&[missing.clone()]);
        assert_eq!(files, vec![missing]);
        assert!(ensure_readable(&files).is_err());
    }

    #[test]
    fn test_ensure_readable_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.log");
        let err = ensure_readable(&[missing.clone()]).unwrap_err();
        match err {
            ParserError::FileRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // ── read_events ───────────────────────────────────────────────────────────

    #[test]
    fn test_read_events_classifies_known_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "server.log",
            &[
                "2015-05-19 20:28:01 [INFO] Starting minecraft server version 1.8",
                "2015-05-19 20:28:02 [INFO] Preparing level \"world\"",
                "",
                "2015-05-19 20:30:00 [INFO] UUID of player Alice is 0f0e0d0c-0000-0000-0000-000000000001",
                "2015-05-19 21:30:00 [INFO] Stopping server",
            ],
        );

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].kind, EventKind::ServerStart { .. }));
        assert!(matches!(events[1].kind, EventKind::PlayerJoin { .. }));
        assert!(matches!(events[2].kind, EventKind::ServerStop));
    }

    #[test]
    fn test_read_events_tolerates_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.log");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"2015-05-19 20:28:01 [INFO] <Bob> caf\xe9\r\n").unwrap();
        file.write_all(b"2015-05-19 20:28:05 [INFO] Stopping server\r\n")
            .unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].kind, EventKind::ServerStop));
    }

    #[test]
    fn test_read_events_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_events(&dir.path().join("gone.log")).unwrap_err();
        assert!(matches!(err, ParserError::FileRead { .. }));
    }
}
