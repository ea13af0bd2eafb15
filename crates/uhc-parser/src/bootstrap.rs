use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Make sure the `--save` target exists and is a directory.
pub fn ensure_save_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        anyhow::bail!("save target {} is not a directory", dir.display());
    }
    Ok(dir.to_path_buf())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to an [`EnvFilter`] directive.
///
/// Unknown names are passed through so full filter expressions such as
/// `uhc_data=debug` still work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr so stdout only carries the highscore. Falls back to
/// `"warn"` if the directive does not parse.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── ensure_save_dir ───────────────────────────────────────────────────────

    #[test]
    fn test_ensure_save_dir_creates_nested() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("games").join("2015");

        let dir = ensure_save_dir(&target).expect("save dir");
        assert_eq!(dir, target);
        assert!(target.is_dir());
    }

    #[test]
    fn test_ensure_save_dir_rejects_file() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("out.json");
        std::fs::write(&file, "{}").expect("write");

        assert!(ensure_save_dir(&file).is_err());
    }

    // ── filter_directive ──────────────────────────────────────────────────────

    #[test]
    fn test_filter_directive_maps_level_names() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("info"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
    }

    #[test]
    fn test_filter_directive_passes_expressions_through() {
        assert_eq!(filter_directive("uhc_data=trace"), "uhc_data=trace");
    }
}
