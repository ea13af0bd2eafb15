mod bootstrap;

use anyhow::Result;
use uhc_core::formatting::{format_highscore_table, format_time};
use uhc_core::settings::{Command, ParserConfig, Settings};
use uhc_core::time_utils::whole_minutes;
use uhc_data::analysis::HighscoreReport;
use uhc_data::reader::resolve_inputs;
use uhc_runtime::exporter::export_sessions;
use uhc_runtime::orchestrator::analyze_files;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    let Command::Parse(args) = settings.command;

    bootstrap::setup_logging(&args.log_level)?;
    tracing::info!("UHC parser v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ParserConfig::resolve(&args)?;
    tracing::debug!(
        "Policy: crash grace {}m, min session {}m, min match players {}",
        config.policy.crash_grace_minutes,
        config.policy.min_session_minutes,
        config.policy.min_match_players
    );

    let paths = resolve_inputs(&args.paths);
    let run = analyze_files(&paths, &config).await?;

    let countable = run.countable_sessions();
    for session in &countable {
        let length = session.duration().map(whole_minutes).unwrap_or(0);
        tracing::info!(
            "Counted session {}: {}, {} decided matches",
            session.id,
            format_time(length),
            session.decided_matches().count()
        );
    }
    for rejection in &run.report.rejected {
        tracing::info!("Skipped session {}: {}", rejection.session_id, rejection.reason);
    }

    if let Some(dir) = &args.save {
        let dir = bootstrap::ensure_save_dir(dir)?;
        let written = export_sessions(&dir, &countable)?;
        tracing::info!("Saved {} sessions to {}", written.len(), dir.display());
    }

    print_report(&run.report, &args.format)?;

    tracing::debug!("Done");
    Ok(())
}

/// Write the game count and the ranked table to stdout.
fn print_report(report: &HighscoreReport, format: &str) -> Result<()> {
    println!("Games: {}", report.games());
    match format {
        "table" => print!("{}", format_highscore_table(&report.entries)),
        _ => println!("{}", serde_json::to_string_pretty(&report.entries)?),
    }
    Ok(())
}
