use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ParserError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Reconstruct UHC matches from Minecraft server logs and rank the players
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uhc-parser",
    about = "Reconstruct UHC matches from Minecraft server logs and rank the players",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse server logs and print the highscore
    Parse(ParseArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Log files, or directories to scan for `.log` files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Turn on debugging
    #[arg(long)]
    pub debug: bool,

    /// Save every countable session as JSON into this directory
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Config file (defaults to ~/.uhc-parser/config.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format for the highscore
    #[arg(long, default_value = "json", value_parser = ["json", "table"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Minutes after a crash within which a restart resumes the same session
    #[arg(long)]
    pub crash_grace_minutes: Option<i64>,

    /// Minimum session length in minutes for the session to be counted
    #[arg(long)]
    pub min_session_minutes: Option<i64>,
}

impl Settings {
    /// Parse the process arguments and apply the `--debug` flag.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    fn resolve(mut settings: Settings) -> Settings {
        let Command::Parse(args) = &mut settings.command;
        // --debug overrides log level.
        if args.debug {
            args.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── ScoreWeights ───────────────────────────────────────────────────────────────

/// Points awarded per counter in the highscore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    /// Per decided match survived on the winning team.
    pub winner: i64,
    /// Per decided match won by the team after the player died.
    pub dead_winner: i64,
    pub kill: i64,
    pub death: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            winner: 3,
            dead_winner: 2,
            kill: 1,
            death: 0,
        }
    }
}

impl ScoreWeights {
    pub fn score(&self, wins: u32, dead_wins: u32, kills: u32, deaths: u32) -> i64 {
        i64::from(wins) * self.winner
            + i64::from(dead_wins) * self.dead_winner
            + i64::from(kills) * self.kill
            + i64::from(deaths) * self.death
    }
}

// ── SessionPolicy ──────────────────────────────────────────────────────────────

/// Thresholds used by the reconstructor and the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionPolicy {
    /// A restart within this many minutes of a crash resumes the crashed session.
    pub crash_grace_minutes: i64,
    /// Sessions shorter than this are never counted.
    pub min_session_minutes: i64,
    /// Matches drafting fewer players are aborted on the spot.
    pub min_match_players: usize,
    /// Game mode that puts a player on the match roster (case-insensitive).
    pub active_mode: String,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            crash_grace_minutes: 10,
            min_session_minutes: 30,
            min_match_players: 3,
            active_mode: "Survival".to_string(),
        }
    }
}

/// Largest minute count a [`TimeDelta`] can hold.
pub const MAX_POLICY_MINUTES: i64 = i64::MAX / 60_000;

impl SessionPolicy {
    /// Saturates at [`TimeDelta::MAX`] for values past [`MAX_POLICY_MINUTES`].
    pub fn crash_grace(&self) -> TimeDelta {
        minutes_saturating(self.crash_grace_minutes)
    }

    pub fn min_session(&self) -> TimeDelta {
        minutes_saturating(self.min_session_minutes)
    }

    pub fn is_active_mode(&self, mode: &str) -> bool {
        mode.eq_ignore_ascii_case(&self.active_mode)
    }
}

fn minutes_saturating(minutes: i64) -> TimeDelta {
    TimeDelta::try_minutes(minutes).unwrap_or(if minutes < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

// ── ParserConfig ───────────────────────────────────────────────────────────────

/// Configuration file contents, `~/.uhc-parser/config.json` by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub scoring: ScoreWeights,
    pub policy: SessionPolicy,
}

impl ParserConfig {
    /// Default location of the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".uhc-parser").join("config.json")
    }

    /// Load a config file. Absent keys fall back to their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ParserError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ParserError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the effective config for a `parse` run.
    ///
    /// An explicit `--config` must exist; the default location is optional.
    /// CLI policy flags always win over the file.
    pub fn resolve(args: &ParseArgs) -> Result<Self> {
        Self::resolve_with_default(args, &Self::config_path())
    }

    /// [`ParserConfig::resolve`] with an explicit default path.
    pub fn resolve_with_default(args: &ParseArgs, default_path: &Path) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load_from(path)?,
            None if default_path.exists() => Self::load_from(default_path)?,
            None => Self::default(),
        };

        if let Some(minutes) = args.crash_grace_minutes {
            config.policy.crash_grace_minutes = minutes;
        }
        if let Some(minutes) = args.min_session_minutes {
            config.policy.min_session_minutes = minutes;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, minutes) in [
            ("crash_grace_minutes", self.policy.crash_grace_minutes),
            ("min_session_minutes", self.policy.min_session_minutes),
        ] {
            if minutes < 0 {
                return Err(ParserError::Config(format!("{name} must not be negative")));
            }
            if minutes > MAX_POLICY_MINUTES {
                return Err(ParserError::Config(format!(
                    "{name} must not exceed {MAX_POLICY_MINUTES}"
                )));
            }
        }
        if self.policy.active_mode.trim().is_empty() {
            return Err(ParserError::Config("active_mode must not be empty".to_string()));
        }
        Ok(())
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ParserError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
