//! Line classification for Minecraft server logs.
//!
//! [`classify`] turns one raw log line into a typed [`Event`], or `None` when
//! the line is not interesting. It is stateless and never fails.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;
use uhc_core::models::{DeathCause, Event, EventKind};
use uhc_core::time_utils::parse_log_timestamp;

// ── Pattern table ─────────────────────────────────────────────────────────────

/// A player name, optionally wrapped in a colour code (`§c…§r`). Lossy
/// decoding of the log turns `§` into `?`, so both are accepted.
const NAME: &str = r"(?:[§?][0-9a-fk-or])?(\w+)(?:[§?]r)?";

/// `[timestamp] [LEVEL] body`, both prefixes optional.
static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s+)?(?:\[([A-Z]+)\]:?\s*)?(.*?)\s*$")
        .expect("prefix regex is valid")
});

type Builder = fn(&Captures<'_>) -> Option<EventKind>;

struct Pattern {
    regex: Regex,
    build: Builder,
}

fn pattern(template: &str, build: Builder) -> Pattern {
    Pattern {
        regex: Regex::new(&template.replace("{name}", NAME)).expect("classifier regex is valid"),
        build,
    }
}

/// Checked in order; the first match wins, so longer phrasings come first.
static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        // Deaths with an attacker.
        pattern(r"^{name} was slain by {name}", |c| kill(c, DeathCause::Slain)),
        pattern(r"^{name} was shot by {name}", |c| kill(c, DeathCause::Shot)),
        pattern(r"^{name} was blown up by {name}", |c| kill(c, DeathCause::BlownUp)),
        pattern(r"^{name} was burnt to a crisp whilst fighting {name}", |c| {
            kill(c, DeathCause::BurnedFighting)
        }),
        pattern(r"^{name} tried to swim in lava to escape {name}", |c| {
            kill(c, DeathCause::LavaEscape)
        }),
        // Deaths without an attacker.
        pattern(r"^{name} blew up", |c| death(c, DeathCause::BlewUp)),
        pattern(r"^{name} suffocated in a wall", |c| death(c, DeathCause::Suffocated)),
        pattern(r"^{name} fell from a high place", |c| death(c, DeathCause::Fell)),
        pattern(r"^{name} burned to death", |c| death(c, DeathCause::Burned)),
        pattern(r"^{name} drowned", |c| death(c, DeathCause::Drowned)),
        pattern(r"^{name} tried to swim in lava", |c| death(c, DeathCause::Lava)),
        pattern(r"^{name} hit the ground too hard", |c| death(c, DeathCause::HitGround)),
        // Match start.
        pattern(
            r"^Shrinking world border to (\d+(?:\.\d+)?) blocks wide \(down from (\d+(?:\.\d+)?) blocks\) over (\d+) seconds",
            border_shrink,
        ),
        // Game modes: operator echo, self-change, console.
        pattern(r"^\[\w+: Set {name}'s game mode to (\w+) Mode\]", mode_change),
        pattern(r"^\[{name}: Set own game mode to (\w+) Mode\]", mode_change),
        pattern(r"^Set {name}'s game mode to (\w+) Mode", mode_change),
        // Players.
        pattern(r"^UUID of player (\w+) is ([0-9A-Fa-f-]+)", |c| {
            Some(EventKind::PlayerJoin {
                player: group(c, 1)?,
                uuid: group(c, 2)?.to_lowercase(),
            })
        }),
        pattern(r"^(\w+)\[/(.+):\d+\] logged in", |c| {
            Some(EventKind::PlayerIp {
                player: group(c, 1)?,
                ip: group(c, 2)?,
            })
        }),
        // Teams.
        pattern(r"^Set option color for team (\w+) to (\w+)", |c| {
            Some(EventKind::TeamColor {
                team: group(c, 1)?,
                color: group(c, 2)?,
            })
        }),
        pattern(r"^\[\w+: Added \d+ player\(s\) to team (\w+): (.*)\]$", team_members),
        pattern(r"^(?:Added|Could not add) \d+ player\(s\) to team (\w+): (.*)$", team_members),
        // Server lifecycle.
        pattern(r"^Starting minecraft server version (.+)$", |c| {
            Some(EventKind::ServerStart {
                version: group(c, 1)?,
            })
        }),
        pattern(r"^(?:\[\w+: )?Stopping (?:the )?server", |_| Some(EventKind::ServerStop)),
        pattern(r"^This crash report has been saved to:", |_| {
            Some(EventKind::ServerCrash)
        }),
    ]
});

// ── Public API ────────────────────────────────────────────────────────────────

/// Classify one raw log line.
///
/// Lines that match no pattern, or whose timestamp prefix is not a valid
/// date, yield `None`.
pub fn classify(line: &str) -> Option<Event> {
    let (timestamp, body) = split_prefix(line)?;
    if body.is_empty() {
        return None;
    }

    let kind = PATTERNS
        .iter()
        .find_map(|p| p.regex.captures(body).and_then(|c| (p.build)(&c)))?;

    let timestamp = match timestamp {
        Some(raw) => match parse_log_timestamp(raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                debug!("Skipping line with bad timestamp: {}", e);
                return None;
            }
        },
        None => None,
    };

    Some(Event { timestamp, kind })
}

/// Split a line into its raw timestamp text (if any) and message body.
/// The level tag is discarded.
pub fn split_prefix(line: &str) -> Option<(Option<&str>, &str)> {
    let caps = PREFIX.captures(line)?;
    let timestamp = caps.get(1).map(|m| m.as_str());
    let body = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    Some((timestamp, body))
}

/// Split a team member list such as `Alice, Bob and Carol`.
pub fn split_members(list: &str) -> Vec<String> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .map(strip_color_codes)
        .filter(|name| !name.is_empty() && name != "and")
        .collect()
}

// ── Builders ──────────────────────────────────────────────────────────────────

fn group(c: &Captures<'_>, i: usize) -> Option<String> {
    c.get(i).map(|m| m.as_str().to_string())
}

fn death(c: &Captures<'_>, cause: DeathCause) -> Option<EventKind> {
    Some(EventKind::Death {
        player: group(c, 1)?,
        cause,
    })
}

fn kill(c: &Captures<'_>, cause: DeathCause) -> Option<EventKind> {
    Some(EventKind::Kill {
        player: group(c, 1)?,
        killer: group(c, 2)?,
        cause,
    })
}

fn mode_change(c: &Captures<'_>) -> Option<EventKind> {
    Some(EventKind::PlayerModeChange {
        player: group(c, 1)?,
        mode: group(c, 2)?,
    })
}

fn border_shrink(c: &Captures<'_>) -> Option<EventKind> {
    Some(EventKind::MatchBorderShrink {
        target_width: c.get(1)?.as_str().parse().ok()?,
        from_width: c.get(2)?.as_str().parse().ok()?,
        seconds: c.get(3)?.as_str().parse().ok()?,
    })
}

fn team_members(c: &Captures<'_>) -> Option<EventKind> {
    let members = split_members(c.get(2)?.as_str());
    if members.is_empty() {
        return None;
    }
    Some(EventKind::TeamMembers {
        team: group(c, 1)?,
        members,
    })
}

/// Remove `§x` / `?x` colour codes around a name.
fn strip_color_codes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if (ch == '§' || ch == '?') && chars.peek().is_some_and(|n| n.is_ascii_alphanumeric()) {
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
