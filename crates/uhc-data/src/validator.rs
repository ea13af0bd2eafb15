//! Match outcome detection and session countability.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use uhc_core::models::{Match, MatchOutcome, Player, ServerSession};
use uhc_core::settings::SessionPolicy;

// ── Match outcome ─────────────────────────────────────────────────────────────

/// Re-evaluate an open match after its roster shrank.
///
/// * more than two players left: still active
/// * one or two left, all on one team: decided for that team
/// * two left on different teams: still active (last player standing)
/// * nobody left: aborted
pub fn evaluate_outcome(
    m: &mut Match,
    players: &BTreeMap<String, Player>,
    at: NaiveDateTime,
) -> MatchOutcome {
    if !m.is_open() {
        return m.outcome;
    }
    match m.active.len() {
        0 => {
            m.abort(at);
        }
        1 | 2 => {
            if let Some(team) = shared_team(&m.active, players) {
                let winners = team_participants(m, players, &team);
                m.decide(team, winners, at);
            }
        }
        _ => {}
    }
    m.outcome
}

/// Close a match that is still open when its session ends.
///
/// If every remaining player shares one team that team wins; otherwise no
/// winner can be determined and the match is aborted.
pub fn resolve_at_session_end(
    m: &mut Match,
    players: &BTreeMap<String, Player>,
    at: NaiveDateTime,
) -> MatchOutcome {
    if !m.is_open() {
        return m.outcome;
    }
    match shared_team(&m.active, players) {
        Some(team) => {
            let winners = team_participants(m, players, &team);
            m.decide(team, winners, at);
        }
        None => {
            m.abort(at);
        }
    }
    m.outcome
}

/// The single team every nickname belongs to. `None` for an empty set, for
/// mixed teams, and when any player has no team.
fn shared_team(nicknames: &BTreeSet<String>, players: &BTreeMap<String, Player>) -> Option<String> {
    let mut teams = nicknames
        .iter()
        .map(|n| players.get(n).and_then(|p| p.team.as_deref()));
    let first = teams.next()??;
    teams.all(|t| t == Some(first)).then(|| first.to_string())
}

/// Participants on `team`. Players who already left the roster count with
/// the team they had when they left.
fn team_participants(m: &Match, players: &BTreeMap<String, Player>, team: &str) -> Vec<String> {
    m.participants
        .iter()
        .filter(|n| {
            let current = players.get(*n).and_then(|p| p.team.as_deref());
            m.counted_team(n, current) == Some(team)
        })
        .cloned()
        .collect()
}

// ── Session countability ──────────────────────────────────────────────────────

/// Why a session was excluded from the highscore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NoWinner,
    TooShort,
    TooFewTeams,
    NoPlayers,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NoWinner => "no_winner",
            RejectReason::TooShort => "too_short",
            RejectReason::TooFewTeams => "too_few_teams",
            RejectReason::NoPlayers => "no_players",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized session that did not pass [`validate_session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub session_id: String,
    pub reason: RejectReason,
}

/// Check whether a finalized session may be counted, returning the first
/// failing check.
pub fn validate_session(session: &ServerSession, policy: &SessionPolicy) -> Result<(), RejectReason> {
    if session.decided_matches().next().is_none() {
        return Err(RejectReason::NoWinner);
    }

    let duration = session.duration().unwrap_or_else(TimeDelta::zero);
    if duration < policy.min_session() {
        return Err(RejectReason::TooShort);
    }

    if session.populated_team_count() < 2 {
        return Err(RejectReason::TooFewTeams);
    }

    if session.players.is_empty() || !records_reference_known_players(session) {
        return Err(RejectReason::NoPlayers);
    }

    Ok(())
}

/// Every victim and credited killer in the decided matches is a session player.
fn records_reference_known_players(session: &ServerSession) -> bool {
    session
        .decided_matches()
        .flat_map(|m| m.records.iter())
        .all(|r| {
            session.players.contains_key(&r.victim)
                && r.killer
                    .as_ref()
                    .map_or(true, |k| session.players.contains_key(k))
        })
}

/// Split sessions into countable ones and rejections, preserving order.
pub fn partition_sessions<'a>(
    sessions: impl IntoIterator<Item = &'a ServerSession>,
    policy: &SessionPolicy,
) -> (Vec<&'a ServerSession>, Vec<Rejection>) {
    let mut countable = Vec::new();
    let mut rejected = Vec::new();
    for session in sessions {
        match validate_session(session, policy) {
            Ok(()) => countable.push(session),
            Err(reason) => {
                tracing::debug!("Session {} rejected: {}", session.id, reason);
                rejected.push(Rejection {
                    session_id: session.id.clone(),
                    reason,
                });
            }
        }
    }
    (countable, rejected)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
