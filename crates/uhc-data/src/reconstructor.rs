//! Replays classified events into server sessions and matches.
//!
//! The replay is a fold: [`SessionReconstructor::step`] takes the running
//! [`ReplayState`] and one event, [`SessionReconstructor::finish`] closes
//! whatever is still open. Feeding the same events always yields the same
//! sessions.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::{debug, info};
use uhc_core::models::{
    AnomalyKind, DeathCause, Event, EventKind, Match, MatchRecord, Player, ServerSession,
    ServerState,
};
use uhc_core::settings::SessionPolicy;
use uhc_core::time_utils::whole_minutes;

use crate::validator::{evaluate_outcome, resolve_at_session_end};

// ── Replay state ──────────────────────────────────────────────────────────────

/// Everything the reconstructor carries between two events.
#[derive(Debug, Default)]
pub struct ReplayState {
    finished: Vec<ServerSession>,
    /// Running or crashed-but-resumable session.
    current: Option<ServerSession>,
    /// Last timestamp observed; stamps lines that carry none.
    clock: Option<NaiveDateTime>,
    orphans: usize,
}

impl ReplayState {
    pub fn current(&self) -> Option<&ServerSession> {
        self.current.as_ref()
    }

    pub fn finished(&self) -> &[ServerSession] {
        &self.finished
    }
}

/// Result of replaying one event stream.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    /// Finalized sessions in start order.
    pub sessions: Vec<ServerSession>,
    /// Events that arrived while no session was running.
    pub orphan_events: usize,
}

// ── SessionReconstructor ──────────────────────────────────────────────────────

/// Drives the server session lifecycle and the match lifecycle inside it.
pub struct SessionReconstructor {
    policy: SessionPolicy,
}

impl SessionReconstructor {
    pub fn new(policy: SessionPolicy) -> Self {
        Self { policy }
    }

    /// Replay a whole event stream.
    pub fn reconstruct(&self, events: impl IntoIterator<Item = Event>) -> Reconstruction {
        let mut state = ReplayState::default();
        for event in events {
            self.step(&mut state, event);
        }
        self.finish(state)
    }

    /// Apply a single event.
    pub fn step(&self, state: &mut ReplayState, event: Event) {
        let Some(ts) = event.timestamp.or(state.clock) else {
            debug!("Dropping {} event before any timestamp", event.kind.tag());
            state.orphans += 1;
            return;
        };
        state.clock = Some(ts);
        let event = Event::at(ts, event.kind);

        match &event.kind {
            EventKind::ServerStart { version } => {
                let version = version.clone();
                self.on_server_start(state, ts, version, event);
            }
            EventKind::ServerStop => self.on_server_stop(state, ts, event),
            EventKind::ServerCrash => self.on_server_crash(state, ts, event),
            _ => match state.current.as_mut() {
                Some(session) if session.state == ServerState::Running => {
                    self.apply_session_event(session, ts, &event.kind);
                    session.events.push(event);
                }
                _ => {
                    debug!("Orphan {} event at {}", event.kind.tag(), ts);
                    state.orphans += 1;
                }
            },
        }
    }

    /// Close the open session, if any, and return everything reconstructed.
    ///
    /// A running session is treated as stopped at the last observed
    /// timestamp; a crashed one stays crashed.
    pub fn finish(&self, mut state: ReplayState) -> Reconstruction {
        if let Some(mut session) = state.current.take() {
            if session.state == ServerState::Running {
                session.state = ServerState::Stopped;
                session.stopped_at = Some(last_seen(&session));
            }
            self.finalize(&mut state, session);
        }

        if state.orphans > 0 {
            debug!("{} events fell outside any session", state.orphans);
        }

        Reconstruction {
            sessions: state.finished,
            orphan_events: state.orphans,
        }
    }

    // ── Server lifecycle ──────────────────────────────────────────────────────

    fn on_server_start(
        &self,
        state: &mut ReplayState,
        ts: NaiveDateTime,
        version: String,
        event: Event,
    ) {
        match state.current.take() {
            Some(mut session) if session.state == ServerState::Crashed => {
                let crashed_at = session.stopped_at.unwrap_or(session.started_at);
                let gap = ts - crashed_at;
                if gap >= chrono::TimeDelta::zero() && gap <= self.policy.crash_grace() {
                    info!(
                        "Session {} resumed {} minutes after crash",
                        session.id,
                        whole_minutes(gap)
                    );
                    session.state = ServerState::Running;
                    session.stopped_at = None;
                    session.resumes += 1;
                    session.events.push(event);
                    state.current = Some(session);
                    return;
                }
                self.finalize(state, session);
            }
            Some(mut session) => {
                debug!("Session {} replaced by a new start without stop", session.id);
                session.state = ServerState::Aborted;
                session.stopped_at = Some(last_seen(&session));
                self.finalize(state, session);
            }
            None => {}
        }

        let mut session = ServerSession::new(ts, version);
        debug!("Session {} started (version {})", session.id, session.version);
        session.events.push(event);
        state.current = Some(session);
    }

    fn on_server_stop(&self, state: &mut ReplayState, ts: NaiveDateTime, event: Event) {
        match state.current.take() {
            Some(mut session) if session.state == ServerState::Running => {
                session.state = ServerState::Stopped;
                session.stopped_at = Some(ts);
                session.events.push(event);
                self.finalize(state, session);
            }
            Some(mut session) => {
                session.record_anomaly(
                    ts,
                    AnomalyKind::StopAfterCrash,
                    "server stop while crashed".to_string(),
                );
                state.current = Some(session);
            }
            None => {
                debug!("Orphan server stop at {}", ts);
                state.orphans += 1;
            }
        }
    }

    fn on_server_crash(&self, state: &mut ReplayState, ts: NaiveDateTime, event: Event) {
        match state.current.as_mut() {
            Some(session) if session.state == ServerState::Running => {
                info!("Session {} crashed at {}", session.id, ts);
                session.state = ServerState::Crashed;
                session.stopped_at = Some(ts);
                session.events.push(event);
            }
            Some(session) => {
                debug!("Session {} already crashed, ignoring second report", session.id);
            }
            None => {
                debug!("Orphan server crash at {}", ts);
                state.orphans += 1;
            }
        }
    }

    /// Close any open match and move the session to the finished list.
    fn finalize(&self, state: &mut ReplayState, mut session: ServerSession) {
        let end = session.stopped_at.unwrap_or_else(|| last_seen(&session));
        let ServerSession {
            matches, players, ..
        } = &mut session;
        if let Some(m) = matches.last_mut() {
            resolve_at_session_end(m, players, end);
        }

        info!(
            "Session {} finalized as {:?}: {} players, {} matches ({} decided), {} anomalies",
            session.id,
            session.state,
            session.players.len(),
            session.matches.len(),
            session.decided_matches().count(),
            session.anomalies.len()
        );
        state.finished.push(session);
    }

    // ── Session-scoped events ─────────────────────────────────────────────────

    fn apply_session_event(&self, session: &mut ServerSession, ts: NaiveDateTime, kind: &EventKind) {
        match kind {
            EventKind::PlayerJoin { player, uuid } => {
                session.player_entry(player).uuid = Some(uuid.clone());
            }
            EventKind::PlayerIp { player, ip } => match session.players.get_mut(player) {
                Some(p) => p.ip = Some(ip.clone()),
                None => session.record_anomaly(
                    ts,
                    AnomalyKind::UnknownPlayer,
                    format!("address for unknown player {player}"),
                ),
            },
            EventKind::TeamColor { team, color } => session.set_team_color(team, color),
            EventKind::TeamMembers { team, members } => {
                for member in members {
                    session.assign_team(team, member);
                }
            }
            EventKind::MatchBorderShrink { .. } => self.on_border_shrink(session, ts),
            EventKind::PlayerModeChange { player, mode } => {
                self.on_mode_change(session, ts, player, mode)
            }
            EventKind::Death { player, cause } => self.on_death(session, ts, player, None, *cause),
            EventKind::Kill {
                player,
                killer,
                cause,
            } => self.on_death(session, ts, player, Some(killer), *cause),
            EventKind::ServerStart { .. } | EventKind::ServerStop | EventKind::ServerCrash => {}
        }
    }

    // ── Match lifecycle ───────────────────────────────────────────────────────

    fn on_border_shrink(&self, session: &mut ServerSession, ts: NaiveDateTime) {
        if session.has_open_match() {
            debug!("Border shrink during a running match in {}", session.id);
            return;
        }

        let roster = session.draftable_players();
        let mut m = Match::open(session.next_match_id(), ts, roster);
        if m.drafted.len() < self.policy.min_match_players {
            debug!(
                "Match {} has only {} drafted players, aborting",
                m.id,
                m.drafted.len()
            );
            m.abort(ts);
        } else {
            debug!("Match {} opened with {} players", m.id, m.drafted.len());
        }
        session.matches.push(m);
    }

    fn on_mode_change(&self, session: &mut ServerSession, ts: NaiveDateTime, player: &str, mode: &str) {
        if !session.has_open_match() {
            return;
        }

        if self.policy.is_active_mode(mode) {
            session.player_entry(player);
            if let Some(m) = session.open_match_mut() {
                if m.activate(player) {
                    debug!("{} joined match {}", player, m.id);
                }
            }
            return;
        }

        let ServerSession {
            matches, players, ..
        } = session;
        let Some(m) = matches.last_mut().filter(|m| m.is_open()) else {
            return;
        };
        if m.deactivate(player) {
            debug!("{} left match {} ({} mode)", player, m.id, mode);
            m.note_departure(player, team_of(players, player));
            evaluate_outcome(m, players, ts);
        }
    }

    fn on_death(
        &self,
        session: &mut ServerSession,
        ts: NaiveDateTime,
        victim: &str,
        attacker: Option<&String>,
        cause: DeathCause,
    ) {
        session.player_entry(victim);
        if !session.has_open_match() {
            session.record_anomaly(
                ts,
                AnomalyKind::PreMatchDeath,
                format!("{victim} died ({}) with no match running", cause.as_str()),
            );
            return;
        }

        let victim_active = session
            .matches
            .last()
            .is_some_and(|m| m.active.contains(victim));
        if !victim_active {
            session.record_anomaly(
                ts,
                AnomalyKind::InactiveVictim,
                format!("{victim} died ({}) while not playing", cause.as_str()),
            );
            return;
        }

        let ServerSession {
            matches, players, ..
        } = session;
        let Some(m) = matches.last_mut().filter(|m| m.is_open()) else {
            return;
        };

        let killer = attacker
            .filter(|a| a.as_str() != victim && m.participants.contains(a.as_str()))
            .cloned();
        if let (Some(a), None) = (attacker, &killer) {
            debug!("Attacker {} of {} is not a match participant", a, victim);
        }

        m.record_death(MatchRecord {
            timestamp: ts,
            victim: victim.to_string(),
            killer,
            attacker: attacker.cloned(),
            cause,
        });
        m.note_departure(victim, team_of(players, victim));
        evaluate_outcome(m, players, ts);
    }
}

fn team_of<'a>(players: &'a BTreeMap<String, Player>, nickname: &str) -> Option<&'a str> {
    players.get(nickname)?.team.as_deref()
}

/// Timestamp of the last event folded into the session.
fn last_seen(session: &ServerSession) -> NaiveDateTime {
    session
        .events
        .last()
        .and_then(|e| e.timestamp)
        .unwrap_or(session.started_at)
}

/// Replay `events` with the given policy.
pub fn reconstruct(events: impl IntoIterator<Item = Event>, policy: &SessionPolicy) -> Reconstruction {
    SessionReconstructor::new(policy.clone()).reconstruct(events)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uhc_core::models::MatchOutcome;
    use uhc_core::time_utils::parse_log_timestamp;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at(hms: &str) -> NaiveDateTime {
        parse_log_timestamp(&format!("2015-05-19 {hms}")).unwrap()
    }

    fn ev(hms: &str, kind: EventKind) -> Event {
        Event::at(at(hms), kind)
    }

    fn start(hms: &str) -> Event {
        ev(hms, EventKind::ServerStart { version: "1.8".into() })
    }

    fn stop(hms: &str) -> Event {
        ev(hms, EventKind::ServerStop)
    }

    fn join(hms: &str, player: &str) -> Event {
        ev(
            hms,
            EventKind::PlayerJoin {
                player: player.into(),
                uuid: format!("uuid-{}", player.to_lowercase()),
            },
        )
    }

    fn team(hms: &str, team: &str, members: &[&str]) -> Event {
        ev(
            hms,
            EventKind::TeamMembers {
                team: team.into(),
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        )
    }

    fn shrink(hms: &str) -> Event {
        ev(
            hms,
            EventKind::MatchBorderShrink {
                target_width: 100.0,
                from_width: 1000.0,
                seconds: 3600,
            },
        )
    }

    fn kill(hms: &str, victim: &str, killer: &str) -> Event {
        ev(
            hms,
            EventKind::Kill {
                player: victim.into(),
                killer: killer.into(),
                cause: DeathCause::Slain,
            },
        )
    }

    fn fall(hms: &str, victim: &str) -> Event {
        ev(
            hms,
            EventKind::Death {
                player: victim.into(),
                cause: DeathCause::Fell,
            },
        )
    }

    fn lobby(t: &str) -> Vec<Event> {
        vec![
            start(t),
            join(t, "Alice"),
            join(t, "Bob"),
            join(t, "Carol"),
            join(t, "Dave"),
            team(t, "Red", &["Alice", "Bob"]),
            team(t, "Blue", &["Carol", "Dave"]),
        ]
    }

    fn run(events: Vec<Event>) -> Reconstruction {
        reconstruct(events, &SessionPolicy::default())
    }

    // ── Session lifecycle ─────────────────────────────────────────────────────

    #[test]
    fn test_start_stop_produces_stopped_session() {
        let r = run(vec![start("20:00:00"), stop("21:00:00")]);
        assert_eq!(r.sessions.len(), 1);
        let s = &r.sessions[0];
        assert_eq!(s.id, "2015-05-19_200000");
        assert_eq!(s.state, ServerState::Stopped);
        assert_eq!(s.stopped_at, Some(at("21:00:00")));
    }

    #[test]
    fn test_events_before_start_are_orphans() {
        let r = run(vec![join("19:00:00", "Alice"), start("20:00:00"), stop("21:00:00")]);
        assert_eq!(r.orphan_events, 1);
        assert!(r.sessions[0].players.is_empty());
    }

    #[test]
    fn test_untimed_event_uses_last_timestamp() {
        let r = run(vec![
            Event::untimed(EventKind::ServerStop),
            start("20:00:00"),
            Event::untimed(EventKind::PlayerJoin {
                player: "Alice".into(),
                uuid: "u".into(),
            }),
            stop("21:00:00"),
        ]);
        assert_eq!(r.orphan_events, 1);
        assert_eq!(r.sessions[0].events[1].timestamp, Some(at("20:00:00")));
    }

    #[test]
    fn test_start_while_running_aborts_previous() {
        let r = run(vec![
            start("20:00:00"),
            join("20:10:00", "Alice"),
            start("21:00:00"),
            stop("22:00:00"),
        ]);
        assert_eq!(r.sessions.len(), 2);
        assert_eq!(r.sessions[0].state, ServerState::Aborted);
        assert_eq!(r.sessions[0].stopped_at, Some(at("20:10:00")));
        assert_eq!(r.sessions[1].state, ServerState::Stopped);
    }

    #[test]
    fn test_crash_then_quick_restart_resumes() {
        let r = run(vec![
            start("20:00:00"),
            ev("20:30:00", EventKind::ServerCrash),
            stop("20:30:01"),
            start("20:35:00"),
            stop("21:00:00"),
        ]);
        assert_eq!(r.sessions.len(), 1);
        let s = &r.sessions[0];
        assert_eq!(s.resumes, 1);
        assert_eq!(s.state, ServerState::Stopped);
        assert_eq!(s.stopped_at, Some(at("21:00:00")));
        assert_eq!(s.anomalies[0].kind, AnomalyKind::StopAfterCrash);
    }

    #[test]
    fn test_crash_then_late_restart_opens_new_session() {
        let r = run(vec![
            start("20:00:00"),
            ev("20:30:00", EventKind::ServerCrash),
            start("20:45:00"),
            stop("21:00:00"),
        ]);
        assert_eq!(r.sessions.len(), 2);
        assert_eq!(r.sessions[0].state, ServerState::Crashed);
        assert_eq!(r.sessions[0].stopped_at, Some(at("20:30:00")));
    }

    #[test]
    fn test_oversized_crash_grace_resumes_without_panic() {
        let policy = SessionPolicy {
            crash_grace_minutes: i64::MAX / 2,
            ..SessionPolicy::default()
        };
        let r = reconstruct(
            vec![
                start("20:00:00"),
                ev("20:30:00", EventKind::ServerCrash),
                start("23:00:00"),
                stop("23:30:00"),
            ],
            &policy,
        );
        assert_eq!(r.sessions.len(), 1);
        assert_eq!(r.sessions[0].resumes, 1);
    }

    #[test]
    fn test_running_session_at_end_of_input_is_stopped() {
        let r = run(vec![start("20:00:00"), join("20:40:00", "Alice")]);
        assert_eq!(r.sessions[0].state, ServerState::Stopped);
        assert_eq!(r.sessions[0].stopped_at, Some(at("20:40:00")));
    }

    // ── Matches ───────────────────────────────────────────────────────────────

    #[test]
    fn test_full_match_is_decided() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            kill("20:20:00", "Carol", "Alice"),
            fall("20:25:00", "Dave"),
            stop("21:00:00"),
        ]);
        let r = run(events);
        let m = &r.sessions[0].matches[0];
        assert_eq!(m.outcome, MatchOutcome::Decided);
        assert_eq!(m.winning_team.as_deref(), Some("Red"));
        assert_eq!(m.records[0].killer.as_deref(), Some("Alice"));
        assert_eq!(m.records[1].killer, None);
    }

    #[test]
    fn test_border_shrink_during_match_continues_it() {
        let mut events = lobby("20:00:00");
        events.extend([shrink("20:10:00"), shrink("20:30:00"), stop("21:00:00")]);
        let r = run(events);
        assert_eq!(r.sessions[0].matches.len(), 1);
    }

    #[test]
    fn test_small_roster_aborts_immediately() {
        let events = vec![
            start("20:00:00"),
            join("20:00:00", "Alice"),
            join("20:00:00", "Bob"),
            team("20:00:00", "Red", &["Alice"]),
            team("20:00:00", "Blue", &["Bob"]),
            shrink("20:10:00"),
            kill("20:20:00", "Bob", "Alice"),
            stop("21:00:00"),
        ];
        let r = run(events);
        let s = &r.sessions[0];
        assert_eq!(s.matches[0].outcome, MatchOutcome::Aborted);
        assert!(s.matches[0].records.is_empty());
        assert_eq!(s.anomalies[0].kind, AnomalyKind::PreMatchDeath);
    }

    #[test]
    fn test_death_before_match_is_anomaly() {
        let mut events = lobby("20:00:00");
        events.extend([fall("20:05:00", "Alice"), stop("21:00:00")]);
        let r = run(events);
        assert!(r.sessions[0].matches.is_empty());
        assert_eq!(r.sessions[0].anomalies[0].kind, AnomalyKind::PreMatchDeath);
    }

    #[test]
    fn test_death_of_unseen_player_creates_it() {
        let mut events = lobby("20:00:00");
        events.extend([fall("20:05:00", "Zed"), shrink("20:10:00"), fall("20:12:00", "Yan"), stop("21:00:00")]);
        let r = run(events);
        let s = &r.sessions[0];
        assert!(s.players.contains_key("Zed"));
        assert!(s.players.contains_key("Yan"));
        assert!(!s.matches[0].participants.contains("Yan"));
        let kinds: Vec<_> = s.anomalies.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AnomalyKind::PreMatchDeath, AnomalyKind::InactiveVictim]);
    }

    #[test]
    fn test_address_for_unknown_player_is_skipped() {
        let r = run(vec![
            start("20:00:00"),
            ev(
                "20:01:00",
                EventKind::PlayerIp {
                    player: "Alice".into(),
                    ip: "10.0.0.1".into(),
                },
            ),
            join("20:01:05", "Alice"),
            stop("21:00:00"),
        ]);
        let s = &r.sessions[0];
        assert_eq!(s.anomalies.len(), 1);
        assert_eq!(s.anomalies[0].kind, AnomalyKind::UnknownPlayer);
        assert_eq!(s.players.len(), 1);
        assert_eq!(s.players["Alice"].ip, None);
    }

    #[test]
    fn test_fallen_teammate_moved_to_dead_team_is_dead_winner() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            kill("20:15:00", "Bob", "Carol"),
            team("20:15:05", "Dead", &["Bob"]),
            kill("20:20:00", "Carol", "Alice"),
            fall("20:25:00", "Dave"),
            stop("21:00:00"),
        ]);
        let r = run(events);
        let m = &r.sessions[0].matches[0];
        assert_eq!(m.winning_team.as_deref(), Some("Red"));
        assert_eq!(m.winners, vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(m.departed_teams["Bob"], "Red");
    }

    #[test]
    fn test_mob_attacker_is_not_credited() {
        let mut events = lobby("20:00:00");
        events.extend([shrink("20:10:00"), kill("20:20:00", "Carol", "Zombie"), stop("21:00:00")]);
        let r = run(events);
        let record = &r.sessions[0].matches[0].records[0];
        assert_eq!(record.killer, None);
        assert_eq!(record.attacker.as_deref(), Some("Zombie"));
    }

    #[test]
    fn test_second_death_is_inactive_victim() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            fall("20:20:00", "Carol"),
            fall("20:21:00", "Carol"),
            stop("21:00:00"),
        ]);
        let r = run(events);
        let s = &r.sessions[0];
        assert_eq!(s.matches[0].records.len(), 1);
        assert_eq!(s.anomalies[0].kind, AnomalyKind::InactiveVictim);
    }

    #[test]
    fn test_spectator_mode_leaves_match() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            ev(
                "20:20:00",
                EventKind::PlayerModeChange {
                    player: "Carol".into(),
                    mode: "Spectator".into(),
                },
            ),
            ev(
                "20:21:00",
                EventKind::PlayerModeChange {
                    player: "Dave".into(),
                    mode: "Spectator".into(),
                },
            ),
            stop("21:00:00"),
        ]);
        let r = run(events);
        let m = &r.sessions[0].matches[0];
        assert_eq!(m.outcome, MatchOutcome::Decided);
        assert!(m.records.is_empty());
    }

    #[test]
    fn test_survival_mode_adds_late_player() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            ev(
                "20:12:00",
                EventKind::PlayerModeChange {
                    player: "Erin".into(),
                    mode: "survival".into(),
                },
            ),
            stop("21:00:00"),
        ]);
        let r = run(events);
        let m = &r.sessions[0].matches[0];
        assert!(m.participants.contains("Erin"));
        assert!(!m.drafted.contains(&"Erin".to_string()));
    }

    #[test]
    fn test_match_spanning_crash_is_not_split() {
        let mut events = lobby("20:00:00");
        events.extend([
            shrink("20:10:00"),
            fall("20:20:00", "Carol"),
            ev("20:30:00", EventKind::ServerCrash),
            start("20:32:00"),
            fall("20:40:00", "Dave"),
            stop("21:00:00"),
        ]);
        let r = run(events);
        assert_eq!(r.sessions.len(), 1);
        let s = &r.sessions[0];
        assert_eq!(s.matches.len(), 1);
        assert_eq!(s.matches[0].outcome, MatchOutcome::Decided);
        assert_eq!(s.matches[0].records.len(), 2);
    }

    #[test]
    fn test_open_match_closed_at_session_end() {
        let mut events = lobby("20:00:00");
        events.extend([shrink("20:10:00"), stop("21:00:00")]);
        let r = run(events);
        let m = &r.sessions[0].matches[0];
        assert_eq!(m.outcome, MatchOutcome::Aborted);
        assert_eq!(m.ended_at, Some(at("21:00:00")));
    }

    #[test]
    fn test_step_exposes_intermediate_state() {
        let reconstructor = SessionReconstructor::new(SessionPolicy::default());
        let mut state = ReplayState::default();
        reconstructor.step(&mut state, start("20:00:00"));
        reconstructor.step(&mut state, join("20:01:00", "Alice"));
        let current = state.current().unwrap();
        assert!(current.players.contains_key("Alice"));
        assert!(state.finished().is_empty());
    }
}
