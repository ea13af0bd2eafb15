use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::time_utils::session_file_stem;

// ── Events ─────────────────────────────────────────────────────────────────────

/// How a player died, as reported by the server's death message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Slain,
    Shot,
    BlewUp,
    BlownUp,
    Suffocated,
    Fell,
    Burned,
    BurnedFighting,
    Drowned,
    Lava,
    LavaEscape,
    HitGround,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::Slain => "slain",
            DeathCause::Shot => "shot",
            DeathCause::BlewUp => "blew_up",
            DeathCause::BlownUp => "blown_up",
            DeathCause::Suffocated => "suffocated",
            DeathCause::Fell => "fell",
            DeathCause::Burned => "burned",
            DeathCause::BurnedFighting => "burned_fighting",
            DeathCause::Drowned => "drowned",
            DeathCause::Lava => "lava",
            DeathCause::LavaEscape => "lava_escape",
            DeathCause::HitGround => "hit_ground",
        }
    }
}

/// Kind-specific payload of a classified log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// `Starting minecraft server version …`
    ServerStart { version: String },
    ServerStop,
    ServerCrash,
    /// `UUID of player … is …`
    PlayerJoin { player: String, uuid: String },
    PlayerIp { player: String, ip: String },
    TeamColor { team: String, color: String },
    /// A (re)assignment of `members` to `team`.
    TeamMembers { team: String, members: Vec<String> },
    PlayerModeChange { player: String, mode: String },
    /// The world border started shrinking; this is the match start signal.
    MatchBorderShrink {
        target_width: f64,
        from_width: f64,
        seconds: u32,
    },
    /// A death without an attacker (fall, drowning, lava …).
    Death { player: String, cause: DeathCause },
    /// A death with a named attacker, which may be a player or a mob.
    Kill {
        player: String,
        killer: String,
        cause: DeathCause,
    },
}

impl EventKind {
    /// Stable tag name, used in log output.
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::ServerStart { .. } => "server_start",
            EventKind::ServerStop => "server_stop",
            EventKind::ServerCrash => "server_crash",
            EventKind::PlayerJoin { .. } => "player_join",
            EventKind::PlayerIp { .. } => "player_ip",
            EventKind::TeamColor { .. } => "team_color",
            EventKind::TeamMembers { .. } => "team_members",
            EventKind::PlayerModeChange { .. } => "player_mode_change",
            EventKind::MatchBorderShrink { .. } => "match_border_shrink",
            EventKind::Death { .. } => "death",
            EventKind::Kill { .. } => "kill",
        }
    }
}

/// An immutable, typed record produced by the event classifier.
///
/// `timestamp` is `None` for lines that carried no date prefix; the
/// reconstructor stamps those with the last timestamp it observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Option<NaiveDateTime>,
    pub kind: EventKind,
}

impl Event {
    pub fn at(timestamp: NaiveDateTime, kind: EventKind) -> Self {
        Self {
            timestamp: Some(timestamp),
            kind,
        }
    }

    pub fn untimed(kind: EventKind) -> Self {
        Self {
            timestamp: None,
            kind,
        }
    }
}

// ── Players and teams ──────────────────────────────────────────────────────────

/// A player as known to a single server session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub nickname: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    /// Name of the team this player was most recently assigned to.
    #[serde(default)]
    pub team: Option<String>,
}

impl Player {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Self::default()
        }
    }

    /// Whether the player qualifies for the match draft (uuid and team known).
    pub fn is_draftable(&self) -> bool {
        self.uuid.is_some() && self.team.is_some()
    }
}

/// A team scoped to one session. Members are kept unique and in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, nickname: &str) -> bool {
        self.members.iter().any(|m| m == nickname)
    }

    fn add_member(&mut self, nickname: &str) {
        if !self.contains(nickname) {
            self.members.push(nickname.to_string());
        }
    }

    fn remove_member(&mut self, nickname: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != nickname);
        before != self.members.len()
    }
}

// ── Matches ────────────────────────────────────────────────────────────────────

/// Outcome state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Still being played; more than one team may be alive.
    Active,
    /// A single team remains; `winning_team` is set.
    Decided,
    /// No winner can be determined (too few players, mutual destruction, or
    /// the session ended while undecided).
    Aborted,
}

/// One death inside a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub timestamp: NaiveDateTime,
    pub victim: String,
    /// Drafted player credited with the kill. `None` for environmental deaths
    /// and for attackers that were not part of the match (mobs, spectators).
    pub killer: Option<String>,
    /// Attacker name exactly as it appeared in the log.
    pub attacker: Option<String>,
    pub cause: DeathCause,
}

/// One round of play inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// `<session id>#<1-based match number>`.
    pub id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    /// Roster snapshot taken when the match opened, sorted by nickname.
    pub drafted: Vec<String>,
    /// Everyone who was on the roster at any point.
    pub participants: BTreeSet<String>,
    /// Players still alive and playing.
    pub active: BTreeSet<String>,
    pub records: Vec<MatchRecord>,
    pub outcome: MatchOutcome,
    pub winning_team: Option<String>,
    /// Participants belonging to the winning team when the match was decided.
    #[serde(default)]
    pub winners: Vec<String>,
    /// Team each player was on when it last left the active roster.
    #[serde(default)]
    pub departed_teams: BTreeMap<String, String>,
}

impl Match {
    pub fn open(id: String, started_at: NaiveDateTime, roster: Vec<String>) -> Self {
        let active: BTreeSet<String> = roster.iter().cloned().collect();
        let drafted: Vec<String> = active.iter().cloned().collect();
        Self {
            id,
            started_at,
            ended_at: None,
            participants: active.clone(),
            drafted,
            active,
            records: Vec::new(),
            outcome: MatchOutcome::Active,
            winning_team: None,
            winners: Vec::new(),
            departed_teams: BTreeMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.outcome == MatchOutcome::Active
    }

    pub fn is_decided(&self) -> bool {
        self.outcome == MatchOutcome::Decided
    }

    /// Put a player (back) on the active roster.
    pub fn activate(&mut self, nickname: &str) -> bool {
        self.participants.insert(nickname.to_string());
        self.active.insert(nickname.to_string())
    }

    /// Take a player off the active roster without recording a death.
    pub fn deactivate(&mut self, nickname: &str) -> bool {
        self.active.remove(nickname)
    }

    /// Remove the victim from the active roster and append the record.
    ///
    /// Returns `false` (and records nothing) when the victim is not active,
    /// so no player can die twice in the same match.
    pub fn record_death(&mut self, record: MatchRecord) -> bool {
        if !self.active.remove(&record.victim) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Remember the team a player was on as it leaves the active roster.
    pub fn note_departure(&mut self, nickname: &str, team: Option<&str>) {
        if let Some(team) = team {
            self.departed_teams
                .insert(nickname.to_string(), team.to_string());
        }
    }

    /// Team that counts for `nickname` when deciding a winner: the team it
    /// left the roster with, if it is no longer active.
    pub fn counted_team<'a>(&'a self, nickname: &str, current: Option<&'a str>) -> Option<&'a str> {
        if self.active.contains(nickname) {
            return current;
        }
        self.departed_teams
            .get(nickname)
            .map(String::as_str)
            .or(current)
    }

    /// Close the match with `team` as the winner. A closed match is never
    /// reopened or re-decided.
    pub fn decide(&mut self, team: String, winners: Vec<String>, at: NaiveDateTime) -> bool {
        if !self.is_open() {
            return false;
        }
        debug!("Match {} decided, winning team {}", self.id, team);
        self.outcome = MatchOutcome::Decided;
        self.winning_team = Some(team);
        self.winners = winners;
        self.ended_at = Some(at);
        true
    }

    pub fn abort(&mut self, at: NaiveDateTime) -> bool {
        if !self.is_open() {
            return false;
        }
        debug!("Match {} aborted", self.id);
        self.outcome = MatchOutcome::Aborted;
        self.ended_at = Some(at);
        true
    }

    /// Winners still on the active roster when the match ended.
    pub fn surviving_winners(&self) -> impl Iterator<Item = &String> {
        self.winners.iter().filter(|w| self.active.contains(*w))
    }

    /// Winners that died before the match ended.
    pub fn dead_winners(&self) -> impl Iterator<Item = &String> {
        self.winners.iter().filter(|w| !self.active.contains(*w))
    }

    pub fn kill_count(&self) -> usize {
        self.records.iter().filter(|r| r.killer.is_some()).count()
    }
}

// ── Anomalies ──────────────────────────────────────────────────────────────────

/// Recoverable irregularities found while replaying a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A player-scoped event named a player the session never saw.
    UnknownPlayer,
    /// A death or kill with no open match.
    PreMatchDeath,
    /// A death of a player who is not on the active roster.
    InactiveVictim,
    /// A server stop arriving while the session is already crashed.
    StopAfterCrash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub timestamp: NaiveDateTime,
    pub kind: AnomalyKind,
    pub detail: String,
}

// ── Server sessions ────────────────────────────────────────────────────────────

/// Lifecycle state of a server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Running,
    Stopped,
    /// Crashed; may still be resumed by a quick restart.
    Crashed,
    /// Replaced by a new server start without a stop.
    Aborted,
}

/// One continuous run of the server process, including crash-resumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSession {
    /// Start timestamp formatted as `%Y-%m-%d_%H%M%S`.
    pub id: String,
    /// Minecraft server version from the start banner.
    pub version: String,
    pub started_at: NaiveDateTime,
    pub stopped_at: Option<NaiveDateTime>,
    pub state: ServerState,
    /// Number of crash-resume merges folded into this session.
    #[serde(default)]
    pub resumes: u32,
    pub events: Vec<Event>,
    pub players: BTreeMap<String, Player>,
    pub teams: BTreeMap<String, Team>,
    pub matches: Vec<Match>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
}

impl ServerSession {
    pub fn new(started_at: NaiveDateTime, version: impl Into<String>) -> Self {
        Self {
            id: session_file_stem(started_at),
            version: version.into(),
            started_at,
            stopped_at: None,
            state: ServerState::Running,
            resumes: 0,
            events: Vec::new(),
            players: BTreeMap::new(),
            teams: BTreeMap::new(),
            matches: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Look up a player, creating it on first reference.
    pub fn player_entry(&mut self, nickname: &str) -> &mut Player {
        self.players
            .entry(nickname.to_string())
            .or_insert_with(|| Player::new(nickname))
    }

    pub fn team_of(&self, nickname: &str) -> Option<&str> {
        self.players.get(nickname)?.team.as_deref()
    }

    /// Create-or-update the team's color.
    pub fn set_team_color(&mut self, team: &str, color: &str) {
        self.teams
            .entry(team.to_string())
            .or_insert_with(|| Team::new(team))
            .color = Some(color.to_string());
    }

    /// Move `nickname` into `team`: it is removed from every other team of
    /// this session first, so the latest assignment always wins.
    pub fn assign_team(&mut self, team: &str, nickname: &str) {
        for (name, other) in self.teams.iter_mut() {
            if name != team && other.remove_member(nickname) {
                debug!("Player {} left team {}", nickname, name);
            }
        }
        self.teams
            .entry(team.to_string())
            .or_insert_with(|| Team::new(team))
            .add_member(nickname);
        self.player_entry(nickname).team = Some(team.to_string());
    }

    /// Nicknames eligible for the draft when a match opens.
    pub fn draftable_players(&self) -> Vec<String> {
        self.players
            .values()
            .filter(|p| p.is_draftable())
            .map(|p| p.nickname.clone())
            .collect()
    }

    /// The last match, if it is still being played.
    pub fn open_match_mut(&mut self) -> Option<&mut Match> {
        self.matches.last_mut().filter(|m| m.is_open())
    }

    pub fn has_open_match(&self) -> bool {
        self.matches.last().is_some_and(|m| m.is_open())
    }

    pub fn next_match_id(&self) -> String {
        format!("{}#{}", self.id, self.matches.len() + 1)
    }

    /// Teams with at least one member.
    pub fn populated_team_count(&self) -> usize {
        self.teams.values().filter(|t| !t.members.is_empty()).count()
    }

    pub fn decided_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.is_decided())
    }

    /// `stopped_at - started_at`, or `None` while the session is open.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.stopped_at.map(|stop| stop - self.started_at)
    }

    pub fn record_anomaly(&mut self, timestamp: NaiveDateTime, kind: AnomalyKind, detail: String) {
        debug!("Session {}: {:?} anomaly: {}", self.id, kind, detail);
        self.anomalies.push(Anomaly {
            timestamp,
            kind,
            detail,
        });
    }
}

// ── Highscore ──────────────────────────────────────────────────────────────────

/// One ranked row of the highscore table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreEntry {
    pub nickname: String,
    pub uuid: Option<String>,
    pub score: i64,
    pub wins: u32,
    pub dead_wins: u32,
    pub games: u32,
    pub deaths: u32,
    pub kills: u32,
    /// `kills / deaths`, or `None` when the player never died.
    pub kd: Option<f64>,
    pub alt_nicks: Vec<String>,
    /// 1-based rank after sorting.
    pub place: usize,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
