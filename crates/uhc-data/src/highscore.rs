//! Per-player counters across countable sessions and the ranked table.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use uhc_core::formatting::ratio;
use uhc_core::models::{HighscoreEntry, ServerSession};
use uhc_core::settings::ScoreWeights;

use crate::identity::{session_players, IdentityMap};

// ── PlayerTally ───────────────────────────────────────────────────────────────

/// Raw counters for one canonical player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerTally {
    pub games: u32,
    pub wins: u32,
    pub dead_wins: u32,
    pub kills: u32,
    pub deaths: u32,
}

impl PlayerTally {
    pub fn score(&self, weights: &ScoreWeights) -> i64 {
        weights.score(self.wins, self.dead_wins, self.kills, self.deaths)
    }

    /// Kills per death to three decimals; `None` without deaths.
    pub fn kd(&self) -> Option<f64> {
        ratio(self.kills, self.deaths, 3)
    }
}

// ── Highscore ─────────────────────────────────────────────────────────────────

/// Accumulates tallies keyed by canonical nickname.
pub struct Highscore<'m> {
    identities: &'m IdentityMap,
    tallies: BTreeMap<String, PlayerTally>,
}

impl<'m> Highscore<'m> {
    pub fn new(identities: &'m IdentityMap) -> Self {
        Self {
            identities,
            tallies: BTreeMap::new(),
        }
    }

    /// Canonical nickname for `nickname`; unmapped names stand for themselves.
    fn canonical<'a>(&'a self, nickname: &'a str) -> &'a str {
        self.identities
            .resolve(nickname)
            .map(|id| id.nickname.as_str())
            .unwrap_or(nickname)
    }

    fn tally(&mut self, nickname: &str) -> &mut PlayerTally {
        let key = self.canonical(nickname).to_string();
        self.tallies.entry(key).or_default()
    }

    /// Fold one countable session into the counters.
    ///
    /// Only decided matches contribute; a player gets one game per session no
    /// matter how many matches it played, even under two nicknames.
    pub fn add_session(&mut self, session: &ServerSession) {
        let played: BTreeSet<String> = session_players(session)
            .into_iter()
            .map(|n| self.canonical(n).to_string())
            .collect();
        for nickname in &played {
            self.tally(nickname).games += 1;
        }

        for m in session.decided_matches() {
            for winner in m.surviving_winners() {
                self.tally(winner).wins += 1;
            }
            for winner in m.dead_winners() {
                self.tally(winner).dead_wins += 1;
            }
            for record in &m.records {
                self.tally(&record.victim).deaths += 1;
                if let Some(killer) = &record.killer {
                    self.tally(killer).kills += 1;
                }
            }
        }
    }

    pub fn tallies(&self) -> &BTreeMap<String, PlayerTally> {
        &self.tallies
    }

    /// Score, sort and number the table.
    ///
    /// Order: score descending, kills descending, nickname ascending.
    pub fn ranked(&self, weights: &ScoreWeights) -> Vec<HighscoreEntry> {
        let mut entries: Vec<HighscoreEntry> = self
            .tallies
            .iter()
            .map(|(nickname, tally)| {
                let identity = self.identities.resolve(nickname);
                HighscoreEntry {
                    nickname: nickname.clone(),
                    uuid: identity.and_then(|id| id.uuid.clone()),
                    score: tally.score(weights),
                    wins: tally.wins,
                    dead_wins: tally.dead_wins,
                    games: tally.games,
                    deaths: tally.deaths,
                    kills: tally.kills,
                    kd: tally.kd(),
                    alt_nicks: identity.map(|id| id.alt_nicks.clone()).unwrap_or_default(),
                    place: 0,
                }
            })
            .collect();

        entries.sort_by(rank_order);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.place = i + 1;
        }
        entries
    }
}

fn rank_order(a: &HighscoreEntry, b: &HighscoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.kills.cmp(&a.kills))
        .then_with(|| a.nickname.cmp(&b.nickname))
}

/// Merge identities over `sessions` and return the ranked table.
pub fn rank_sessions(sessions: &[&ServerSession], weights: &ScoreWeights) -> Vec<HighscoreEntry> {
    let identities = IdentityMap::build(sessions.iter().copied());
    let mut highscore = Highscore::new(&identities);
    for session in sessions {
        highscore.add_session(session);
    }
    let entries = highscore.ranked(weights);
    tracing::debug!(
        "Ranked {} players from {} sessions",
        entries.len(),
        sessions.len()
    );
    entries
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use uhc_core::models::{DeathCause, Match, MatchRecord};

    fn ts(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 5, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record(day: u32, victim: &str, killer: Option<&str>) -> MatchRecord {
        MatchRecord {
            timestamp: ts(day, 21),
            victim: victim.into(),
            killer: killer.map(str::to_string),
            attacker: killer.map(str::to_string),
            cause: DeathCause::Slain,
        }
    }

    /// Red (`red[0]`, `red[1]`) beats Blue (`blue[0]`, `blue[1]`); `red[1]`
    /// dies along the way.
    fn session(day: u32, red: [&str; 2], blue: [&str; 2], uuid_of: impl Fn(&str) -> String) -> ServerSession {
        let mut s = ServerSession::new(ts(day, 20), "1.8");
        for nick in red {
            s.player_entry(nick).uuid = Some(uuid_of(nick));
            s.assign_team("Red", nick);
        }
        for nick in blue {
            s.player_entry(nick).uuid = Some(uuid_of(nick));
            s.assign_team("Blue", nick);
        }
        let mut m = Match::open(s.next_match_id(), ts(day, 20), s.draftable_players());
        m.record_death(record(day, blue[0], Some(red[0])));
        m.record_death(record(day, red[1], Some(blue[1])));
        m.record_death(record(day, blue[1], None));
        m.decide("Red".into(), vec![red[0].into(), red[1].into()], ts(day, 22));
        s.matches.push(m);
        s.stopped_at = Some(ts(day, 23));
        s
    }

    fn uuid(nick: &str) -> String {
        format!("uuid-{}", nick.to_lowercase())
    }

    #[test]
    fn test_single_session_counters_and_score() {
        let s = session(1, ["Alice", "Bob"], ["Carol", "Dave"], uuid);
        let entries = rank_sessions(&[&s], &ScoreWeights::default());

        let alice = entries.iter().find(|e| e.nickname == "Alice").unwrap();
        assert_eq!((alice.wins, alice.dead_wins, alice.kills, alice.deaths), (1, 0, 1, 0));
        assert_eq!(alice.score, 4);
        assert_eq!(alice.kd, None);
        assert_eq!(alice.place, 1);

        let bob = entries.iter().find(|e| e.nickname == "Bob").unwrap();
        assert_eq!((bob.wins, bob.dead_wins, bob.deaths), (0, 1, 1));
        assert_eq!(bob.score, 2);
        assert_eq!(bob.kd, Some(0.0));

        let dave = entries.iter().find(|e| e.nickname == "Dave").unwrap();
        assert_eq!((dave.kills, dave.deaths, dave.games), (1, 1, 1));
        assert_eq!(dave.kd, Some(1.0));
    }

    #[test]
    fn test_ranking_ties_break_on_kills_then_name() {
        let s = session(1, ["Alice", "Bob"], ["Carol", "Dave"], uuid);
        let entries = rank_sessions(&[&s], &ScoreWeights::default());
        let order: Vec<&str> = entries.iter().map(|e| e.nickname.as_str()).collect();
        // Alice 4, Bob 2, Dave 1 (one kill), Carol 0.
        assert_eq!(order, vec!["Alice", "Bob", "Dave", "Carol"]);
        let places: Vec<usize> = entries.iter().map(|e| e.place).collect();
        assert_eq!(places, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_renamed_player_counters_are_summed() {
        let s1 = session(1, ["Bob", "Alice"], ["Carol", "Dave"], uuid);
        let s2 = session(2, ["Bobby", "Alice"], ["Carol", "Dave"], |n| {
            if n == "Bobby" { uuid("Bob") } else { uuid(n) }
        });
        let entries = rank_sessions(&[&s1, &s2], &ScoreWeights::default());

        assert!(entries.iter().all(|e| e.nickname != "Bobby"));
        let bob = entries.iter().find(|e| e.nickname == "Bob").unwrap();
        assert_eq!(bob.alt_nicks, vec!["Bobby".to_string()]);
        assert_eq!(bob.games, 2);
        assert_eq!(bob.wins, 2);
        assert_eq!(bob.kills, 2);
        assert_eq!(bob.uuid.as_deref(), Some("uuid-bob"));
    }

    #[test]
    fn test_custom_weights_change_score() {
        let s = session(1, ["Alice", "Bob"], ["Carol", "Dave"], uuid);
        let weights = ScoreWeights {
            winner: 10,
            dead_winner: 5,
            kill: 2,
            death: -1,
        };
        let entries = rank_sessions(&[&s], &weights);
        let bob = entries.iter().find(|e| e.nickname == "Bob").unwrap();
        assert_eq!(bob.score, 5 - 1);
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        assert!(rank_sessions(&[], &ScoreWeights::default()).is_empty());
    }
}
