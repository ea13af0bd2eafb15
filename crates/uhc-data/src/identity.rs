//! Cross-session player identity.
//!
//! Nicknames that were ever seen with the same uuid belong to one player.
//! Grouping is a union-find over nicknames, so the result is transitive and
//! independent of the order sessions are fed in.

use std::collections::{BTreeMap, BTreeSet};

use uhc_core::models::ServerSession;

/// The merged record for every nickname of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalIdentity {
    pub nickname: String,
    pub uuid: Option<String>,
    /// Other nicknames of the same player, sorted.
    pub alt_nicks: Vec<String>,
}

/// Per-nickname observations gathered before grouping.
#[derive(Debug, Default)]
struct Sighting {
    games: u32,
    uuids: BTreeMap<String, u32>,
}

/// Nicknames that took part in at least one decided match of `session`.
pub fn session_players(session: &ServerSession) -> BTreeSet<&str> {
    session
        .decided_matches()
        .flat_map(|m| m.participants.iter().map(String::as_str))
        .collect()
}

#[derive(Debug, Default)]
pub struct IdentityMap {
    identities: Vec<CanonicalIdentity>,
    by_nickname: BTreeMap<String, usize>,
}

impl IdentityMap {
    /// Group every nickname seen in `sessions`.
    ///
    /// The canonical nickname is the one with the most games (sessions with a
    /// decided match it played in), ties going to the alphabetically first.
    /// The canonical uuid is the one seen in the most sessions, ties the same.
    pub fn build<'a>(sessions: impl IntoIterator<Item = &'a ServerSession>) -> Self {
        let mut sightings: BTreeMap<String, Sighting> = BTreeMap::new();

        for session in sessions {
            let played = session_players(session);
            for (nickname, player) in &session.players {
                let sighting = sightings.entry(nickname.clone()).or_default();
                if played.contains(nickname.as_str()) {
                    sighting.games += 1;
                }
                if let Some(uuid) = &player.uuid {
                    *sighting.uuids.entry(uuid.clone()).or_default() += 1;
                }
            }
        }

        let nicknames: Vec<&String> = sightings.keys().collect();
        let index: BTreeMap<&str, usize> = nicknames
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut sets = DisjointSets::new(nicknames.len());
        let mut first_holder: BTreeMap<&str, usize> = BTreeMap::new();
        for (nickname, sighting) in &sightings {
            let i = index[nickname.as_str()];
            for uuid in sighting.uuids.keys() {
                match first_holder.get(uuid.as_str()) {
                    Some(&j) => sets.union(i, j),
                    None => {
                        first_holder.insert(uuid.as_str(), i);
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..nicknames.len() {
            groups.entry(sets.find(i)).or_default().push(i);
        }

        let mut map = IdentityMap::default();
        for members in groups.values() {
            let canonical = members
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let (sa, sb) = (&sightings[nicknames[a]], &sightings[nicknames[b]]);
                    sa.games
                        .cmp(&sb.games)
                        .then_with(|| nicknames[b].cmp(nicknames[a]))
                })
                .unwrap_or(members[0]);

            let mut uuid_counts: BTreeMap<&str, u32> = BTreeMap::new();
            for &i in members {
                for (uuid, count) in &sightings[nicknames[i]].uuids {
                    *uuid_counts.entry(uuid.as_str()).or_default() += count;
                }
            }
            let uuid = uuid_counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(uuid, _)| uuid.to_string());

            let alt_nicks: Vec<String> = members
                .iter()
                .filter(|&&i| i != canonical)
                .map(|&i| nicknames[i].clone())
                .collect();

            let id = map.identities.len();
            for &i in members {
                map.by_nickname.insert(nicknames[i].clone(), id);
            }
            if !alt_nicks.is_empty() {
                tracing::debug!(
                    "Merged {} with alternates {:?}",
                    nicknames[canonical],
                    alt_nicks
                );
            }
            map.identities.push(CanonicalIdentity {
                nickname: nicknames[canonical].clone(),
                uuid,
                alt_nicks,
            });
        }
        map
    }

    pub fn resolve(&self, nickname: &str) -> Option<&CanonicalIdentity> {
        self.by_nickname
            .get(nickname)
            .map(|&id| &self.identities[id])
    }

    pub fn identities(&self) -> &[CanonicalIdentity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

// ── Union-find ────────────────────────────────────────────────────────────────

struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }

    /// The smaller index becomes the root, keeping roots stable.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
