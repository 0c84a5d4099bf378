use std::collections::{BTreeMap, HashMap};

use crate::telemetry::{PlayerRef, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Involvement {
    Killer { headshot: bool },
    Victim,
    Assister,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAccumulator {
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshot_kills: u32,
    pub damage: u32,
    /// Kills per official round, keyed by round number.
    pub round_kills: BTreeMap<u32, u32>,
}

impl PlayerAccumulator {
    fn new(player: &PlayerRef) -> Self {
        Self {
            steam_id: player.steam_id,
            name: player.name.clone(),
            team: player.team,
            ..Default::default()
        }
    }

    fn update_identity(&mut self, player: &PlayerRef) {
        if !player.name.is_empty() {
            self.name.clone_from(&player.name);
        }
        if player.team.is_some() {
            self.team = player.team;
        }
    }
}

/// Running totals per player, keyed by steam id.
#[derive(Debug, Default)]
pub struct PlayerTable {
    players: HashMap<u64, PlayerAccumulator>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&mut self, player: &PlayerRef) -> &mut PlayerAccumulator {
        let entry = self
            .players
            .entry(player.steam_id)
            .or_insert_with(|| PlayerAccumulator::new(player));
        entry.update_identity(player);
        entry
    }

    /// Registers a player without touching any counter.
    pub fn observe(&mut self, player: Option<&PlayerRef>) {
        if let Some(player) = player {
            self.upsert(player);
        }
    }

    pub fn record_involvement(&mut self, player: Option<&PlayerRef>, role: Involvement, round: u32) {
        let player = match player {
            Some(p) => p,
            None => return,
        };

        let entry = self.upsert(player);
        match role {
            Involvement::Killer { headshot } => {
                entry.kills += 1;
                if headshot {
                    entry.headshot_kills += 1;
                }
                *entry.round_kills.entry(round).or_default() += 1;
            }
            Involvement::Victim => entry.deaths += 1,
            Involvement::Assister => entry.assists += 1,
        }
    }

    /// Damage only counts while the attacker is alive.
    pub fn record_damage(&mut self, attacker: Option<&PlayerRef>, amount: u32) {
        let attacker = match attacker {
            Some(a) if a.is_alive => a,
            _ => return,
        };

        let entry = self.upsert(attacker);
        entry.damage += amount;
    }

    pub fn get(&self, steam_id: u64) -> Option<&PlayerAccumulator> {
        self.players.get(&steam_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// All accumulators, ordered by steam id.
    pub fn sorted(&self) -> Vec<&PlayerAccumulator> {
        let mut players: Vec<_> = self.players.values().collect();
        players.sort_unstable_by_key(|p| p.steam_id);
        players
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LedgerEntry {
    Involvement(PlayerRef, Involvement),
    Damage(PlayerRef, u32),
}

/// Stat contributions of a round that has not been classified yet.
///
/// Entries are held back until the round is finalised and are either committed to
/// the [`PlayerTable`] (official round) or dropped (warmup and knife rounds).
#[derive(Debug, Default)]
pub struct RoundLedger {
    entries: Vec<LedgerEntry>,
}

impl RoundLedger {
    pub fn involvement(&mut self, player: Option<&PlayerRef>, role: Involvement) {
        if let Some(player) = player {
            self.entries.push(LedgerEntry::Involvement(player.clone(), role));
        }
    }

    pub fn damage(&mut self, attacker: Option<&PlayerRef>, amount: u32) {
        if let Some(attacker) = attacker.filter(|a| a.is_alive) {
            self.entries.push(LedgerEntry::Damage(attacker.clone(), amount));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn commit(&mut self, table: &mut PlayerTable, round: u32) {
        for entry in self.entries.drain(..) {
            match entry {
                LedgerEntry::Involvement(player, role) => {
                    table.record_involvement(Some(&player), role, round)
                }
                LedgerEntry::Damage(player, amount) => table.record_damage(Some(&player), amount),
            }
        }
    }

    pub fn discard(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
