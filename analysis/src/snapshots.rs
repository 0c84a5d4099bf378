use common::{RadarPlayer, RadarSnapshot};

use crate::telemetry::PlayerState;

/// Captures a radar snapshot at most once per `interval` ticks.
#[derive(Debug)]
pub struct SnapshotSampler {
    interval: i32,
    last_tick: i32,
    snapshots: Vec<RadarSnapshot>,
}

impl SnapshotSampler {
    pub fn new(interval: i32) -> Self {
        Self {
            interval,
            last_tick: 0,
            snapshots: Vec::new(),
        }
    }

    /// Whether a capture at `tick` would be taken. Lets callers skip the roster query.
    pub fn due(&self, tick: i32) -> bool {
        self.interval > 0 && tick - self.last_tick >= self.interval
    }

    pub fn capture(&mut self, tick: i32, time: f64, round: u32, roster: &[PlayerState]) -> bool {
        if !self.due(tick) {
            return false;
        }
        self.last_tick = tick;

        let players = roster
            .iter()
            .map(|p| RadarPlayer {
                steam_id: p.steam_id,
                name: p.name.clone(),
                team: p.team,
                position: p.position,
                health: p.health,
                armor: p.armor,
                money: p.money,
                weapon: p.weapon.clone(),
                is_alive: p.is_alive,
            })
            .collect();

        tracing::trace!(tick, round, "Radar snapshot");

        self.snapshots.push(RadarSnapshot {
            tick,
            time,
            round,
            players,
        });
        true
    }

    pub fn into_snapshots(self) -> Vec<RadarSnapshot> {
        self.snapshots
    }
}
