//! Dense positional frames, joined by tick with the discrete events of the first pass.

use std::collections::BTreeMap;

use common::{Frame, FrameEvent, FramePlayer, Position};

use crate::rounds::RoundRecord;
use crate::telemetry::{Recording, SourceError, TelemetrySource};

pub struct Config {
    /// Minimum number of ticks between two sampled frames.
    pub stride: i32,
    pub tick_rate: f64,
    /// Length of a round, used for the countdown clock.
    pub round_time_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stride: 2,
            tick_rate: 64.0,
            round_time_secs: 115.0,
        }
    }
}

/// Discrete events of the first pass, keyed by the tick they fired at.
#[derive(Debug, Default)]
pub struct EventBuckets {
    buckets: BTreeMap<i32, Vec<FrameEvent>>,
}

impl EventBuckets {
    pub fn push(&mut self, tick: i32, kind: &str, position: Option<Position>, player: Option<&str>) {
        self.buckets.entry(tick).or_default().push(FrameEvent {
            kind: kind.to_owned(),
            position,
            player: player.map(|p| p.to_owned()),
        });
    }

    pub fn get(&self, tick: i32) -> &[FrameEvent] {
        self.buckets.get(&tick).map(|e| e.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Round number at `tick`, from the start ticks of the classified rounds.
pub fn round_at(rounds: &[RoundRecord], tick: i32) -> u32 {
    rounds.partition_point(|r| r.start_tick <= tick) as u32
}

/// Remaining round time as `mm:ss`, counting down from the start of the round.
pub fn round_clock(config: &Config, round: Option<&RoundRecord>, tick: i32) -> String {
    let round = match round {
        Some(r) => r,
        None => return "00:00".to_owned(),
    };

    let elapsed = (tick - round.start_tick) as f64 / config.tick_rate;
    let remaining = (config.round_time_secs - elapsed).max(0.0) as u32;

    format!("{:02}:{:02}", remaining / 60, remaining % 60)
}

/// Second pass: reopens the recording and samples a frame every `stride` ticks.
///
/// A decode fault part way through ends the pass with the frames collected so far.
#[tracing::instrument(name = "Frames", skip_all)]
pub fn extract<R>(
    recording: &R,
    config: &Config,
    rounds: &[RoundRecord],
    buckets: &EventBuckets,
) -> Result<Vec<Frame>, SourceError>
where
    R: Recording,
{
    let mut source = recording.open()?;

    let mut frames = Vec::new();
    let mut last_tick: Option<i32> = None;
    let mut joined = 0;

    loop {
        match source.next_frame() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::warn!("Frame extraction stopped early: {}", e);
                break;
            }
        }

        let tick = source.tick();
        if last_tick.is_some_and(|last| tick - last < config.stride) {
            continue;
        }
        last_tick = Some(tick);

        let _tracing_guard = tracing::trace_span!("Frame", tick).entered();

        let round = round_at(rounds, tick);
        let record = round.checked_sub(1).and_then(|idx| rounds.get(idx as usize));

        let players = source
            .roster()
            .into_iter()
            .map(|p| FramePlayer {
                steam_id: p.steam_id,
                name: p.name,
                team: p.team,
                position: p.position,
                is_alive: p.is_alive,
                health: p.health,
                armor: p.armor,
                weapon: p.weapon,
            })
            .collect();

        let events = buckets.get(tick).to_vec();
        joined += events.len();

        frames.push(Frame {
            tick,
            time: source.time(),
            round,
            clock: round_clock(config, record, tick),
            players,
            events,
        });
    }

    if joined < buckets.len() {
        tracing::debug!(
            "{} bucketed events fell between sampled frames",
            buckets.len() - joined
        );
    }
    tracing::info!("Extracted {} frames", frames.len());

    Ok(frames)
}
