//! The stateful fold over a match recording, and assembly of the final record.

use common::{
    DetailedEvent, EventData, EventPlayer, HeatmapData, MatchAnalysis, MatchMetadata, MatchSummary,
    PlayerSummary, RoundSummary,
};

use crate::frames::{self, EventBuckets};
use crate::heatmap::{self, EventKind, HeatMap};
use crate::players::{Involvement, PlayerTable, RoundLedger};
use crate::rounds::{self, RoundClassifier, RoundEnd, RoundTag};
use crate::snapshots::SnapshotSampler;
use crate::summary::{self, PlayerMetrics};
use crate::telemetry::{PlayerRef, Position, Recording, Side, SourceError, TelemetryEvent, TelemetrySource};

/// Countdown shown for a freshly planted bomb.
const BOMB_TIMER_SECS: f64 = 40.0;

pub struct Config {
    pub heatmap: heatmap::Config,
    pub frames: frames::Config,
    /// Ticks between two radar snapshots of the first pass. `0` disables them.
    pub snapshot_interval: i32,
    /// Run the second, frame-by-frame pass.
    pub extract_frames: bool,
    /// Player to produce a deep-dive analysis for.
    pub target_player: Option<u64>,
    pub map_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heatmap: heatmap::Config::default(),
            frames: frames::Config::default(),
            snapshot_interval: 512,
            extract_frames: false,
            target_player: None,
            map_name: "unknown".to_owned(),
        }
    }
}

#[derive(Debug)]
pub enum AnalysisError {
    /// The recording could not be opened.
    Open(SourceError),
}

impl From<SourceError> for AnalysisError {
    fn from(value: SourceError) -> Self {
        Self::Open(value)
    }
}

impl core::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Open(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(e) => Some(e),
        }
    }
}

/// Coarse bomb site guess from the planting height.
pub fn guess_bomb_site(position: &Position) -> &'static str {
    if position.z < 100.0 {
        "A"
    } else {
        "B"
    }
}

/// Formats seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn event_player(player: Option<&PlayerRef>) -> EventPlayer {
    match player {
        Some(p) => EventPlayer {
            name: p.name.clone(),
            steam_id: p.steam_id,
            position: p.position,
            team: p.team,
        },
        None => EventPlayer::default(),
    }
}

/// Analysis context for a single run. Owns every piece of match state.
pub struct Engine<'c> {
    config: &'c Config,
    rounds: RoundClassifier,
    players: PlayerTable,
    ledger: RoundLedger,
    heatmap: HeatMap,
    sampler: SnapshotSampler,
    events: Vec<DetailedEvent>,
    buckets: EventBuckets,
    tick: i32,
    time: f64,
}

impl<'c> Engine<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            rounds: RoundClassifier::new(),
            players: PlayerTable::new(),
            ledger: RoundLedger::default(),
            heatmap: HeatMap::new(&config.heatmap),
            sampler: SnapshotSampler::new(config.snapshot_interval),
            events: Vec::new(),
            buckets: EventBuckets::default(),
            tick: 0,
            time: 0.0,
        }
    }

    pub fn rounds(&self) -> &RoundClassifier {
        &self.rounds
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    pub fn heatmap(&self) -> &HeatMap {
        &self.heatmap
    }

    pub fn events(&self) -> &[DetailedEvent] {
        &self.events
    }

    /// Folds every event of the source's current frame, then gives the snapshot
    /// sampler its chance to capture.
    pub fn process_frame<S>(&mut self, source: &mut S)
    where
        S: TelemetrySource + ?Sized,
    {
        self.tick = source.tick();
        self.time = source.time();

        for event in source.take_events() {
            self.handle_event(&*source, event);
        }

        if self.sampler.due(self.tick) {
            let roster = source.roster();
            self.sampler
                .capture(self.tick, self.time, self.rounds.current_round(), &roster);
        }
    }

    pub fn handle_event<S>(&mut self, source: &S, event: TelemetryEvent)
    where
        S: TelemetrySource + ?Sized,
    {
        tracing::trace!(tick = self.tick, ?event, "Event");

        match event {
            TelemetryEvent::RoundStart { ct_score, t_score } => {
                let ct_score = ct_score.or_else(|| source.score(Side::CT));
                let t_score = t_score.or_else(|| source.score(Side::T));

                if self.rounds.round_open() {
                    tracing::debug!(tick = self.tick, "Round started before the previous one ended");
                    self.finish_round(None);
                }

                self.rounds.round_start(self.tick, ct_score, t_score);
                let round = self.rounds.current_round();
                self.log(EventData::RoundStart { round });
            }
            TelemetryEvent::RoundEnd { winner, reason } => {
                let round = self.rounds.current_round();
                let reason = rounds::win_reason(reason);

                self.log(EventData::RoundEnd {
                    round,
                    winner,
                    reason,
                });
                self.buckets.push(self.tick, "round_end", None, None);

                self.finish_round(Some(RoundEnd {
                    tick: self.tick,
                    winner,
                    reason: Some(reason),
                    ct_score: source.score(Side::CT),
                    t_score: source.score(Side::T),
                }));
            }
            TelemetryEvent::Kill {
                killer,
                victim,
                assister,
                weapon,
                headshot,
            } => {
                if let Some(k) = killer.as_ref() {
                    self.heatmap.add_point(k.position, EventKind::Kill);
                }
                if let Some(v) = victim.as_ref() {
                    self.heatmap.add_point(v.position, EventKind::Death);
                }
                if let (Some(k), Some(_)) = (killer.as_ref(), victim.as_ref()) {
                    self.buckets
                        .push(self.tick, "kill", Some(k.position), Some(&k.name));
                }

                if self.rounds.record_kill(weapon.as_deref()) {
                    self.accrue(|ledger| {
                        ledger.involvement(killer.as_ref(), Involvement::Killer { headshot });
                        ledger.involvement(victim.as_ref(), Involvement::Victim);
                        ledger.involvement(assister.as_ref(), Involvement::Assister);
                    });
                }

                self.log(EventData::Kill {
                    killer: event_player(killer.as_ref()),
                    victim: event_player(victim.as_ref()),
                    assister: assister.map(|a| a.name).unwrap_or_default(),
                    headshot,
                    weapon: weapon.unwrap_or_else(|| "unknown".to_owned()),
                });
            }
            TelemetryEvent::PlayerDamaged {
                attacker,
                health_damage,
            } => {
                if self.rounds.current_tag().accrues_stats() {
                    self.accrue(|ledger| ledger.damage(attacker.as_ref(), health_damage));
                }
            }
            TelemetryEvent::BombPlanted { player } => {
                let player = match player {
                    Some(p) => p,
                    None => {
                        tracing::debug!(tick = self.tick, "Bomb planted without a planter");
                        return;
                    }
                };

                self.heatmap.add_point(player.position, EventKind::BombPlanted);
                self.buckets.push(
                    self.tick,
                    "bomb_planted",
                    Some(player.position),
                    Some(&player.name),
                );

                self.log(EventData::BombPlanted {
                    site: guess_bomb_site(&player.position).to_owned(),
                    timer: BOMB_TIMER_SECS,
                    player: event_player(Some(&player)),
                });
            }
            TelemetryEvent::BombDefused { player } => {
                let player = match player {
                    Some(p) => p,
                    None => {
                        tracing::debug!(tick = self.tick, "Bomb defused without a defuser");
                        return;
                    }
                };

                self.buckets.push(
                    self.tick,
                    "bomb_defused",
                    Some(player.position),
                    Some(&player.name),
                );
                self.log(EventData::BombDefused {
                    player: event_player(Some(&player)),
                });
            }
            TelemetryEvent::BombExploded { position } => {
                if let Some(position) = position {
                    self.heatmap.add_point(position, EventKind::BombExploded);
                }
                self.log(EventData::BombExploded {
                    position: position.unwrap_or_default(),
                });
            }
        }
    }

    /// Stat contributions are staged while the round is open and applied directly
    /// once it has been finalised as official.
    fn accrue<F>(&mut self, stage: F)
    where
        F: FnOnce(&mut RoundLedger),
    {
        let round = self.rounds.current_round();

        stage(&mut self.ledger);
        match self.rounds.current_tag() {
            RoundTag::Unclassified => {}
            RoundTag::Official => self.ledger.commit(&mut self.players, round),
            RoundTag::Warmup | RoundTag::Knife => {
                self.ledger.discard();
            }
        }
    }

    /// Finalises the current round. `None` closes a round that never saw its end.
    fn finish_round(&mut self, end: Option<RoundEnd>) {
        let record = match end {
            Some(end) => self.rounds.round_end(end),
            None => self.rounds.close_unfinished(self.tick),
        };
        let record = match record {
            Some(r) => r,
            None => return,
        };
        let round = record.round_number;
        let (is_warmup, is_knife) = (record.is_warmup, record.is_knife_round);

        if record.tag() == RoundTag::Official {
            self.ledger.commit(&mut self.players, round);
        } else {
            let dropped = self.ledger.discard();
            tracing::debug!(round, dropped, "Dropped stats of excluded round");
        }

        for event in self.events.iter_mut().rev().take_while(|e| e.round == round) {
            event.is_warmup = is_warmup;
            event.is_knife = is_knife;
        }
    }

    fn log(&mut self, data: EventData) {
        let tag = self.rounds.current_tag();

        self.events.push(DetailedEvent {
            time: self.time,
            tick: self.tick,
            round: self.rounds.current_round(),
            is_warmup: tag == RoundTag::Warmup,
            is_knife: tag == RoundTag::Knife,
            data,
        });
    }

    /// Closes the pass: finalises a round left open by the recording and registers
    /// everyone in the final roster.
    pub fn finish<S>(mut self, source: &S, truncated: bool) -> PassOne
    where
        S: TelemetrySource + ?Sized,
    {
        if self.rounds.round_open() {
            self.finish_round(None);
        }

        for player in source.roster() {
            self.players.observe(Some(&player.player_ref()));
        }

        PassOne {
            rounds: self.rounds,
            players: self.players,
            heatmap: self.heatmap,
            snapshots: self.sampler,
            events: self.events,
            buckets: self.buckets,
            duration: self.time,
            score_ct: source.score(Side::CT).unwrap_or(0),
            score_t: source.score(Side::T).unwrap_or(0),
            truncated,
        }
    }
}

/// Everything accumulated by the event-driven pass.
pub struct PassOne {
    pub rounds: RoundClassifier,
    pub players: PlayerTable,
    pub heatmap: HeatMap,
    snapshots: SnapshotSampler,
    pub events: Vec<DetailedEvent>,
    pub buckets: EventBuckets,
    pub duration: f64,
    pub score_ct: u32,
    pub score_t: u32,
    pub truncated: bool,
}

/// First pass: walks the recording and folds every event into a fresh [`Engine`].
///
/// A decode fault part way through finishes with what has been accumulated so far.
#[tracing::instrument(name = "Events", skip_all)]
pub fn run_events<R>(recording: &R, config: &Config) -> Result<PassOne, AnalysisError>
where
    R: Recording,
{
    let mut source = recording.open()?;
    let mut engine = Engine::new(config);

    let mut truncated = false;
    let mut frame_count = 0usize;
    loop {
        match source.next_frame() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::warn!("Telemetry stopped after {} frames: {}", frame_count, e);
                truncated = true;
                break;
            }
        }
        frame_count += 1;

        let _tracing_guard = tracing::debug_span!("Frame", tick = source.tick()).entered();
        engine.process_frame(&mut source);
    }

    tracing::info!("Processed {} frames", frame_count);

    Ok(engine.finish(&source, truncated))
}

impl PassOne {
    /// Assembles the final record. The heatmap is handed back as well, for callers
    /// that render it.
    pub fn into_parts(self, config: &Config, frames: Vec<common::Frame>) -> (MatchAnalysis, HeatMap) {
        let official_rounds = self.rounds.official_round_count();
        let sorted = self.players.sorted();

        let players: Vec<PlayerSummary> = sorted
            .iter()
            .map(|p| PlayerSummary {
                steam_id: p.steam_id,
                name: p.name.clone(),
                team: p.team,
                kills: p.kills,
                deaths: p.deaths,
                assists: p.assists,
                hs_kills: p.headshot_kills,
                damage: p.damage,
                adr: PlayerMetrics::of(p, official_rounds).adr,
            })
            .collect();

        let (mvp, rating) = match summary::mvp(sorted.iter().copied(), official_rounds) {
            Some((p, rating)) => (p.name.clone(), rating),
            None => ("N/A".to_owned(), 0.0),
        };

        let target_player = config.target_player.and_then(|id| {
            let player = self.players.get(id);
            if player.is_none() {
                tracing::warn!("Requested player {} not found in match", id);
            }
            player.map(|p| summary::target_analysis(p, official_rounds))
        });

        let rounds = self
            .rounds
            .rounds()
            .iter()
            .map(|r| RoundSummary {
                round: r.round_number,
                kills: r.kill_count,
                melee_kills: r.melee_kill_count,
                is_warmup: r.is_warmup,
                is_knife: r.is_knife_round,
                start_tick: r.start_tick,
                end_tick: r.end_tick,
                winner: r.winner,
                reason: r.reason,
            })
            .collect();

        let metadata = MatchMetadata {
            map: config.map_name.clone(),
            duration: format_duration(self.duration),
            rounds: official_rounds,
            score_t: self.score_t,
            score_ct: self.score_ct,
            warmup_rounds: self.rounds.warmup_round_count(),
            knife_round: self.rounds.knife_round_count() > 0,
            source: self.rounds.source_label().to_owned(),
            official_round_start: self.rounds.official_round_start(),
            truncated: self.truncated,
        };

        tracing::info!(
            rounds = official_rounds,
            events = self.events.len(),
            players = players.len(),
            source = %metadata.source,
            warmup = metadata.warmup_rounds,
            "Match analysed"
        );

        let analysis = MatchAnalysis {
            metadata,
            events: self.events,
            players,
            rounds,
            summary: MatchSummary {
                mvp,
                rating,
                target_player,
            },
            heatmap: HeatmapData {
                map: config.map_name.clone(),
                points: self.heatmap.points(),
            },
            radar_replay: self.snapshots.into_snapshots(),
            frames,
        };

        (analysis, self.heatmap)
    }
}

/// Runs both passes over a recording and returns the record together with the
/// heatmap it was built from. The recording is opened a second time for frame
/// extraction when [`Config::extract_frames`] is set.
pub fn analyse_with_heatmap<R>(
    recording: &R,
    config: &Config,
) -> Result<(MatchAnalysis, HeatMap), AnalysisError>
where
    R: Recording,
{
    let pass = run_events(recording, config)?;

    let frames = if config.extract_frames {
        frames::extract(recording, &config.frames, pass.rounds.rounds(), &pass.buckets)?
    } else {
        Vec::new()
    };

    Ok(pass.into_parts(config, frames))
}

/// Runs the full analysis of a recording.
pub fn analyse<R>(recording: &R, config: &Config) -> Result<MatchAnalysis, AnalysisError>
where
    R: Recording,
{
    analyse_with_heatmap(recording, config).map(|(analysis, _)| analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordedEvent, RecordedFrame, RecordedMatch};
    use crate::telemetry::PlayerState;
    use pretty_assertions::assert_eq;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.9), "1:05");
        assert_eq!(format_duration(3600.0), "60:00");
    }

    #[test]
    fn bomb_site_guess() {
        assert_eq!(guess_bomb_site(&Position::new(0.0, 0.0, 12.0)), "A");
        assert_eq!(guess_bomb_site(&Position::new(0.0, 0.0, 160.0)), "B");
    }

    #[test]
    fn missing_player_has_empty_payload() {
        assert_eq!(event_player(None), EventPlayer::default());
    }

    fn players() -> Vec<PlayerState> {
        [(1u64, "alpha", Side::T), (2u64, "bravo", Side::CT)]
            .into_iter()
            .map(|(steam_id, name, team)| PlayerState {
                steam_id,
                name: name.to_owned(),
                team: Some(team),
                position: Position::new(steam_id as f64 * 100.0, 0.0, 0.0),
                health: 100,
                armor: 0,
                money: 800,
                weapon: None,
                is_alive: true,
            })
            .collect()
    }

    fn frame(tick: i32, ct: u32, t: u32, events: Vec<RecordedEvent>) -> RecordedFrame {
        RecordedFrame {
            tick,
            time: None,
            score_ct: Some(ct),
            score_t: Some(t),
            players: players(),
            events,
        }
    }

    fn opening_frame() -> RecordedFrame {
        frame(
            100,
            3,
            2,
            vec![
                RecordedEvent::RoundStart {
                    ct_score: None,
                    t_score: None,
                },
                RecordedEvent::Kill {
                    killer: Some(1),
                    victim: Some(2),
                    assister: None,
                    weapon: Some("ak47".to_owned()),
                    headshot: true,
                },
            ],
        )
    }

    #[test]
    fn stats_are_staged_until_round_ends() {
        let recording = RecordedMatch::new(vec![
            opening_frame(),
            frame(
                200,
                3,
                3,
                vec![RecordedEvent::RoundEnd {
                    winner: Some(Side::T),
                    reason: Some(9),
                }],
            ),
        ]);
        let config = Config::default();
        let mut engine = Engine::new(&config);
        let mut source = recording.open().unwrap();

        assert!(source.next_frame().unwrap());
        engine.process_frame(&mut source);

        assert_eq!(engine.rounds().current_round(), 1);
        assert!(engine.rounds().round_open());
        assert_eq!(engine.heatmap().total_intensity(), 2);
        assert_eq!(engine.events().len(), 2);
        assert!(engine.players().get(1).is_none());

        assert!(source.next_frame().unwrap());
        engine.process_frame(&mut source);

        assert!(!engine.rounds().round_open());
        assert_eq!(engine.players().get(1).map(|p| p.kills), Some(1));
        assert_eq!(engine.players().get(2).map(|p| p.deaths), Some(1));
        assert!(engine.events().iter().all(|e| !e.is_warmup));
    }

    #[test]
    fn open_round_at_end_of_stream_keeps_stats() {
        let recording = RecordedMatch::new(vec![opening_frame()]);
        let config = Config::default();
        let mut engine = Engine::new(&config);
        let mut source = recording.open().unwrap();

        while source.next_frame().unwrap() {
            engine.process_frame(&mut source);
        }
        let pass = engine.finish(&source, false);

        assert_eq!(pass.rounds.official_round_count(), 1);
        assert_eq!(pass.rounds.warmup_round_count(), 0);
        assert_eq!(pass.rounds.round(1).and_then(|r| r.end_tick), Some(100));
        assert_eq!(pass.players.get(1).map(|p| p.headshot_kills), Some(1));
        assert_eq!(pass.players.len(), 2);
    }
}
