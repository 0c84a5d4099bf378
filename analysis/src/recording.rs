//! Replayable recordings of already decoded telemetry.
//!
//! A recording is a list of frames in JSON Lines form, one frame per line. Event
//! participants are referenced by steam id and resolved against the roster of the
//! frame they appear in.

use std::sync::Arc;

use crate::telemetry::{
    PlayerRef, PlayerState, Position, Recording, Side, SourceError, TelemetryEvent, TelemetrySource,
};

/// Used for the game clock when a frame does not carry its own time.
pub const DEFAULT_TICK_RATE: f64 = 64.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordedFrame {
    pub tick: i32,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub score_ct: Option<u32>,
    #[serde(default)]
    pub score_t: Option<u32>,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default)]
    pub events: Vec<RecordedEvent>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedEvent {
    RoundStart {
        ct_score: Option<u32>,
        t_score: Option<u32>,
    },
    RoundEnd {
        winner: Option<Side>,
        reason: Option<i32>,
    },
    Kill {
        killer: Option<u64>,
        victim: Option<u64>,
        assister: Option<u64>,
        weapon: Option<String>,
        #[serde(default)]
        headshot: bool,
    },
    PlayerDamaged {
        attacker: Option<u64>,
        health_damage: u32,
    },
    BombPlanted {
        player: Option<u64>,
    },
    BombDefused {
        player: Option<u64>,
    },
    BombExploded {
        position: Option<Position>,
    },
}

impl RecordedEvent {
    fn resolve(self, players: &[PlayerState]) -> TelemetryEvent {
        let lookup = |id: Option<u64>| -> Option<PlayerRef> {
            let id = id?;
            let player = players.iter().find(|p| p.steam_id == id);
            if player.is_none() {
                tracing::debug!("Participant {} missing from roster", id);
            }
            player.map(PlayerState::player_ref)
        };

        match self {
            Self::RoundStart { ct_score, t_score } => TelemetryEvent::RoundStart { ct_score, t_score },
            Self::RoundEnd { winner, reason } => TelemetryEvent::RoundEnd { winner, reason },
            Self::Kill {
                killer,
                victim,
                assister,
                weapon,
                headshot,
            } => TelemetryEvent::Kill {
                killer: lookup(killer),
                victim: lookup(victim),
                assister: lookup(assister),
                weapon,
                headshot,
            },
            Self::PlayerDamaged {
                attacker,
                health_damage,
            } => TelemetryEvent::PlayerDamaged {
                attacker: lookup(attacker),
                health_damage,
            },
            Self::BombPlanted { player } => TelemetryEvent::BombPlanted {
                player: lookup(player),
            },
            Self::BombDefused { player } => TelemetryEvent::BombDefused {
                player: lookup(player),
            },
            Self::BombExploded { position } => TelemetryEvent::BombExploded { position },
        }
    }
}

/// Walks any iterator of decoded frames as a [`TelemetrySource`].
pub struct RecordingSource<I> {
    frames: I,
    current: Option<RecordedFrame>,
}

impl<I> RecordingSource<I>
where
    I: Iterator<Item = Result<RecordedFrame, SourceError>>,
{
    pub fn new(frames: I) -> Self {
        Self {
            frames,
            current: None,
        }
    }
}

impl<I> TelemetrySource for RecordingSource<I>
where
    I: Iterator<Item = Result<RecordedFrame, SourceError>>,
{
    fn next_frame(&mut self) -> Result<bool, SourceError> {
        match self.frames.next() {
            Some(frame) => {
                self.current = Some(frame?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn take_events(&mut self) -> Vec<TelemetryEvent> {
        let frame = match self.current.as_mut() {
            Some(f) => f,
            None => return Vec::new(),
        };

        let events = std::mem::take(&mut frame.events);
        events
            .into_iter()
            .map(|event| event.resolve(&frame.players))
            .collect()
    }

    fn tick(&self) -> i32 {
        self.current.as_ref().map(|f| f.tick).unwrap_or(0)
    }

    fn time(&self) -> f64 {
        match self.current.as_ref() {
            Some(f) => f.time.unwrap_or(f.tick as f64 / DEFAULT_TICK_RATE),
            None => 0.0,
        }
    }

    fn score(&self, side: Side) -> Option<u32> {
        let frame = self.current.as_ref()?;
        match side {
            Side::CT => frame.score_ct,
            Side::T => frame.score_t,
        }
    }

    fn roster(&self) -> Vec<PlayerState> {
        self.current
            .as_ref()
            .map(|f| f.players.clone())
            .unwrap_or_default()
    }
}

/// A recording held in memory. Opening it never fails.
#[derive(Debug, Clone)]
pub struct RecordedMatch {
    frames: Arc<[RecordedFrame]>,
}

impl RecordedMatch {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// Parses a complete JSON Lines recording, failing on the first bad line.
    pub fn from_json_lines(data: &str) -> Result<Self, SourceError> {
        let frames = JsonLines::new(data)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceError::Open(e.to_string()))?;

        Ok(Self::new(frames))
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }
}

pub struct MemoryFrames {
    frames: Arc<[RecordedFrame]>,
    index: usize,
}

impl Iterator for MemoryFrames {
    type Item = Result<RecordedFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.get(self.index)?.clone();
        self.index += 1;
        Some(Ok(frame))
    }
}

impl Recording for RecordedMatch {
    type Source = RecordingSource<MemoryFrames>;

    fn open(&self) -> Result<Self::Source, SourceError> {
        Ok(RecordingSource::new(MemoryFrames {
            frames: self.frames.clone(),
            index: 0,
        }))
    }
}

/// Lazily decodes one frame per non-empty line.
pub struct JsonLines {
    lines: std::vec::IntoIter<String>,
    frame: usize,
}

impl JsonLines {
    fn new(data: &str) -> Self {
        let lines: Vec<String> = data
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_owned())
            .collect();

        Self {
            lines: lines.into_iter(),
            frame: 0,
        }
    }
}

impl Iterator for JsonLines {
    type Item = Result<RecordedFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        let frame = self.frame;
        self.frame += 1;

        Some(
            serde_json::from_str::<RecordedFrame>(&line).map_err(|e| SourceError::Decode {
                frame,
                message: e.to_string(),
            }),
        )
    }
}

/// A JSON Lines recording on disk, re-read for every pass.
#[derive(Debug, Clone)]
pub struct JsonLinesFile {
    path: std::path::PathBuf,
}

impl JsonLinesFile {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self { path: path.into() }
    }
}

impl Recording for JsonLinesFile {
    type Source = RecordingSource<JsonLines>;

    fn open(&self) -> Result<Self::Source, SourceError> {
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| SourceError::Open(format!("{}: {}", self.path.display(), e)))?;

        if data.trim().is_empty() {
            return Err(SourceError::Open(format!(
                "{}: recording is empty",
                self.path.display()
            )));
        }

        Ok(RecordingSource::new(JsonLines::new(&data)))
    }
}
