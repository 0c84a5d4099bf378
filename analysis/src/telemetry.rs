//! The interface between the engine and whatever decodes a match recording.
//!
//! A source is walked frame by frame. Every frame has a tick, a game clock, the team
//! scores and the roster as of that tick, plus the discrete events that fired during it.

pub use common::{Position, Side};

/// A participant referenced by an event, captured at the instant the event fired.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRef {
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub position: Position,
    pub is_alive: bool,
}

/// Transient per-player state, as returned by a roster query.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerState {
    pub steam_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: Option<Side>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub armor: u32,
    #[serde(default)]
    pub money: u32,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub is_alive: bool,
}

impl PlayerState {
    pub fn player_ref(&self) -> PlayerRef {
        PlayerRef {
            steam_id: self.steam_id,
            name: self.name.clone(),
            team: self.team,
            position: self.position,
            is_alive: self.is_alive,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    RoundStart {
        ct_score: Option<u32>,
        t_score: Option<u32>,
    },
    RoundEnd {
        winner: Option<Side>,
        reason: Option<i32>,
    },
    Kill {
        killer: Option<PlayerRef>,
        victim: Option<PlayerRef>,
        assister: Option<PlayerRef>,
        weapon: Option<String>,
        headshot: bool,
    },
    PlayerDamaged {
        attacker: Option<PlayerRef>,
        health_damage: u32,
    },
    BombPlanted {
        player: Option<PlayerRef>,
    },
    BombDefused {
        player: Option<PlayerRef>,
    },
    BombExploded {
        position: Option<Position>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The recording could not be opened for a pass.
    Open(String),
    /// The recording stopped decoding part way through.
    Decode { frame: usize, message: String },
}

impl core::fmt::Display for SourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "Opening telemetry source: {}", msg),
            Self::Decode { frame, message } => {
                write!(f, "Decoding frame {}: {}", frame, message)
            }
        }
    }
}

impl std::error::Error for SourceError {}

pub trait TelemetrySource {
    /// Moves to the next frame. `Ok(false)` once the recording is exhausted.
    fn next_frame(&mut self) -> Result<bool, SourceError>;

    /// Drains the events fired during the current frame, in order.
    fn take_events(&mut self) -> Vec<TelemetryEvent>;

    fn tick(&self) -> i32;

    /// Elapsed game time in seconds.
    fn time(&self) -> f64;

    fn score(&self, side: Side) -> Option<u32>;

    fn roster(&self) -> Vec<PlayerState>;
}

/// Something a [`TelemetrySource`] can be (re)opened from, once per pass.
pub trait Recording {
    type Source: TelemetrySource;

    fn open(&self) -> Result<Self::Source, SourceError>;
}
