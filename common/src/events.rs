#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Side {
    T,
    CT,
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::T => write!(f, "T"),
            Self::CT => write!(f, "CT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WinReason {
    StillInProgress,
    BombExploded,
    VipEscaped,
    VipKilled,
    TSaved,
    CtStoppedEscape,
    RoundEndReasonTerroristsStopped,
    BombDefused,
    TKilled,
    CTKilled,
    Draw,
    HostageRescued,
    TimeRanOut,
    RoundEndReasonHostagesNotRescued,
    TerroristsNotEscaped,
    VipNotEscaped,
    GameStart,
    TSurrender,
    CTSurrender,
    TPlanted,
    CTReachedHostage,
    Unknown,
}

/// A participant as it appears inside an event payload.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPlayer {
    pub name: String,
    #[serde(rename = "steamID")]
    pub steam_id: u64,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventData {
    RoundStart {
        round: u32,
    },
    RoundEnd {
        round: u32,
        winner: Option<Side>,
        reason: WinReason,
    },
    Kill {
        killer: EventPlayer,
        victim: EventPlayer,
        assister: String,
        headshot: bool,
        weapon: String,
    },
    BombPlanted {
        player: EventPlayer,
        site: String,
        timer: f64,
    },
    BombDefused {
        player: EventPlayer,
    },
    BombExploded {
        position: Position,
    },
}

impl EventData {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundStart { .. } => "round_start",
            Self::RoundEnd { .. } => "round_end",
            Self::Kill { .. } => "kill",
            Self::BombPlanted { .. } => "bomb_planted",
            Self::BombDefused { .. } => "bomb_defused",
            Self::BombExploded { .. } => "bomb_exploded",
        }
    }
}

/// One entry of the match event log.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedEvent {
    pub time: f64,
    pub tick: i32,
    pub round: u32,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub is_warmup: bool,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub is_knife: bool,
    #[serde(flatten)]
    pub data: EventData,
}
