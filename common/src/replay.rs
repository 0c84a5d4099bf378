use crate::events::{Position, Side};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeatmapData {
    pub map: String,
    pub points: Vec<HeatmapPoint>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeatmapPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Full state of every player at one sampled tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RadarSnapshot {
    pub tick: i32,
    pub time: f64,
    pub round: u32,
    pub players: Vec<RadarPlayer>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarPlayer {
    #[serde(rename = "steamID")]
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub position: Position,
    pub health: u32,
    pub armor: u32,
    pub money: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    pub is_alive: bool,
}

/// A densely sampled positional frame, joined with the discrete events of the same tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub tick: i32,
    pub time: f64,
    pub round: u32,
    pub clock: String,
    pub players: Vec<FramePlayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<FrameEvent>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePlayer {
    #[serde(rename = "steamID")]
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub position: Position,
    pub is_alive: bool,
    pub health: u32,
    pub armor: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}
