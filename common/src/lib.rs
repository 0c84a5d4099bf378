pub mod events;
pub mod replay;

pub use events::{DetailedEvent, EventData, EventPlayer, Position, Side, WinReason};
pub use replay::{Frame, FrameEvent, FramePlayer, HeatmapData, HeatmapPoint, RadarPlayer, RadarSnapshot};

/// The complete record produced for one analysed match.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAnalysis {
    pub metadata: MatchMetadata,
    pub events: Vec<DetailedEvent>,
    pub players: Vec<PlayerSummary>,
    pub rounds: Vec<RoundSummary>,
    pub summary: MatchSummary,
    pub heatmap: HeatmapData,
    pub radar_replay: Vec<RadarSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub map: String,
    pub duration: String,
    /// Number of official rounds, warmup and knife rounds excluded.
    pub rounds: u32,
    pub score_t: u32,
    pub score_ct: u32,
    pub warmup_rounds: u32,
    pub knife_round: bool,
    /// `"GC"` or `"Valve"`
    pub source: String,
    pub official_round_start: Option<u32>,
    /// Set when the telemetry stream failed part way through.
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    #[serde(rename = "steamID")]
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub hs_kills: u32,
    pub damage: u32,
    pub adr: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round: u32,
    pub kills: u32,
    pub melee_kills: u32,
    pub is_warmup: bool,
    pub is_knife: bool,
    pub start_tick: i32,
    pub end_tick: Option<i32>,
    pub winner: Option<Side>,
    pub reason: Option<WinReason>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub mvp: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player: Option<PlayerAnalysis>,
}

/// Deep-dive for a single requested player.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnalysis {
    #[serde(rename = "steamID")]
    pub steam_id: u64,
    pub name: String,
    pub team: Option<Side>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub hs_kills: u32,
    pub damage: u32,
    pub adr: f64,
    pub hs_rate: f64,
    pub kd_ratio: f64,
    pub rounds_played: u32,
    pub key_moments: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn player_summary_field_names() {
        let player = PlayerSummary {
            steam_id: 76561198000000001,
            name: "alpha".to_owned(),
            team: Some(Side::T),
            kills: 3,
            deaths: 1,
            assists: 0,
            hs_kills: 2,
            damage: 310,
            adr: 103.25,
        };

        let value = serde_json::to_value(&player).unwrap();
        assert_eq!(value["steamID"], 76561198000000001u64);
        assert_eq!(value["hsKills"], 2);
        assert_eq!(value["team"], "T");
    }

    #[test]
    fn summary_omits_missing_target() {
        let summary = MatchSummary {
            mvp: "N/A".to_owned(),
            rating: 0.0,
            target_player: None,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("targetPlayer").is_none());
    }
}
