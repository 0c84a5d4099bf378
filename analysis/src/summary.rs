//! Derived per-player metrics, MVP selection and coaching recommendations.

use common::PlayerAnalysis;

use crate::players::PlayerAccumulator;

pub const LOW_HS_RATE: f64 = 30.0;
pub const LOW_ADR: f64 = 60.0;
pub const LOW_KD: f64 = 1.0;

pub const REC_HEADSHOTS: &str = "Work on crosshair placement to raise your headshot rate";
pub const REC_ADR: &str = "Focus on dealing more damage per round (ADR)";
pub const REC_POSITIONING: &str = "Improve positioning to avoid unnecessary deaths";
pub const REC_CONVERT: &str = "Convert damage into kills - finish your trades";
pub const REC_KEEP_GOING: &str = "Keep up the good performance!";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMetrics {
    pub adr: f64,
    pub hs_rate: f64,
    pub kd_ratio: f64,
    pub rating: f64,
}

pub fn adr(damage: u32, official_rounds: u32) -> f64 {
    if official_rounds == 0 {
        return 0.0;
    }
    damage as f64 / official_rounds as f64
}

pub fn hs_rate(headshot_kills: u32, kills: u32) -> f64 {
    if kills == 0 {
        return 0.0;
    }
    headshot_kills as f64 / kills as f64 * 100.0
}

/// Kills per death, or the plain kill count for a player who never died.
pub fn kd_ratio(kills: u32, deaths: u32) -> f64 {
    if deaths == 0 {
        return kills as f64;
    }
    kills as f64 / deaths as f64
}

pub fn rating(kills: u32, deaths: u32, adr: f64) -> f64 {
    (kills as f64 / deaths.max(1) as f64) * (adr / 100.0)
}

impl PlayerMetrics {
    pub fn of(player: &PlayerAccumulator, official_rounds: u32) -> Self {
        let adr = adr(player.damage, official_rounds);

        Self {
            adr,
            hs_rate: hs_rate(player.headshot_kills, player.kills),
            kd_ratio: kd_ratio(player.kills, player.deaths),
            rating: rating(player.kills, player.deaths, adr),
        }
    }
}

/// Highest rated player. Ties go to the lowest steam id; nobody with a positive
/// rating means there is no MVP.
pub fn mvp<'p, I>(players: I, official_rounds: u32) -> Option<(&'p PlayerAccumulator, f64)>
where
    I: IntoIterator<Item = &'p PlayerAccumulator>,
{
    let mut best: Option<(&PlayerAccumulator, f64)> = None;

    for player in players {
        let rating = PlayerMetrics::of(player, official_rounds).rating;
        if rating <= 0.0 {
            continue;
        }

        let better = match best {
            None => true,
            Some((current, best_rating)) => {
                rating > best_rating || (rating == best_rating && player.steam_id < current.steam_id)
            }
        };
        if better {
            best = Some((player, rating));
        }
    }

    best
}

pub fn recommendations(player: &PlayerAccumulator, metrics: &PlayerMetrics) -> Vec<String> {
    let mut recs = Vec::new();

    if metrics.hs_rate < LOW_HS_RATE {
        recs.push(REC_HEADSHOTS.to_owned());
    }
    if metrics.adr < LOW_ADR {
        recs.push(REC_ADR.to_owned());
    }
    if metrics.kd_ratio < LOW_KD {
        recs.push(REC_POSITIONING.to_owned());
    }
    if player.damage > 0 && player.kills == 0 {
        recs.push(REC_CONVERT.to_owned());
    }

    if recs.is_empty() {
        recs.push(REC_KEEP_GOING.to_owned());
    }

    recs
}

fn multi_kill_name(kills: u32) -> Option<&'static str> {
    match kills {
        0..=2 => None,
        3 => Some("triple kill"),
        4 => Some("quad kill"),
        _ => Some("ace"),
    }
}

pub fn key_moments(player: &PlayerAccumulator, metrics: &PlayerMetrics) -> Vec<String> {
    let mut moments = vec![format!(
        "{} kills with {:.1}% HS rate",
        player.kills, metrics.hs_rate
    )];

    moments.extend(player.round_kills.iter().filter_map(|(round, kills)| {
        multi_kill_name(*kills).map(|name| format!("Round {}: {}", round, name))
    }));

    moments
}

pub fn target_analysis(player: &PlayerAccumulator, official_rounds: u32) -> PlayerAnalysis {
    let metrics = PlayerMetrics::of(player, official_rounds);

    PlayerAnalysis {
        steam_id: player.steam_id,
        name: player.name.clone(),
        team: player.team,
        kills: player.kills,
        deaths: player.deaths,
        assists: player.assists,
        hs_kills: player.headshot_kills,
        damage: player.damage,
        adr: metrics.adr,
        hs_rate: metrics.hs_rate,
        kd_ratio: metrics.kd_ratio,
        rounds_played: official_rounds,
        key_moments: key_moments(player, &metrics),
        recommendations: recommendations(player, &metrics),
    }
}
