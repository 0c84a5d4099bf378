//! Per-round classification into warmup, knife and official rounds.

use std::collections::HashMap;

use common::WinReason;

use crate::telemetry::Side;

// https://github.com/markus-wa/demoinfocs-golang/blob/205b0bb25e9f3e96e1d306d154199b4a6292940e/pkg/demoinfocs/events/events.go#L53
pub static ROUND_WIN_REASON: phf::Map<i32, WinReason> = phf::phf_map! {
    0_i32 => WinReason::StillInProgress,
    1_i32 => WinReason::BombExploded,
    2_i32 => WinReason::VipEscaped,
    3_i32 => WinReason::VipKilled,
    4_i32 => WinReason::TSaved,
    5_i32 => WinReason::CtStoppedEscape,
    6_i32 => WinReason::RoundEndReasonTerroristsStopped,
    7_i32 => WinReason::BombDefused,
    8_i32 => WinReason::TKilled,
    9_i32 => WinReason::CTKilled,
    10_i32 => WinReason::Draw,
    11_i32 => WinReason::HostageRescued,
    12_i32 => WinReason::TimeRanOut,
    13_i32 => WinReason::RoundEndReasonHostagesNotRescued,
    14_i32 => WinReason::TerroristsNotEscaped,
    15_i32 => WinReason::VipNotEscaped,
    16_i32 => WinReason::GameStart,
    17_i32 => WinReason::TSurrender,
    18_i32 => WinReason::CTSurrender,
    19_i32 => WinReason::TPlanted,
    20_i32 => WinReason::CTReachedHostage,
};

pub fn win_reason(code: Option<i32>) -> WinReason {
    code.and_then(|c| ROUND_WIN_REASON.get(&c))
        .copied()
        .unwrap_or(WinReason::Unknown)
}

/// Rounds up to this number are warmup once the league format has been detected.
pub const LEAGUE_WARMUP_ROUNDS: u32 = 4;

const KNIFE_ROUND_MIN_MELEE_KILLS: u32 = 3;
const KNIFE_ROUND_MELEE_SHARE: f64 = 0.5;

pub fn is_melee_weapon(weapon: &str) -> bool {
    let weapon = weapon.to_ascii_lowercase();
    weapon.contains("knife") || weapon.contains("bayonet")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTag {
    Warmup,
    Knife,
    Official,
    /// Still running and not yet excluded.
    Unclassified,
}

impl RoundTag {
    /// Whether player statistics accrue for events in a round with this tag.
    pub fn accrues_stats(self) -> bool {
        matches!(self, Self::Official | Self::Unclassified)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub round_number: u32,
    pub kill_count: u32,
    pub melee_kill_count: u32,
    pub is_warmup: bool,
    pub is_knife_round: bool,
    pub start_tick: i32,
    pub end_tick: Option<i32>,
    pub winner: Option<Side>,
    pub reason: Option<WinReason>,
    finalized: bool,
}

impl RoundRecord {
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn tag(&self) -> RoundTag {
        if self.is_warmup {
            RoundTag::Warmup
        } else if self.is_knife_round {
            RoundTag::Knife
        } else if self.finalized {
            RoundTag::Official
        } else {
            RoundTag::Unclassified
        }
    }
}

/// How a round ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundEnd {
    pub tick: i32,
    pub winner: Option<Side>,
    pub reason: Option<WinReason>,
    pub ct_score: Option<u32>,
    pub t_score: Option<u32>,
}

/// The single source of truth for the current round and its classification.
#[derive(Debug, Default)]
pub struct RoundClassifier {
    current_round: u32,
    is_league_warmup_format: bool,
    official_round_start: Option<u32>,
    round_start_score: HashMap<u32, (u32, u32)>,
    rounds: Vec<RoundRecord>,
}

impl RoundClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_league_warmup_format(&self) -> bool {
        self.is_league_warmup_format
    }

    pub fn source_label(&self) -> &'static str {
        if self.is_league_warmup_format {
            "GC"
        } else {
            "Valve"
        }
    }

    pub fn official_round_start(&self) -> Option<u32> {
        self.official_round_start
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn round(&self, number: u32) -> Option<&RoundRecord> {
        let idx = number.checked_sub(1)?;
        self.rounds.get(idx as usize)
    }

    fn current_mut(&mut self) -> Option<&mut RoundRecord> {
        let idx = self.current_round.checked_sub(1)?;
        self.rounds.get_mut(idx as usize)
    }

    /// Whether the current round has started and not ended yet.
    pub fn round_open(&self) -> bool {
        self.round(self.current_round)
            .map(|r| !r.finalized)
            .unwrap_or(false)
    }

    /// Tag of the round events are currently attributed to. Everything before the
    /// first round start belongs to round 0, which is always warmup.
    pub fn current_tag(&self) -> RoundTag {
        match self.round(self.current_round) {
            Some(r) => r.tag(),
            None => RoundTag::Warmup,
        }
    }

    /// Opens the next round. Missing scores count as `0`.
    pub fn round_start(&mut self, tick: i32, ct_score: Option<u32>, t_score: Option<u32>) -> RoundTag {
        self.current_round += 1;
        let round = self.current_round;

        let scores = (ct_score.unwrap_or(0), t_score.unwrap_or(0));
        self.round_start_score.insert(round, scores);

        if round <= LEAGUE_WARMUP_ROUNDS && scores == (0, 0) && !self.is_league_warmup_format {
            tracing::debug!(round, "Detected league warmup format");
            self.is_league_warmup_format = true;
        }

        let is_warmup =
            round == 0 || (self.is_league_warmup_format && round <= LEAGUE_WARMUP_ROUNDS);

        self.rounds.push(RoundRecord {
            round_number: round,
            kill_count: 0,
            melee_kill_count: 0,
            is_warmup,
            is_knife_round: false,
            start_tick: tick,
            end_tick: None,
            winner: None,
            reason: None,
            finalized: false,
        });

        tracing::trace!(round, ?scores, is_warmup, "Round started");

        self.current_tag()
    }

    /// Counts a kill towards the current round. Returns whether stats should accrue for it.
    pub fn record_kill(&mut self, weapon: Option<&str>) -> bool {
        let tag = self.current_tag();
        if !tag.accrues_stats() {
            return false;
        }

        if let Some(round) = self.current_mut().filter(|r| !r.finalized) {
            round.kill_count += 1;
            if weapon.map(is_melee_weapon).unwrap_or(false) {
                round.melee_kill_count += 1;
            }
        }

        true
    }

    /// Resolves the final classification of the current round.
    ///
    /// Returns `None` if there is no open round to finalise.
    pub fn round_end(&mut self, end: RoundEnd) -> Option<&RoundRecord> {
        self.finalize(end, true)
    }

    /// Closes a round that never saw its end, because the next round started or the
    /// recording stopped. The score has not moved yet, so only the provisional warmup
    /// tag and knife detection apply.
    pub fn close_unfinished(&mut self, tick: i32) -> Option<&RoundRecord> {
        self.finalize(
            RoundEnd {
                tick,
                ..Default::default()
            },
            false,
        )
    }

    fn finalize(&mut self, end: RoundEnd, ended: bool) -> Option<&RoundRecord> {
        let round = self.current_round;
        let league_format = self.is_league_warmup_format;
        let start_score = self.round_start_score.get(&round).copied();

        let record = match self.current_mut() {
            Some(r) if !r.finalized => r,
            _ => {
                tracing::debug!(round, "Round end without an open round");
                return None;
            }
        };

        let kills = record.kill_count;
        let melee = record.melee_kill_count;
        record.is_knife_round = melee >= KNIFE_ROUND_MIN_MELEE_KILLS
            && kills > 0
            && (melee as f64 / kills as f64) > KNIFE_ROUND_MELEE_SHARE;

        if league_format && round <= LEAGUE_WARMUP_ROUNDS {
            record.is_warmup = true;
        } else if ended && !record.is_warmup && kills > 0 {
            let after = (end.ct_score.unwrap_or(0), end.t_score.unwrap_or(0));
            if start_score == Some(after) {
                tracing::debug!(round, ?after, "Score unchanged after round with kills, treating as warmup");
                record.is_warmup = true;
            }
        }

        if record.is_warmup {
            record.is_knife_round = false;
        }

        record.end_tick = Some(end.tick);
        record.winner = end.winner;
        record.reason = end.reason;
        record.finalized = true;

        let (is_warmup, is_knife) = (record.is_warmup, record.is_knife_round);

        if self.official_round_start.is_none() && !is_warmup && !is_knife {
            self.official_round_start = Some(round);
        }

        tracing::debug!(
            round,
            kills,
            melee,
            ended,
            warmup = is_warmup,
            knife = is_knife,
            "Round finalized"
        );

        self.round(round)
    }

    pub fn rounds_observed(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn warmup_round_count(&self) -> u32 {
        self.rounds.iter().filter(|r| r.is_warmup).count() as u32
    }

    pub fn knife_round_count(&self) -> u32 {
        self.rounds
            .iter()
            .filter(|r| !r.is_warmup && r.is_knife_round)
            .count() as u32
    }

    pub fn official_round_count(&self) -> u32 {
        self.rounds_observed() - self.warmup_round_count() - self.knife_round_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn end(ct: u32, t: u32) -> RoundEnd {
        RoundEnd {
            tick: 0,
            winner: Some(Side::CT),
            reason: Some(WinReason::TKilled),
            ct_score: Some(ct),
            t_score: Some(t),
        }
    }

    #[test]
    fn melee_weapons() {
        assert!(is_melee_weapon("Knife"));
        assert!(is_melee_weapon("knife_karambit"));
        assert!(is_melee_weapon("Bayonet"));
        assert!(!is_melee_weapon("AK-47"));
    }

    #[test]
    fn decodes_win_reason() {
        assert_eq!(win_reason(Some(7)), WinReason::BombDefused);
        assert_eq!(win_reason(Some(99)), WinReason::Unknown);
        assert_eq!(win_reason(None), WinReason::Unknown);
    }

    #[test]
    fn pre_match_is_warmup() {
        let classifier = RoundClassifier::new();
        assert_eq!(classifier.current_round(), 0);
        assert_eq!(classifier.current_tag(), RoundTag::Warmup);
        assert!(!classifier.round_open());
    }

    #[test]
    fn league_format_forces_first_rounds_warmup() {
        let mut classifier = RoundClassifier::new();

        for round in 1..=4 {
            assert_eq!(classifier.round_start(0, Some(0), Some(0)), RoundTag::Warmup);
            assert!(!classifier.record_kill(Some("ak47")));
            let record = classifier.round_end(end(round, 0)).unwrap();
            assert!(record.is_warmup);
        }

        assert!(classifier.is_league_warmup_format());
        assert_eq!(classifier.source_label(), "GC");
        assert_eq!(classifier.warmup_round_count(), 4);
        assert_eq!(classifier.official_round_count(), 0);

        assert_eq!(classifier.round_start(0, Some(0), Some(0)), RoundTag::Unclassified);
        classifier.record_kill(Some("m4a1"));
        classifier.round_end(end(1, 0)).unwrap();
        assert_eq!(classifier.official_round_start(), Some(5));
        assert_eq!(classifier.official_round_count(), 1);
    }

    #[test]
    fn league_format_is_sticky() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, Some(0), Some(0));
        classifier.round_end(end(1, 0));

        classifier.round_start(0, Some(1), Some(0));
        assert!(classifier.is_league_warmup_format());
        assert_eq!(classifier.current_tag(), RoundTag::Warmup);
    }

    #[test]
    fn knife_round_detection() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, Some(3), Some(2));

        for weapon in ["knife", "knife_t", "bayonet", "glock"] {
            assert!(classifier.record_kill(Some(weapon)));
        }

        let record = classifier.round_end(end(4, 2)).unwrap();
        assert!(record.is_knife_round);
        assert!(!record.is_warmup);
        assert_eq!(record.tag(), RoundTag::Knife);

        // kills after the knife round ended do not accrue
        assert!(!classifier.record_kill(Some("glock")));
        assert_eq!(classifier.knife_round_count(), 1);
        assert_eq!(classifier.official_round_start(), None);
    }

    #[test]
    fn two_melee_kills_are_not_a_knife_round() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, Some(5), Some(5));
        classifier.record_kill(Some("knife"));
        classifier.record_kill(Some("knife"));

        let record = classifier.round_end(end(6, 5)).unwrap();
        assert!(!record.is_knife_round);
        assert_eq!(record.tag(), RoundTag::Official);
    }

    #[test]
    fn unchanged_score_with_kills_is_warmup() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, Some(7), Some(3));
        classifier.record_kill(Some("awp"));

        let record = classifier.round_end(end(7, 3)).unwrap();
        assert!(record.is_warmup);
        assert_eq!(classifier.official_round_count(), 0);
    }

    #[test]
    fn unchanged_score_without_kills_stays_official() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, Some(7), Some(3));

        let record = classifier.round_end(end(7, 3)).unwrap();
        assert!(!record.is_warmup);
        assert_eq!(classifier.official_round_start(), Some(1));
    }

    #[test]
    fn unfinished_round_skips_score_check() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(100, Some(3), Some(2));
        classifier.record_kill(Some("ak47"));

        let record = classifier.close_unfinished(900).unwrap();
        assert!(!record.is_warmup);
        assert_eq!(record.end_tick, Some(900));
        assert_eq!(record.reason, None);
        assert_eq!(record.tag(), RoundTag::Official);
        assert_eq!(classifier.official_round_start(), Some(1));
    }

    #[test]
    fn unfinished_league_round_stays_warmup() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(100, Some(0), Some(0));
        classifier.record_kill(Some("glock"));

        assert!(classifier.close_unfinished(900).unwrap().is_warmup);
        assert_eq!(classifier.official_round_count(), 0);
    }

    #[test]
    fn missing_scores_count_as_zero() {
        let mut classifier = RoundClassifier::new();
        classifier.round_start(0, None, None);
        assert!(classifier.is_league_warmup_format());
    }

    #[test]
    fn round_end_is_terminal() {
        let mut classifier = RoundClassifier::new();
        assert!(classifier.round_end(end(0, 0)).is_none());

        classifier.round_start(10, Some(1), Some(1));
        classifier.record_kill(None);
        assert!(classifier.round_end(end(2, 1)).is_some());
        assert!(classifier.round_end(end(2, 1)).is_none());

        let record = classifier.round(1).unwrap();
        assert_eq!(record.kill_count, 1);
        assert_eq!(record.start_tick, 10);
        assert!(record.is_finalized());
    }

    #[test]
    fn categories_partition_rounds() {
        let mut classifier = RoundClassifier::new();

        // league warmup
        for _ in 0..4 {
            classifier.round_start(0, Some(0), Some(0));
            classifier.round_end(end(0, 0));
        }
        // knife
        classifier.round_start(0, Some(0), Some(0));
        for _ in 0..3 {
            classifier.record_kill(Some("knife"));
        }
        classifier.round_end(end(0, 1));
        // official
        classifier.round_start(0, Some(0), Some(1));
        classifier.record_kill(Some("deagle"));
        classifier.round_end(end(1, 1));

        for r in classifier.rounds() {
            assert!(!(r.is_warmup && r.is_knife_round));
        }
        assert_eq!(
            classifier.official_round_count()
                + classifier.warmup_round_count()
                + classifier.knife_round_count(),
            classifier.rounds_observed()
        );
        assert_eq!(
            (
                classifier.warmup_round_count(),
                classifier.knife_round_count(),
                classifier.official_round_count()
            ),
            (4, 1, 1)
        );
    }
}
