use analysis::recording::{JsonLinesFile, RecordedMatch};
use analysis::{analyse, Config};
use common::{EventData, Side, WinReason};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

const ALPHA: u64 = 76561198000000001;

fn recording() -> JsonLinesFile {
    JsonLinesFile::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../testfiles/match.jsonl"))
}

fn config() -> Config {
    Config {
        map_name: "de_test".to_owned(),
        target_player: Some(ALPHA),
        ..Default::default()
    }
}

#[test]
#[traced_test]
fn match_metadata() {
    let result = analyse(&recording(), &config()).unwrap();

    let metadata = &result.metadata;
    assert_eq!(metadata.map, "de_test");
    assert_eq!(metadata.duration, "2:08");
    assert_eq!(metadata.rounds, 3);
    assert_eq!((metadata.score_ct, metadata.score_t), (1, 3));
    assert_eq!(metadata.warmup_rounds, 4);
    assert!(metadata.knife_round);
    assert_eq!(metadata.source, "GC");
    assert_eq!(metadata.official_round_start, Some(6));
    assert!(!metadata.truncated);

    // every observed round lands in exactly one category
    let knife = result.rounds.iter().filter(|r| r.is_knife).count() as u32;
    assert_eq!(
        metadata.rounds + metadata.warmup_rounds + knife,
        result.rounds.len() as u32
    );
    assert!(result.rounds.iter().all(|r| !(r.is_warmup && r.is_knife)));
}

#[test]
#[traced_test]
fn match_players() {
    let result = analyse(&recording(), &config()).unwrap();

    let players: Vec<_> = result
        .players
        .iter()
        .map(|p| {
            (
                p.name.as_str(),
                p.team,
                p.kills,
                p.deaths,
                p.assists,
                p.hs_kills,
                p.damage,
            )
        })
        .collect();

    assert_eq!(
        players,
        vec![
            ("alpha", Some(Side::T), 4, 1, 0, 3, 380),
            ("bravo", Some(Side::T), 0, 1, 1, 0, 0),
            ("charlie", Some(Side::CT), 1, 2, 0, 0, 100),
            ("delta", Some(Side::CT), 1, 2, 0, 0, 50),
        ]
    );

    assert_eq!(result.summary.mvp, "alpha");

    let target = result.summary.target_player.as_ref().unwrap();
    assert_eq!(target.rounds_played, 3);
    assert_eq!(target.hs_rate, 75.0);
    assert_eq!(target.kd_ratio, 4.0);
    assert_eq!(target.key_moments, vec!["4 kills with 75.0% HS rate".to_owned()]);
    assert_eq!(target.recommendations, vec![analysis::summary::REC_KEEP_GOING.to_owned()]);
}

#[test]
#[traced_test]
fn match_rounds() {
    let result = analyse(&recording(), &config()).unwrap();

    assert_eq!(result.rounds.len(), 8);
    assert!(result.rounds[..4].iter().all(|r| r.is_warmup && r.kills == 0));

    let knife = &result.rounds[4];
    assert!(knife.is_knife);
    assert_eq!((knife.kills, knife.melee_kills), (3, 3));

    let round6 = &result.rounds[5];
    assert_eq!(round6.winner, Some(Side::T));
    assert_eq!(round6.reason, Some(WinReason::BombExploded));
    assert_eq!((round6.start_tick, round6.end_tick), (6000, Some(6400)));

    assert_eq!(result.rounds[6].reason, Some(WinReason::BombDefused));
    assert_eq!(result.rounds[7].kills, 2);
}

#[test]
#[traced_test]
fn match_event_log() {
    let result = analyse(&recording(), &config()).unwrap();

    assert_eq!(result.events.len(), 33);
    assert_eq!(result.events.iter().filter(|e| e.is_warmup).count(), 12);
    assert_eq!(result.events.iter().filter(|e| e.is_knife).count(), 5);

    let sites: Vec<_> = result
        .events
        .iter()
        .filter_map(|e| match &e.data {
            EventData::BombPlanted { site, player, .. } => Some((site.as_str(), player.name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(sites, vec![("A", "bravo"), ("B", "alpha")]);

    let assisted = result
        .events
        .iter()
        .find_map(|e| match &e.data {
            EventData::Kill {
                assister, headshot, ..
            } if !assister.is_empty() => Some((e.round, assister.as_str(), *headshot)),
            _ => None,
        })
        .unwrap();
    assert_eq!(assisted, (6, "bravo", true));

    let intensity: u32 = result.heatmap.points.iter().map(|p| p.intensity).sum();
    assert_eq!(intensity, 28);
    assert_eq!(result.heatmap.map, "de_test");

    assert_eq!(result.radar_replay.len(), 8);
    assert_eq!(result.radar_replay[0].round, 1);
    assert_eq!(result.radar_replay[0].players.len(), 4);
}

#[test]
#[traced_test]
fn match_frames() {
    let config = Config {
        extract_frames: true,
        ..config()
    };
    let result = analyse(&recording(), &config).unwrap();

    assert_eq!(result.frames.len(), 31);
    let joined: usize = result.frames.iter().map(|f| f.events.len()).sum();
    assert_eq!(joined, 23);

    let plant = result.frames.iter().find(|f| f.tick == 6300).unwrap();
    assert_eq!(plant.round, 6);
    assert_eq!(plant.clock, "01:50");
    assert_eq!(plant.events[0].kind, "bomb_planted");
    assert_eq!(plant.events[0].player.as_deref(), Some("bravo"));
}

#[test]
fn analysis_is_deterministic() {
    let data = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../testfiles/match.jsonl"
    ))
    .unwrap();
    let in_memory = RecordedMatch::from_json_lines(&data).unwrap();
    let config = Config {
        extract_frames: true,
        ..config()
    };

    let first = analyse(&in_memory, &config).unwrap();
    let second = analyse(&in_memory, &config).unwrap();
    assert_eq!(first, second);

    let from_file = analyse(&recording(), &config).unwrap();
    assert_eq!(first, from_file);
}
