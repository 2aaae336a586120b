use equestrian_lib::game_server::{
    GameServer, Pacing, RaceEnd, RaceInput, RhythmTapper, ScriptedInput,
};
use equestrian_lib::performance::{NoChart, SvgChartExporter};
use equestrian_lib::storage::{HistoryStore, JsonFileStore, MemoryStore, ProgressStore};
use equestrian_lib::{Breed, ClimateChoice, GameConfig, ProgressRecord, RaceSelection, Sex, Weather};

fn short_config() -> GameConfig {
    GameConfig {
        goal_distance: 600.0,
        ..Default::default()
    }
}

fn selection(climate: ClimateChoice) -> RaceSelection {
    RaceSelection {
        rider_name: "Ana".into(),
        horse_name: "Tormenta".into(),
        breed: Breed::Criollo,
        sex: Sex::Stallion,
        climate,
    }
}

fn run_once(seed: u64, frames: Vec<Vec<RaceInput>>) -> (Vec<String>, f32) {
    let mut server = GameServer::new(short_config(), MemoryStore::new(500), Box::new(NoChart));
    server
        .start_race(&selection(ClimateChoice::Random), seed)
        .unwrap();
    match server.run_race(&mut ScriptedInput::new(frames), Pacing::Fixed) {
        RaceEnd::Completed(report) => (
            report.outcome.ranking.iter().map(|r| r.name.clone()).collect(),
            report.outcome.elapsed_time,
        ),
        other => panic!("race did not complete: {other:?}"),
    }
}

#[test]
fn same_seed_and_inputs_replay_identically() {
    let frames: Vec<Vec<RaceInput>> = (0..2000)
        .map(|i| if i % 12 == 0 { vec![RaceInput::Tap] } else { Vec::new() })
        .collect();

    let first = run_once(2024, frames.clone());
    let second = run_once(2024, frames);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1.to_bits(), second.1.to_bits());
    assert_eq!(first.0.len(), 4);
}

#[test]
fn full_race_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = short_config();
    let store = JsonFileStore::in_dir(dir.path(), config.history_cap);
    let exporter = Box::new(SvgChartExporter::in_dir(dir.path()));
    let mut server = GameServer::new(config, store, exporter);

    server
        .start_race(&selection(ClimateChoice::Fixed(Weather::Muddy)), 9)
        .unwrap();
    let mut tapper = RhythmTapper::new(5.0).with_water_below(25.0);
    let RaceEnd::Completed(report) = server.run_race(&mut tapper, Pacing::Fixed) else {
        panic!("race should complete");
    };

    let reopened = JsonFileStore::in_dir(dir.path(), 500);
    let progress = reopened.load_progress();
    assert_eq!(progress.last_player.as_deref(), Some("Ana"));
    assert_eq!(progress.last_horse_breed, Some(Breed::Criollo));
    assert_eq!(progress.last_climate, Some(Weather::Muddy));
    assert_eq!(progress.last_ranking, report.ranking_lines);
    assert!(!progress.last_race_perf.is_empty());
    assert!(progress.last_race_perf.len() <= 240);

    let history = reopened.load_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].won, report.outcome.won);
    assert!(history[0].timestamp.is_some());

    let chart = report.chart.expect("chart exported");
    assert!(chart.exists());
}

#[test]
fn wins_accumulate_points_across_races() {
    let seeded = ProgressRecord {
        last_player: Some("Ana".into()),
        points: 300,
        ..Default::default()
    };
    let store = MemoryStore::new(500).with_progress(seeded);
    let mut server = GameServer::new(short_config(), store, Box::new(NoChart));

    let mut wins = 0;
    for seed in 0..3 {
        let menu = server.enter_menu();
        server.start_race(&menu, seed).unwrap();
        if let RaceEnd::Completed(report) =
            server.run_race(&mut RhythmTapper::new(6.0), Pacing::Fixed)
        {
            if report.outcome.won {
                wins += 1;
            }
        }
    }

    let progress = server.store().load_progress();
    assert_eq!(progress.points, 300 + wins * 100);
    assert_eq!(server.store().load_history().len(), 3);
    assert_eq!(progress.best_time.is_some(), wins > 0);
}

#[test]
fn corrupt_save_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::in_dir(dir.path(), 500);
    std::fs::write(store.progress_path(), "{\"points\": \"lots\"").unwrap();

    let mut server = GameServer::new(short_config(), store, Box::new(NoChart));
    let menu = server.enter_menu();
    assert_eq!(menu, RaceSelection::default());
    assert_eq!(server.progress(), &ProgressRecord::default());
}
