//! Simulation - Game session and race loop
//!
//! Owns the menu -> race -> results -> care cycle, paces ticks, contains
//! faults at the race-loop boundary and persists progress at race end.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::care::CareSession;
use crate::climate::Weather;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::game_server::input::InputSource;
use crate::game_server::race::{
    Race, RaceInput, RaceOutcome, RaceSetup, RaceSnapshot, RaceStatus,
};
use crate::horse::Horse;
use crate::performance::PerformanceExporter;
use crate::progress::{HistoryEntry, ProgressRecord};
use crate::rider::Rider;
use crate::selection::RaceSelection;
use crate::storage::{HistoryStore, ProgressStore};

/// Session state around the race state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Menu,
    Racing,
    Results,
    Care,
    Exited,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub competitor_count: u32,
    pub game_state: GameState,
}

/// How the race loop measures time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pacing {
    /// Constant `1 / tick_rate` steps, no sleeping
    Fixed,
    /// Wall-clock deltas, sleeping to the frame budget
    Realtime,
}

/// What the player sees after a completed race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceReport {
    pub outcome: RaceOutcome,
    pub rider: Rider,
    pub horse_name: String,
    pub weather: Weather,
    pub best_time: Option<f32>,
    pub ranking_lines: Vec<String>,
    pub chart: Option<std::path::PathBuf>,
}

/// How a race attempt ended
#[derive(Debug, Clone)]
pub enum RaceEnd {
    Completed(Box<RaceReport>),
    /// Player left to the menu; nothing persisted
    ReturnedToMenu,
    /// Fault inside the race loop; nothing persisted
    Abandoned(String),
    /// Process quit requested
    Quit,
}

struct ActiveRace {
    race: Race,
    rider: Rider,
    weather: Weather,
}

/// Main game session
pub struct GameServer<S> {
    config: GameConfig,
    store: S,
    exporter: Box<dyn PerformanceExporter>,
    state: GameState,
    progress: ProgressRecord,
    active: Option<ActiveRace>,
    /// Horse from the last race, kept for care and reuse
    stable: Option<Horse>,
    last_report: Option<RaceReport>,
    /// Recent tick durations for averaging
    tick_times: Vec<f32>,
}

impl<S: ProgressStore + HistoryStore> GameServer<S> {
    const TICK_WINDOW: usize = 60;

    /// Create a session sitting at the menu
    pub fn new(config: GameConfig, store: S, exporter: Box<dyn PerformanceExporter>) -> Self {
        let progress = store.load_progress();
        Self {
            config,
            store,
            exporter,
            state: GameState::Menu,
            progress,
            active: None,
            stable: None,
            last_report: None,
            tick_times: Vec::with_capacity(Self::TICK_WINDOW),
        }
    }

    /// Return to the menu, reloading progress; gives the pre-filled selection
    pub fn enter_menu(&mut self) -> RaceSelection {
        self.active = None;
        self.progress = self.store.load_progress();
        self.state = GameState::Menu;
        RaceSelection::from_progress(&self.progress)
    }

    /// Build the horse, rider and race for `selection`
    pub fn start_race(&mut self, selection: &RaceSelection, seed: u64) -> Result<()> {
        if self.state == GameState::Exited {
            return Err(GameError::RaceNotRunning);
        }

        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let weather = selection.climate.resolve(&mut rng);
        let horse = match self.stable.take() {
            Some(horse) if selection.names_horse(&horse) => horse,
            _ => selection.build_horse(),
        };
        let rider = selection.build_rider(&self.progress);

        log::info!(
            "Race start: {} on {} [{}], weather {}{}, seed {}",
            rider.name,
            horse.name,
            horse.label(),
            weather,
            if selection.climate.is_random() { " (random)" } else { "" },
            seed
        );

        let race = Race::new(RaceSetup { horse, weather }, &self.config, rng);
        self.active = Some(ActiveRace {
            race,
            rider,
            weather,
        });
        self.state = GameState::Racing;
        Ok(())
    }

    /// Perform a single simulation tick; `Some` once the attempt is over
    pub fn tick(&mut self, dt: f32, inputs: &[RaceInput]) -> Option<RaceEnd> {
        let tick_start = Instant::now();
        let active = match self.active.as_mut() {
            Some(active) => active,
            None => {
                log::warn!("Tick ignored: no race in progress");
                return None;
            }
        };

        let result = catch_unwind(AssertUnwindSafe(|| active.race.update(dt, inputs)));
        self.record_tick_time(tick_start);

        match result {
            Ok(Ok(RaceStatus::Running)) => None,
            Ok(Ok(RaceStatus::Finished)) => Some(self.complete_race()),
            Ok(Ok(RaceStatus::QuitToMenu)) => {
                log::info!("Race left for the menu");
                self.return_horse_to_stable();
                self.state = GameState::Menu;
                Some(RaceEnd::ReturnedToMenu)
            }
            Ok(Ok(RaceStatus::QuitProcess)) => {
                self.quit();
                Some(RaceEnd::Quit)
            }
            Ok(Err(e)) => {
                if !e.is_simulation_fault() {
                    log::warn!("Unexpected error from race tick: {}", e);
                }
                Some(self.abandon(e.to_string()))
            }
            Err(payload) => Some(self.abandon(panic_message(payload.as_ref()))),
        }
    }

    /// Drive the current race to its end, polling `input` every frame
    pub fn run_race(&mut self, input: &mut dyn InputSource, pacing: Pacing) -> RaceEnd {
        let frame = Duration::from_secs_f32(self.config.fixed_dt());
        let mut last = Instant::now();

        loop {
            let Some(snapshot) = self.snapshot() else {
                return RaceEnd::Abandoned("no race in progress".into());
            };

            let dt = match pacing {
                Pacing::Fixed => self.config.fixed_dt(),
                Pacing::Realtime => {
                    let elapsed = last.elapsed();
                    if elapsed < frame {
                        std::thread::sleep(frame - elapsed);
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f32();
                    last = now;
                    dt
                }
            };

            let inputs = match catch_unwind(AssertUnwindSafe(|| input.poll(&snapshot))) {
                Ok(inputs) => inputs,
                Err(payload) => return self.abandon(panic_message(payload.as_ref())),
            };

            if let Some(end) = self.tick(dt, &inputs) {
                return end;
            }
        }
    }

    fn complete_race(&mut self) -> RaceEnd {
        let Some(ActiveRace {
            race,
            mut rider,
            weather,
        }) = self.active.take()
        else {
            return RaceEnd::Abandoned("no race in progress".into());
        };

        let outcome = race.outcome();
        let Some(horse) = race.into_player_horse() else {
            return self.abandon("race lost its player".into());
        };

        if outcome.won {
            rider.award_win(self.config.win_bonus);
        }
        self.progress
            .record_race(&rider, &horse, weather, &outcome, &self.config);

        if let Err(e) = self.store.save_progress(&self.progress) {
            log::warn!("Error saving progress: {}", e);
        }

        let chart = match self.exporter.export(&self.progress.last_race_perf) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Could not export performance chart: {}", e);
                None
            }
        };

        let entry = HistoryEntry::from_race(&rider, &horse, weather, &outcome);
        if let Err(e) = self.store.append_history(entry) {
            log::warn!("Error appending race history: {}", e);
        }

        log::info!(
            "Race complete: {} in {:.2}s, points {}, best {:?}",
            if outcome.won { "won" } else { "lost" },
            outcome.elapsed_time,
            rider.points,
            self.progress.best_time
        );

        let report = RaceReport {
            ranking_lines: self.progress.last_ranking.clone(),
            best_time: self.progress.best_time,
            horse_name: horse.name.clone(),
            weather,
            rider,
            outcome,
            chart,
        };
        self.stable = Some(horse);
        self.last_report = Some(report.clone());
        self.state = GameState::Results;
        RaceEnd::Completed(Box::new(report))
    }

    fn abandon(&mut self, reason: String) -> RaceEnd {
        log::error!("Race abandoned: {}", reason);
        self.return_horse_to_stable();
        self.state = GameState::Menu;
        RaceEnd::Abandoned(reason)
    }

    /// Drop the active race but keep its horse for the next start
    fn return_horse_to_stable(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(horse) = active.race.into_player_horse() {
                self.stable = Some(horse);
            }
        }
    }

    fn record_tick_time(&mut self, tick_start: Instant) {
        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > Self::TICK_WINDOW {
            self.tick_times.remove(0);
        }
    }

    /// Open care mode on the horse from the last race
    pub fn care(&mut self) -> Option<CareSession<'_>> {
        if !matches!(self.state, GameState::Results | GameState::Care) {
            return None;
        }
        let horse = self.stable.as_mut()?;
        self.state = GameState::Care;
        Some(CareSession::new(horse))
    }

    /// Pause the running race
    pub fn pause(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.race.set_paused(true);
        }
    }

    /// Resume the running race
    pub fn resume(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.race.set_paused(false);
        }
    }

    /// End the session
    pub fn quit(&mut self) {
        log::info!("Session closed");
        self.active = None;
        self.state = GameState::Exited;
    }

    /// Get current race snapshot
    pub fn snapshot(&self) -> Option<RaceSnapshot> {
        self.active.as_ref().map(|a| a.race.snapshot())
    }

    pub fn last_report(&self) -> Option<&RaceReport> {
        self.last_report.as_ref()
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn stable(&self) -> Option<&Horse> {
        self.stable.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            tick_rate: self.config.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            competitor_count: self
                .active
                .as_ref()
                .map(|a| a.race.competitors().len() as u32)
                .unwrap_or(0),
            game_state: self.state,
        }
    }

    /// Get current game state
    pub fn get_state(&self) -> GameState {
        self.state
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during race tick".to_string()
    };
    GameError::SimulationFault(detail).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateChoice;
    use crate::game_server::input::{IdleInput, RhythmTapper};
    use crate::performance::NoChart;
    use crate::storage::MemoryStore;

    struct PanickingInput;

    impl InputSource for PanickingInput {
        fn name(&self) -> &str {
            "panicking"
        }

        fn poll(&mut self, snapshot: &RaceSnapshot) -> Vec<RaceInput> {
            if snapshot.elapsed_time > 1.0 {
                panic!("input device unplugged");
            }
            Vec::new()
        }
    }

    fn short_config() -> GameConfig {
        GameConfig {
            goal_distance: 300.0,
            ..Default::default()
        }
    }

    fn server() -> GameServer<MemoryStore> {
        GameServer::new(short_config(), MemoryStore::new(500), Box::new(NoChart))
    }

    fn selection() -> RaceSelection {
        RaceSelection {
            rider_name: "Ana".into(),
            climate: ClimateChoice::Fixed(crate::climate::Weather::Sunny),
            ..Default::default()
        }
    }

    #[test]
    fn completed_race_persists_progress() {
        let mut server = server();
        server.start_race(&selection(), 42).unwrap();
        assert_eq!(server.get_state(), GameState::Racing);
        assert_eq!(server.get_stats().competitor_count, 4);

        let end = server.run_race(&mut RhythmTapper::new(4.0), Pacing::Fixed);
        let RaceEnd::Completed(report) = end else {
            panic!("race should complete, got {end:?}");
        };

        assert_eq!(server.get_state(), GameState::Results);
        assert_eq!(server.store().save_count(), 1);
        assert_eq!(server.store().load_history().len(), 1);
        let saved = server.store().load_progress();
        assert_eq!(saved.last_player.as_deref(), Some("Ana"));
        assert_eq!(saved.last_ranking.len(), 4);
        assert_eq!(saved.points, if report.outcome.won { 100 } else { 0 });
        assert_eq!(saved.best_time.is_some(), report.outcome.won);
    }

    #[test]
    fn quit_to_menu_persists_nothing() {
        let mut server = server();
        server.start_race(&selection(), 1).unwrap();
        assert!(server.tick(1.0 / 60.0, &[RaceInput::Tap]).is_none());
        let end = server.tick(1.0 / 60.0, &[RaceInput::QuitToMenu]);
        assert!(matches!(end, Some(RaceEnd::ReturnedToMenu)));
        assert_eq!(server.get_state(), GameState::Menu);
        assert_eq!(server.store().save_count(), 0);
    }

    #[test]
    fn quit_process_exits_session() {
        let mut server = server();
        server.start_race(&selection(), 1).unwrap();
        let end = server.tick(1.0 / 60.0, &[RaceInput::QuitProcess]);
        assert!(matches!(end, Some(RaceEnd::Quit)));
        assert_eq!(server.get_state(), GameState::Exited);
        assert!(server.start_race(&selection(), 2).is_err());
    }

    #[test]
    fn faulty_tick_abandons_race() {
        let mut server = server();
        server.start_race(&selection(), 1).unwrap();
        let end = server.tick(f32::INFINITY, &[]);
        assert!(matches!(end, Some(RaceEnd::Abandoned(_))));
        assert_eq!(server.get_state(), GameState::Menu);
        assert!(server.snapshot().is_none());
        assert_eq!(server.store().save_count(), 0);
    }

    #[test]
    fn panic_in_loop_is_contained() {
        let mut server = server();
        server.start_race(&selection(), 1).unwrap();
        let end = server.run_race(&mut PanickingInput, Pacing::Fixed);
        match end {
            RaceEnd::Abandoned(reason) => assert!(reason.contains("unplugged")),
            other => panic!("expected abandonment, got {other:?}"),
        }
        assert_eq!(server.store().save_count(), 0);
        assert!(server.store().load_history().is_empty());
    }

    #[test]
    fn failed_save_is_not_fatal() {
        let mut server = server();
        server.store().set_fail_writes(true);
        server.start_race(&selection(), 7).unwrap();
        let end = server.run_race(&mut IdleInput, Pacing::Fixed);
        assert!(matches!(end, RaceEnd::Completed(_)));
        assert_eq!(server.get_state(), GameState::Results);
        assert!(server.last_report().is_some());
    }

    #[test]
    fn cared_horse_is_reused() {
        let mut server = server();
        server.start_race(&selection(), 3).unwrap();
        server.run_race(&mut IdleInput, Pacing::Fixed);

        let endurance = {
            let mut care = server.care().expect("care after results");
            care.apply(crate::care::CareAction::Groom).unwrap();
            care.horse().endurance
        };
        assert_eq!(server.get_state(), GameState::Care);

        let next = server.enter_menu();
        assert_eq!(next.rider_name, "Ana");
        server.start_race(&next, 4).unwrap();
        let player = server.snapshot().unwrap();
        assert!(player.competitors[0].is_player);
        server.pause();
        assert!(server.snapshot().unwrap().paused);
        server.resume();

        let RaceEnd::Completed(_) = server.run_race(&mut IdleInput, Pacing::Fixed) else {
            panic!("second race should complete");
        };
        assert!((server.stable().unwrap().endurance - endurance).abs() < 1e-6);
    }

    #[test]
    fn unfinished_race_keeps_the_horse() {
        let mut server = server();
        server.start_race(&selection(), 5).unwrap();
        server.run_race(&mut IdleInput, Pacing::Fixed);
        {
            let mut care = server.care().expect("care after results");
            care.apply(crate::care::CareAction::Groom).unwrap();
        }
        let groomed = server.stable().unwrap().endurance;

        server.start_race(&selection(), 6).unwrap();
        let end = server.tick(1.0 / 60.0, &[RaceInput::QuitToMenu]);
        assert!(matches!(end, Some(RaceEnd::ReturnedToMenu)));
        assert_eq!(server.stable().unwrap().endurance, groomed);

        server.start_race(&selection(), 7).unwrap();
        let end = server.tick(f32::NAN, &[]);
        assert!(matches!(end, Some(RaceEnd::Abandoned(_))));
        assert_eq!(server.stable().unwrap().endurance, groomed);

        server.start_race(&selection(), 8).unwrap();
        assert!(server.stable().is_none());
        assert_eq!(server.store().save_count(), 1);
    }

    #[test]
    fn care_needs_results() {
        let mut server = server();
        assert!(server.care().is_none());
    }
}
