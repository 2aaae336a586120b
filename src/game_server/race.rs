//! Race - Race setup, per-tick state machine and outcome
//!
//! Handles opponent generation, input handling, telemetry and finish detection.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::climate::{ClimateSettings, Weather};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::game_server::competitor::{
    AiProfile, Competitor, CompetitorSnapshot, CompetitorState, Drive,
};
use crate::horse::{Breed, Horse, Sex};

/// Opponents drawn from this pool, alternating lineages
const OPPONENT_POOL: [(&str, Breed, Sex); 6] = [
    ("Centella", Breed::Thoroughbred, Sex::Mare),
    ("Aurora", Breed::Criollo, Sex::Mare),
    ("Relampago", Breed::Thoroughbred, Sex::Stallion),
    ("Canela", Breed::Criollo, Sex::Mare),
    ("Orion", Breed::Thoroughbred, Sex::Stallion),
    ("Bruma", Breed::Criollo, Sex::Mare),
];

const AI_SPEED_VARIANCE_MIN: f32 = -0.25;
const AI_SPEED_VARIANCE_MAX: f32 = 0.6;
const AI_TAP_METER_MIN: f32 = 0.1;
const AI_TAP_METER_MAX: f32 = 0.3;

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Running,
    Finished,
    QuitToMenu,
    QuitProcess,
}

impl RaceStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Player input accumulated between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceInput {
    /// Rhythm tap: raises the tap meter and combo
    Tap,
    /// Drink a water ration
    Water,
    TogglePause,
    QuitToMenu,
    QuitProcess,
}

/// Player speed and energy at a point in race time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub t: f32,
    pub vel: f32,
    pub eng: f32,
}

/// One line of the final ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub position: u32,
    pub name: String,
    pub is_player: bool,
    pub distance: f32,
}

/// Final result handed to the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub status: RaceStatus,
    pub won: bool,
    pub elapsed_time: f32,
    pub ranking: Vec<RankEntry>,
    pub telemetry: Vec<TelemetrySample>,
}

/// Everything needed to start a race
#[derive(Debug, Clone)]
pub struct RaceSetup {
    pub horse: Horse,
    pub weather: Weather,
}

/// Complete race state
pub struct Race {
    config: GameConfig,
    weather: Weather,
    climate: ClimateSettings,
    status: RaceStatus,
    paused: bool,
    /// Player first, then opponents in creation order
    competitors: Vec<CompetitorState>,
    elapsed_time: f32,
    water_left: u32,
    telemetry: Vec<TelemetrySample>,
    next_sample_at: f32,
    ranking: Vec<RankEntry>,
    rng: ChaCha20Rng,
}

impl Race {
    /// Create a race; `rng` drives opponent generation and AI taps
    pub fn new(setup: RaceSetup, config: &GameConfig, mut rng: ChaCha20Rng) -> Self {
        let RaceSetup { mut horse, weather } = setup;
        let climate = weather.climate();

        horse.ensure_energy(config.min_start_energy);
        let player_base = horse.top_speed * horse.terrain_bonus(weather);
        let mut competitors = vec![CompetitorState::new(0, horse, Drive::Player, player_base, 0)];

        for (i, opponent) in Self::generate_opponents(config.opponent_count, &mut rng)
            .into_iter()
            .enumerate()
        {
            let lane = i as u32 + 1;
            let base = opponent.top_speed * opponent.terrain_bonus(weather)
                + rng.gen_range(AI_SPEED_VARIANCE_MIN..AI_SPEED_VARIANCE_MAX);
            let profile = AiProfile::roll(&mut rng);
            let mut state = CompetitorState::new(lane, opponent, Drive::Ai(profile), base, lane);
            state.animation_phase = rng.gen_range(0.0..TAU);
            state.tap_meter = rng.gen_range(AI_TAP_METER_MIN..AI_TAP_METER_MAX);
            competitors.push(state);
        }

        log::debug!(
            "Race created: {} competitors, weather {}, friction {:.2}",
            competitors.len(),
            weather,
            climate.friction
        );

        Self {
            config: config.clone(),
            weather,
            climate,
            status: RaceStatus::Running,
            paused: false,
            competitors,
            elapsed_time: 0.0,
            water_left: config.water_rations,
            telemetry: Vec::new(),
            next_sample_at: 0.0,
            ranking: Vec::new(),
            rng,
        }
    }

    /// Shuffle the pool and take `count` opponents (the pool repeats if needed)
    fn generate_opponents(count: usize, rng: &mut ChaCha20Rng) -> Vec<Horse> {
        let mut pool = OPPONENT_POOL.to_vec();
        pool.shuffle(rng);
        pool.iter()
            .cycle()
            .take(count)
            .map(|(name, breed, sex)| Horse::new(*name, *breed, *sex))
            .collect()
    }

    /// Advance the race by `dt` seconds after applying `inputs`
    pub fn update(&mut self, dt: f32, inputs: &[RaceInput]) -> Result<RaceStatus> {
        if self.status.is_terminal() {
            return Err(GameError::RaceNotRunning);
        }
        if !dt.is_finite() || dt < 0.0 {
            return Err(GameError::InvalidTick { dt });
        }

        for input in inputs {
            match input {
                RaceInput::QuitToMenu => {
                    self.status = RaceStatus::QuitToMenu;
                    return Ok(self.status);
                }
                RaceInput::QuitProcess => {
                    self.status = RaceStatus::QuitProcess;
                    return Ok(self.status);
                }
                RaceInput::TogglePause => self.paused = !self.paused,
                RaceInput::Tap if !self.paused => self.player_tap(),
                RaceInput::Water if !self.paused => self.drink_water(),
                _ => {}
            }
        }
        if self.paused {
            return Ok(self.status);
        }

        self.elapsed_time += dt;
        let config = &self.config;

        for state in &mut self.competitors {
            match state.drive {
                Drive::Player => Competitor::update_player_exertion(state, dt, config),
                Drive::Ai(profile) => {
                    Competitor::update_ai_exertion(state, &profile, dt, config, &mut self.rng);
                }
            }
            Competitor::update(state, dt, &self.climate, config);
        }

        self.record_telemetry();

        if self
            .competitors
            .iter()
            .any(|c| c.distance >= self.config.goal_distance)
        {
            self.finish();
        }

        Ok(self.status)
    }

    /// Taps land as they arrive, so a tap before a pause in the same frame still counts
    fn player_tap(&mut self) {
        let config = &self.config;
        Competitor::tap(
            &mut self.competitors[0],
            config.tap_gain,
            config.tap_energy_cost,
            config,
        );
    }

    fn drink_water(&mut self) {
        let player = &mut self.competitors[0];
        if self.water_left > 0 && !player.horse.is_energy_full() {
            player.horse.recover_energy(self.config.water_energy);
            self.water_left -= 1;
            log::debug!("Water ration used, {} left", self.water_left);
        }
    }

    fn record_telemetry(&mut self) {
        // Small slack so float drift never skips a slot
        if self.elapsed_time + 1e-4 < self.next_sample_at {
            return;
        }
        let player = &self.competitors[0];
        self.telemetry.push(TelemetrySample {
            t: round2(self.elapsed_time),
            vel: round2(player.current_speed),
            eng: round2(player.horse.energy()),
        });
        let interval = self.config.telemetry_interval;
        let slot = ((self.elapsed_time + 1e-4) / interval).floor();
        self.next_sample_at = (slot + 1.0) * interval;
    }

    fn finish(&mut self) {
        self.ranking = Self::rank(&self.competitors);
        self.status = RaceStatus::Finished;
        log::info!(
            "Race finished in {:.2}s, winner {}",
            self.elapsed_time,
            self.ranking.first().map_or("-", |r| r.name.as_str())
        );
    }

    /// Stable sort by distance, furthest first; ties keep creation order
    pub fn rank(competitors: &[CompetitorState]) -> Vec<RankEntry> {
        let mut order: Vec<&CompetitorState> = competitors.iter().collect();
        order.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        order
            .into_iter()
            .enumerate()
            .map(|(i, c)| RankEntry {
                position: i as u32 + 1,
                name: c.name.clone(),
                is_player: c.is_player(),
                distance: c.distance,
            })
            .collect()
    }

    /// Result of the race so far; ranking is empty unless it finished
    pub fn outcome(&self) -> RaceOutcome {
        RaceOutcome {
            status: self.status,
            won: self.ranking.first().is_some_and(|r| r.is_player),
            elapsed_time: self.elapsed_time,
            ranking: self.ranking.clone(),
            telemetry: self.telemetry.clone(),
        }
    }

    /// Get compact snapshot for the presentation layer
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            paused: self.paused,
            weather: self.weather,
            elapsed_time: self.elapsed_time,
            goal_distance: self.config.goal_distance,
            water_left: self.water_left,
            competitors: self.competitors.iter().map(CompetitorSnapshot::from).collect(),
            live_ranking: Self::rank(&self.competitors)
                .into_iter()
                .map(|r| r.name)
                .collect(),
        }
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if !self.status.is_terminal() {
            self.paused = paused;
        }
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn player(&self) -> &CompetitorState {
        &self.competitors[0]
    }

    pub fn competitors(&self) -> &[CompetitorState] {
        &self.competitors
    }

    /// Hand the player's horse back once the race is over
    pub fn into_player_horse(self) -> Option<Horse> {
        self.competitors
            .into_iter()
            .find(CompetitorState::is_player)
            .map(|c| c.horse)
    }

    #[cfg(test)]
    pub(crate) fn competitors_mut(&mut self) -> &mut [CompetitorState] {
        &mut self.competitors
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Compact race snapshot for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub paused: bool,
    pub weather: Weather,
    pub elapsed_time: f32,
    pub goal_distance: f32,
    pub water_left: u32,
    pub competitors: Vec<CompetitorSnapshot>,
    pub live_ranking: Vec<String>,
}
