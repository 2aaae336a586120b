//! Competitor - Per-race state and speed model for one horse
//!
//! The player and the AI share the same speed model; they differ only in
//! what drives their tap meter.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::climate::ClimateSettings;
use crate::config::GameConfig;
use crate::horse::{Horse, MAX_ENERGY};

/// Tap behavior of an AI opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Expected taps per second
    pub tap_rate: f32,
    /// Tap meter gain per tap
    pub tap_gain: f32,
    /// Tap meter decay per second
    pub tap_decay: f32,
}

impl AiProfile {
    /// Roll a profile for a new opponent
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            tap_rate: rng.gen_range(2.4..3.4),
            tap_gain: rng.gen_range(0.15..0.22),
            tap_decay: rng.gen_range(0.6..0.9),
        }
    }
}

/// What moves a competitor's tap meter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Drive {
    Player,
    Ai(AiProfile),
}

/// Complete state for a single competitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorState {
    /// Creation order; also the ranking tie-breaker
    pub id: u32,
    pub name: String,
    pub horse: Horse,
    pub drive: Drive,
    /// Virtual meters from the start line
    pub distance: f32,
    pub current_speed: f32,
    /// Top speed after terrain bonus (and AI variance)
    pub base_speed: f32,
    /// Gait angle in radians, wrapped to a full cycle
    pub animation_phase: f32,
    /// Recent input intensity in [0, 1]
    pub tap_meter: f32,
    pub combo: f32,
    pub lane: u32,
}

impl CompetitorState {
    pub fn new(id: u32, horse: Horse, drive: Drive, base_speed: f32, lane: u32) -> Self {
        Self {
            id,
            name: horse.name.clone(),
            horse,
            drive,
            distance: 0.0,
            current_speed: 0.0,
            base_speed,
            animation_phase: 0.0,
            tap_meter: 0.0,
            combo: 0.0,
            lane,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.drive, Drive::Player)
    }
}

/// Competitor simulation logic
pub struct Competitor;

impl Competitor {
    const PLAYER_GAIT_OFFSET: f32 = 12.0;
    const PLAYER_GAIT_SCALE: f32 = 0.085;
    const AI_GAIT_OFFSET: f32 = 10.0;
    const AI_GAIT_SCALE: f32 = 0.08;
    const AI_TAP_COST_MIN: f32 = 0.7;
    const AI_TAP_COST_MAX: f32 = 1.1;

    /// Register one tap: raise the meter and combo, pay the energy cost
    pub fn tap(state: &mut CompetitorState, gain: f32, energy_cost: f32, config: &GameConfig) {
        state.tap_meter = (state.tap_meter + gain).min(1.0);
        state.combo = (state.combo + 1.0).min(config.combo_max);
        state.horse.consume_energy(energy_cost);
    }

    /// Player exertion for one tick; taps were applied before this call
    pub fn update_player_exertion(state: &mut CompetitorState, dt: f32, config: &GameConfig) {
        state.tap_meter = (state.tap_meter - config.tap_decay * dt).max(0.0);
        state.combo = (state.combo - config.combo_decay * dt).max(0.0);
    }

    /// AI exertion for one tick: decay, then a Bernoulli trial for a tap
    pub fn update_ai_exertion<R: Rng + ?Sized>(
        state: &mut CompetitorState,
        profile: &AiProfile,
        dt: f32,
        config: &GameConfig,
        rng: &mut R,
    ) {
        state.tap_meter = (state.tap_meter - profile.tap_decay * dt).max(0.0);

        let near_goal = config.goal_distance - state.distance < config.ai_goal_boost_range;
        let boost = if near_goal { config.ai_goal_boost } else { 0.0 };
        let tap_chance = f64::from((profile.tap_rate + boost) * dt);

        if rng.gen::<f64>() < tap_chance {
            let cost = config.tap_energy_cost
                * rng.gen_range(Self::AI_TAP_COST_MIN..Self::AI_TAP_COST_MAX);
            Self::tap(state, profile.tap_gain, cost, config);
        } else {
            state.combo = (state.combo - config.combo_decay * dt).max(0.0);
        }
    }

    /// Advance speed, distance and gait for one tick
    pub fn update(
        state: &mut CompetitorState,
        dt: f32,
        climate: &ClimateSettings,
        config: &GameConfig,
    ) {
        let regen_rate = match state.drive {
            Drive::Player => config.player_regen_rate,
            Drive::Ai(_) => config.ai_regen_rate,
        };
        if state.horse.energy() < MAX_ENERGY && state.tap_meter < config.exertion_threshold {
            state
                .horse
                .recover_energy(regen_rate * dt * climate.regen);
        }

        let speed = current_speed(
            state.base_speed,
            speed_factor(state.tap_meter, state.combo, config),
            energy_factor(state.horse.energy()),
            climate.friction,
        );
        state.current_speed = speed;
        state.distance += speed * dt * config.distance_scale;

        let (offset, scale) = match state.drive {
            Drive::Player => (Self::PLAYER_GAIT_OFFSET, Self::PLAYER_GAIT_SCALE),
            Drive::Ai(_) => (Self::AI_GAIT_OFFSET, Self::AI_GAIT_SCALE),
        };
        state.animation_phase = (state.animation_phase + dt * (speed + offset) * scale) % TAU;
    }
}

/// Combo contribution to the speed factor, capped
pub fn combo_bonus(combo: f32, config: &GameConfig) -> f32 {
    (combo * config.combo_step).min(config.combo_bonus_cap)
}

pub fn speed_factor(tap_meter: f32, combo: f32, config: &GameConfig) -> f32 {
    config.speed_factor_base + tap_meter * config.speed_factor_tap + combo_bonus(combo, config)
}

/// Speed multiplier from stamina: 0.5 when empty, 1.0 when full
pub fn energy_factor(energy: f32) -> f32 {
    0.5 + 0.5 * (energy.clamp(0.0, MAX_ENERGY) / MAX_ENERGY)
}

pub fn current_speed(base_speed: f32, speed_factor: f32, energy_factor: f32, friction: f32) -> f32 {
    (base_speed * speed_factor * energy_factor).max(0.0) * friction
}

/// Compact competitor state for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub id: u32,
    pub name: String,
    pub is_player: bool,
    pub distance: f32,
    pub lane: u32,
    pub speed: f32,
    pub animation_phase: f32,
    pub tap_meter: f32,
    pub combo: f32,
    pub energy: f32,
}

impl From<&CompetitorState> for CompetitorSnapshot {
    fn from(state: &CompetitorState) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            is_player: state.is_player(),
            distance: state.distance,
            lane: state.lane,
            speed: state.current_speed,
            animation_phase: state.animation_phase,
            tap_meter: state.tap_meter,
            combo: state.combo,
            energy: state.horse.energy(),
        }
    }
}
