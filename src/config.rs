//! Game Config - Tuning constants for the race simulation
//!
//! Built once at startup (defaults, optionally overridden by a JSON file)
//! and passed by reference to the race and the session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Immutable tuning values for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Target ticks per second
    pub tick_rate: f32,
    /// Virtual meters needed to win
    pub goal_distance: f32,
    /// Virtual meters per unit of speed per second
    pub distance_scale: f32,
    /// Number of AI opponents
    pub opponent_count: usize,

    /// Tap meter gain per player tap
    pub tap_gain: f32,
    /// Tap meter decay per second
    pub tap_decay: f32,
    /// Energy consumed per tap (before endurance)
    pub tap_energy_cost: f32,
    /// Combo decay per second
    pub combo_decay: f32,
    /// Combo ceiling
    pub combo_max: f32,
    /// Speed bonus per combo point
    pub combo_step: f32,
    /// Combo bonus ceiling
    pub combo_bonus_cap: f32,
    /// Speed factor with an empty tap meter
    pub speed_factor_base: f32,
    /// Speed factor contributed by a full tap meter
    pub speed_factor_tap: f32,

    /// Passive regen only applies below this tap meter level
    pub exertion_threshold: f32,
    /// Player passive regen per second
    pub player_regen_rate: f32,
    /// AI passive regen per second
    pub ai_regen_rate: f32,
    /// Energy the player horse is topped up to at race start
    pub min_start_energy: f32,

    /// AI tap probability boost per second near the goal
    pub ai_goal_boost: f32,
    /// Distance from the goal where the AI boost kicks in
    pub ai_goal_boost_range: f32,

    /// Water rations per race
    pub water_rations: u32,
    /// Energy restored by one ration
    pub water_energy: f32,

    /// Seconds of race time between telemetry samples
    pub telemetry_interval: f32,
    /// Samples kept in the progress record
    pub telemetry_cap: usize,
    /// Entries kept in the history log
    pub history_cap: usize,
    /// Points awarded for a win
    pub win_bonus: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            goal_distance: 3500.0,
            distance_scale: 10.0,
            opponent_count: 3,
            tap_gain: 0.18,
            tap_decay: 0.75,
            tap_energy_cost: 4.0,
            combo_decay: 1.6,
            combo_max: 10.0,
            combo_step: 0.03,
            combo_bonus_cap: 0.35,
            speed_factor_base: 0.55,
            speed_factor_tap: 1.35,
            exertion_threshold: 0.4,
            player_regen_rate: 5.0,
            ai_regen_rate: 4.5 * 0.9,
            min_start_energy: 30.0,
            ai_goal_boost: 0.8,
            ai_goal_boost_range: 260.0,
            water_rations: 2,
            water_energy: 20.0,
            telemetry_interval: 0.2,
            telemetry_cap: 240,
            history_cap: 500,
            win_bonus: 100,
        }
    }
}

impl GameConfig {
    /// Load defaults, overridden by the JSON file at `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config: GameConfig = serde_json::from_str(&raw)?;
                log::info!("Loaded game config from {}", path.display());
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fixed tick delta in seconds
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("tick_rate", self.tick_rate),
            ("goal_distance", self.goal_distance),
            ("distance_scale", self.distance_scale),
            ("telemetry_interval", self.telemetry_interval),
            ("combo_max", self.combo_max),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GameError::InvalidConfig {
                    field,
                    reason: format!("must be positive (got {value})"),
                });
            }
        }
        if self.telemetry_cap == 0 {
            return Err(GameError::InvalidConfig {
                field: "telemetry_cap",
                reason: "must be at least 1".into(),
            });
        }
        if self.history_cap == 0 {
            return Err(GameError::InvalidConfig {
                field: "history_cap",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.exertion_threshold) {
            return Err(GameError::InvalidConfig {
                field: "exertion_threshold",
                reason: format!("must be within [0, 1] (got {})", self.exertion_threshold),
            });
        }
        Ok(())
    }
}
