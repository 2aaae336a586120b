//! Error types shared by the simulation, persistence and session layers.

use thiserror::Error;

/// Errors raised by the game core.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("invalid tick delta {dt}")]
    InvalidTick { dt: f32 },

    #[error("race is not running")]
    RaceNotRunning,

    #[error("no care tickets left")]
    NoCareTickets,

    #[error("simulation fault: {0}")]
    SimulationFault(String),
}

impl GameError {
    /// Faults that abandon the current race instead of bubbling up to the caller.
    pub fn is_simulation_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidTick { .. } | Self::SimulationFault(_) | Self::RaceNotRunning
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
