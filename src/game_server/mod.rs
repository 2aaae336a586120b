//! Game Server Module
//!
//! Race simulation and the session loop around it.

pub mod competitor;
pub mod input;
pub mod race;
pub mod simulation;

pub use competitor::{Competitor, CompetitorSnapshot, CompetitorState};
pub use input::{IdleInput, InputSource, RhythmTapper, ScriptedInput};
pub use race::{Race, RaceInput, RaceOutcome, RaceSetup, RaceSnapshot, RaceStatus, TelemetrySample};
pub use simulation::{GameServer, GameState, Pacing, RaceEnd, RaceReport, ServerStats};
