//! Equestrian - Horse racing game core
//!
//! Tap-rhythm race simulation against AI opponents, with weather, horse
//! breeds, persistent rider progress, race history and between-race care.
//! The binary drives it headless; a graphical front end would feed the same
//! [`GameServer`] with key presses.

pub mod care;
pub mod climate;
pub mod config;
pub mod error;
pub mod game_server;
pub mod horse;
pub mod performance;
pub mod progress;
pub mod rider;
pub mod selection;
pub mod storage;

pub use care::{CareAction, CareSession};
pub use climate::{ClimateChoice, ClimateSettings, Weather};
pub use config::GameConfig;
pub use error::{GameError, Result};
pub use game_server::{GameServer, GameState, Pacing, RaceEnd, RaceReport};
pub use horse::{Breed, Horse, Lineage, Sex};
pub use progress::{HistoryEntry, ProgressRecord};
pub use rider::Rider;
pub use selection::RaceSelection;
pub use storage::{HistoryStore, JsonFileStore, MemoryStore, ProgressStore};
