//! Progress - Cross-race stats and the race history log

use serde::{Deserialize, Serialize};

use crate::climate::Weather;
use crate::config::GameConfig;
use crate::game_server::race::{RaceOutcome, TelemetrySample};
use crate::horse::{Breed, Horse, Sex};
use crate::rider::Rider;

pub const DEFAULT_EXPERIENCE: u32 = 1;

/// Persisted player progress, loaded at menu entry and saved after each race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub last_player: Option<String>,
    pub last_horse: Option<String>,
    pub last_horse_breed: Option<Breed>,
    pub last_horse_sex: Option<Sex>,
    pub experience: u32,
    pub points: u32,
    /// Fastest winning time
    pub best_time: Option<f32>,
    pub last_climate: Option<Weather>,
    pub last_race_perf: Vec<TelemetrySample>,
    pub last_ranking: Vec<String>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            last_player: None,
            last_horse: None,
            last_horse_breed: None,
            last_horse_sex: None,
            experience: DEFAULT_EXPERIENCE,
            points: 0,
            best_time: None,
            last_climate: None,
            last_race_perf: Vec::new(),
            last_ranking: Vec::new(),
        }
    }
}

impl ProgressRecord {
    /// Fold a finished race into the record; `rider` already holds the awarded points
    pub fn record_race(
        &mut self,
        rider: &Rider,
        horse: &Horse,
        weather: Weather,
        outcome: &RaceOutcome,
        config: &GameConfig,
    ) {
        if outcome.won {
            let time = round2(outcome.elapsed_time);
            if self.best_time.map_or(true, |best| time < best) {
                self.best_time = Some(time);
            }
        }

        let keep_from = outcome.telemetry.len().saturating_sub(config.telemetry_cap);
        self.last_race_perf = outcome.telemetry[keep_from..].to_vec();

        self.last_ranking = outcome
            .ranking
            .iter()
            .map(|entry| {
                let you = if entry.is_player { " (you)" } else { "" };
                format!("{}. {}{}", entry.position, entry.name, you)
            })
            .collect();

        self.last_player = Some(rider.name.clone());
        self.last_horse = Some(horse.name.clone());
        self.last_horse_breed = Some(horse.breed);
        self.last_horse_sex = Some(horse.sex);
        self.experience = rider.experience;
        self.points = rider.points;
        self.last_climate = Some(weather);
    }
}

/// One completed race in the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Filled in on append when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub player: String,
    pub points: u32,
    pub horse: String,
    pub sex: Sex,
    pub breed: Breed,
    pub climate: Weather,
    pub time: f32,
    pub won: bool,
}

impl HistoryEntry {
    pub fn from_race(rider: &Rider, horse: &Horse, weather: Weather, outcome: &RaceOutcome) -> Self {
        Self {
            timestamp: None,
            player: rider.name.clone(),
            points: rider.points,
            horse: horse.name.clone(),
            sex: horse.sex,
            breed: horse.breed,
            climate: weather,
            time: round2(outcome.elapsed_time),
            won: outcome.won,
        }
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
