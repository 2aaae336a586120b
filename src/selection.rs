//! Race selection - What the menu hands to the race
//!
//! Pre-filled from the progress record so the last setup is one click away.

use serde::{Deserialize, Serialize};

use crate::climate::ClimateChoice;
use crate::horse::{Breed, Horse, Sex};
use crate::progress::ProgressRecord;
use crate::rider::Rider;

pub const DEFAULT_RIDER_NAME: &str = "Rider";
pub const DEFAULT_HORSE_NAME: &str = "Luna";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSelection {
    pub rider_name: String,
    pub horse_name: String,
    pub breed: Breed,
    pub sex: Sex,
    pub climate: ClimateChoice,
}

impl Default for RaceSelection {
    fn default() -> Self {
        Self {
            rider_name: DEFAULT_RIDER_NAME.into(),
            horse_name: DEFAULT_HORSE_NAME.into(),
            breed: Breed::Thoroughbred,
            sex: Sex::Mare,
            climate: ClimateChoice::Random,
        }
    }
}

impl RaceSelection {
    /// Menu defaults from the last saved race; the climate always opens on random
    pub fn from_progress(progress: &ProgressRecord) -> Self {
        let defaults = Self::default();
        Self {
            rider_name: progress.last_player.clone().unwrap_or(defaults.rider_name),
            horse_name: progress.last_horse.clone().unwrap_or(defaults.horse_name),
            breed: progress.last_horse_breed.unwrap_or(defaults.breed),
            sex: progress.last_horse_sex.unwrap_or(defaults.sex),
            climate: defaults.climate,
        }
    }

    pub fn rider_name(&self) -> &str {
        non_blank(&self.rider_name, DEFAULT_RIDER_NAME)
    }

    pub fn horse_name(&self) -> &str {
        non_blank(&self.horse_name, DEFAULT_HORSE_NAME)
    }

    pub fn build_rider(&self, progress: &ProgressRecord) -> Rider {
        Rider::new(self.rider_name(), progress.experience, progress.points)
    }

    pub fn build_horse(&self) -> Horse {
        Horse::new(self.horse_name(), self.breed, self.sex)
    }

    /// Whether `horse` is the one this selection asks for
    pub fn names_horse(&self, horse: &Horse) -> bool {
        horse.name == self.horse_name() && horse.breed == self.breed && horse.sex == self.sex
    }
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}
