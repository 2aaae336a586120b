//! Horse - Stamina model, lineages and breeds
//!
//! Energy is only ever changed through [`Energy::consume`] and
//! [`Energy::recover`], which keep it within `[0, 100]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::climate::Weather;

pub const MAX_ENERGY: f32 = 100.0;
const MIN_ENDURANCE_DIVISOR: f32 = 0.1;

/// Horse stamina, clamped to `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Energy(f32);

impl Energy {
    pub const FULL: Energy = Energy(MAX_ENERGY);

    pub fn new(value: f32) -> Self {
        Self(clamp_energy(value))
    }

    pub fn current(self) -> f32 {
        self.0
    }

    /// Drain `amount` scaled down by endurance
    pub fn consume(&mut self, amount: f32, endurance: f32) {
        let drain = amount.max(0.0) / endurance.max(MIN_ENDURANCE_DIVISOR);
        self.0 = clamp_energy(self.0 - drain);
    }

    pub fn recover(&mut self, amount: f32) {
        self.0 = clamp_energy(self.0 + amount.max(0.0));
    }

    pub fn is_full(self) -> bool {
        self.0 >= MAX_ENERGY
    }
}

impl Default for Energy {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<f32> for Energy {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Energy> for f32 {
    fn from(energy: Energy) -> Self {
        energy.0
    }
}

fn clamp_energy(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_ENERGY)
}

/// Base stock a horse descends from; carries the terrain bonus behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lineage {
    Thoroughbred,
    Stock,
}

/// Per-lineage constants
#[derive(Debug, Clone, Copy)]
pub struct LineageProfile {
    pub top_speed: f32,
    pub endurance: f32,
    pub terrain: &'static [(Weather, f32)],
}

const THOROUGHBRED: LineageProfile = LineageProfile {
    top_speed: 9.5,
    endurance: 0.9,
    terrain: &[(Weather::Rainy, 0.94), (Weather::Sunny, 1.06)],
};

const STOCK: LineageProfile = LineageProfile {
    top_speed: 8.0,
    endurance: 1.2,
    terrain: &[(Weather::Muddy, 1.05), (Weather::Windy, 0.97)],
};

impl Lineage {
    pub const fn profile(self) -> &'static LineageProfile {
        match self {
            Self::Thoroughbred => &THOROUGHBRED,
            Self::Stock => &STOCK,
        }
    }

    /// Speed multiplier on the given weather; 1.0 when the lineage has no entry
    pub fn terrain_bonus(self, weather: Weather) -> f32 {
        self.profile()
            .terrain
            .iter()
            .find(|(w, _)| *w == weather)
            .map_or(1.0, |(_, bonus)| *bonus)
    }
}

/// Breeds offered in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breed {
    Thoroughbred,
    Criollo,
    Arabian,
    QuarterHorse,
    Percheron,
}

impl Breed {
    pub const ALL: [Breed; 5] = [
        Self::Thoroughbred,
        Self::Criollo,
        Self::Arabian,
        Self::QuarterHorse,
        Self::Percheron,
    ];

    pub const fn lineage(self) -> Lineage {
        match self {
            Self::Thoroughbred => Lineage::Thoroughbred,
            _ => Lineage::Stock,
        }
    }

    /// One-time (speed, endurance) adjustment applied at creation
    pub const fn stat_delta(self) -> (f32, f32) {
        match self {
            Self::Thoroughbred => (0.0, 0.0),
            Self::Criollo => (0.0, 0.1),
            Self::Arabian => (0.3, 0.0),
            Self::QuarterHorse => (0.4, -0.05),
            Self::Percheron => (-0.4, 0.2),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Thoroughbred => "Thoroughbred",
            Self::Criollo => "Criollo",
            Self::Arabian => "Arabian",
            Self::QuarterHorse => "Quarter Horse",
            Self::Percheron => "Percheron",
        }
    }
}

impl fmt::Display for Breed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Breed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|b| {
                let name: String = b
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == key
            })
            .ok_or_else(|| format!("unknown breed '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Mare,
    Stallion,
}

impl Sex {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mare => "Mare",
            Self::Stallion => "Stallion",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mare" => Ok(Self::Mare),
            "stallion" => Ok(Self::Stallion),
            _ => Err(format!("unknown sex '{s}'")),
        }
    }
}

/// A horse and its stamina
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub name: String,
    pub breed: Breed,
    pub sex: Sex,
    pub top_speed: f32,
    pub endurance: f32,
    pub alive: bool,
    energy: Energy,
}

impl Horse {
    /// Create a horse with its breed's stats at full energy
    pub fn new(name: impl Into<String>, breed: Breed, sex: Sex) -> Self {
        let profile = breed.lineage().profile();
        let (speed_delta, endurance_delta) = breed.stat_delta();
        Self {
            name: name.into(),
            breed,
            sex,
            top_speed: profile.top_speed + speed_delta,
            endurance: profile.endurance + endurance_delta,
            alive: true,
            energy: Energy::FULL,
        }
    }

    pub fn lineage(&self) -> Lineage {
        self.breed.lineage()
    }

    pub fn energy(&self) -> f32 {
        self.energy.current()
    }

    pub fn is_energy_full(&self) -> bool {
        self.energy.is_full()
    }

    pub fn consume_energy(&mut self, amount: f32) {
        self.energy.consume(amount, self.endurance);
    }

    pub fn recover_energy(&mut self, amount: f32) {
        self.energy.recover(amount);
    }

    /// Top up to at least `floor` energy
    pub fn ensure_energy(&mut self, floor: f32) {
        let missing = floor - self.energy();
        if missing > 0.0 {
            self.recover_energy(missing);
        }
    }

    pub fn terrain_bonus(&self, weather: Weather) -> f32 {
        self.lineage().terrain_bonus(weather)
    }

    /// Breed and sex, e.g. "Criollo (Mare)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.breed, self.sex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_scales_by_endurance() {
        let mut horse = Horse::new("Luna", Breed::Thoroughbred, Sex::Mare);
        horse.endurance = 1.2;
        horse.consume_energy(10.0);
        assert!((horse.energy() - (100.0 - 10.0 / 1.2)).abs() < 1e-3);
        assert!((horse.energy() - 91.67).abs() < 0.01);
    }

    #[test]
    fn consume_zero_is_noop() {
        let mut horse = Horse::new("Luna", Breed::Criollo, Sex::Mare);
        horse.consume_energy(40.0);
        let before = horse.energy();
        horse.consume_energy(0.0);
        assert_eq!(horse.energy(), before);
    }

    #[test]
    fn tiny_endurance_is_floored() {
        let mut energy = Energy::FULL;
        energy.consume(1.0, 0.0);
        assert!((energy.current() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn recover_clamps_to_full() {
        let mut horse = Horse::new("Luna", Breed::Arabian, Sex::Stallion);
        horse.consume_energy(12.0);
        horse.recover_energy(500.0);
        assert_eq!(horse.energy(), MAX_ENERGY);
    }

    #[test]
    fn breed_deltas_apply_once() {
        let horse = Horse::new("Tank", Breed::Percheron, Sex::Stallion);
        assert!((horse.top_speed - 7.6).abs() < 1e-5);
        assert!((horse.endurance - 1.4).abs() < 1e-5);

        let qh = Horse::new("Dash", Breed::QuarterHorse, Sex::Mare);
        assert!((qh.top_speed - 8.4).abs() < 1e-5);
        assert!((qh.endurance - 1.15).abs() < 1e-5);
    }

    #[test]
    fn terrain_bonus_per_lineage() {
        assert_eq!(Lineage::Thoroughbred.terrain_bonus(Weather::Sunny), 1.06);
        assert_eq!(Lineage::Thoroughbred.terrain_bonus(Weather::Rainy), 0.94);
        assert_eq!(Lineage::Thoroughbred.terrain_bonus(Weather::Muddy), 1.0);
        assert_eq!(Lineage::Stock.terrain_bonus(Weather::Muddy), 1.05);
        assert_eq!(Lineage::Stock.terrain_bonus(Weather::Windy), 0.97);
        assert_eq!(Lineage::Stock.terrain_bonus(Weather::Sunny), 1.0);
    }

    #[test]
    fn ensure_energy_only_raises() {
        let mut horse = Horse::new("Luna", Breed::Thoroughbred, Sex::Mare);
        horse.consume_energy(90.0);
        horse.ensure_energy(30.0);
        assert!((horse.energy() - 30.0).abs() < 1e-4);
        horse.recover_energy(50.0);
        horse.ensure_energy(30.0);
        assert!((horse.energy() - 80.0).abs() < 1e-4);
    }

    #[test]
    fn parses_breed_names() {
        assert_eq!("quarter-horse".parse::<Breed>(), Ok(Breed::QuarterHorse));
        assert_eq!("Percheron".parse::<Breed>(), Ok(Breed::Percheron));
        assert!("pony".parse::<Breed>().is_err());
        assert_eq!(Horse::new("x", Breed::Criollo, Sex::Mare).label(), "Criollo (Mare)");
    }

    #[test]
    fn energy_serializes_as_number() {
        let json = serde_json::to_string(&Energy::new(150.0)).unwrap();
        assert_eq!(json, "100.0");
        let parsed: Energy = serde_json::from_str("-3.0").unwrap();
        assert_eq!(parsed.current(), 0.0);
    }
}
