//! Climate - Weather conditions and track resistance
//!
//! Static table mapping weather to friction and regen multipliers.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Track weather for a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Sunny,
    Rainy,
    Windy,
    Muddy,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Self::Sunny, Self::Rainy, Self::Windy, Self::Muddy];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Rainy => "Rainy",
            Self::Windy => "Windy",
            Self::Muddy => "Muddy",
        }
    }

    pub fn climate(self) -> ClimateSettings {
        match self {
            Self::Sunny => ClimateSettings::new(0.99, 1.05),
            Self::Rainy => ClimateSettings::new(0.96, 0.9),
            Self::Windy => ClimateSettings::new(0.97, 0.95),
            Self::Muddy => ClimateSettings::new(0.94, 0.85),
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weather '{s}'"))
    }
}

/// Friction and regen multipliers for one weather condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSettings {
    /// Multiplies final speed every tick, in (0, 1]
    pub friction: f32,
    /// Scales passive energy recovery
    pub regen: f32,
}

impl ClimateSettings {
    pub const DEFAULT: ClimateSettings = ClimateSettings::new(0.97, 1.0);

    pub const fn new(friction: f32, regen: f32) -> Self {
        Self { friction, regen }
    }

    /// Look up settings by weather name, falling back to [`Self::DEFAULT`]
    pub fn for_name(name: &str) -> Self {
        name.parse::<Weather>()
            .map(Weather::climate)
            .unwrap_or(Self::DEFAULT)
    }
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Menu climate selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClimateChoice {
    Fixed(Weather),
    Random,
}

impl ClimateChoice {
    /// Settle the choice into a concrete weather
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Weather {
        match self {
            Self::Fixed(weather) => weather,
            Self::Random => Weather::ALL[rng.gen_range(0..Weather::ALL.len())],
        }
    }

    pub fn is_random(self) -> bool {
        matches!(self, Self::Random)
    }
}

impl FromStr for ClimateChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(Self::Random);
        }
        s.parse().map(Self::Fixed)
    }
}
