//! Rider - Experience and points carried across races

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    pub name: String,
    /// Persisted between sessions; never changed by a race
    pub experience: u32,
    pub points: u32,
}

impl Rider {
    pub fn new(name: impl Into<String>, experience: u32, points: u32) -> Self {
        Self {
            name: name.into(),
            experience,
            points,
        }
    }

    /// Credit the win bonus
    pub fn award_win(&mut self, bonus: u32) {
        self.points = self.points.saturating_add(bonus);
    }
}
