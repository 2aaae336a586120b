//! Care mode - Between-race horse care paid for with tickets

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::horse::Horse;

pub const CARE_TICKETS: u32 = 3;
const FEED_ENERGY: f32 = 20.0;
const REST_ENERGY: f32 = 35.0;
const GROOM_ENDURANCE: f32 = 0.1;
const MAX_GROOMED_ENDURANCE: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CareAction {
    /// +20 energy
    Feed,
    /// +0.1 endurance, up to 1.6
    Groom,
    /// +35 energy
    Rest,
}

/// A care visit on one horse
pub struct CareSession<'a> {
    horse: &'a mut Horse,
    tickets: u32,
}

impl<'a> CareSession<'a> {
    pub fn new(horse: &'a mut Horse) -> Self {
        Self {
            horse,
            tickets: CARE_TICKETS,
        }
    }

    pub fn tickets(&self) -> u32 {
        self.tickets
    }

    pub fn horse(&self) -> &Horse {
        self.horse
    }

    /// Spend a ticket on `action`; returns the tickets left
    pub fn apply(&mut self, action: CareAction) -> Result<u32> {
        if self.tickets == 0 {
            return Err(GameError::NoCareTickets);
        }
        match action {
            CareAction::Feed => self.horse.recover_energy(FEED_ENERGY),
            CareAction::Rest => self.horse.recover_energy(REST_ENERGY),
            CareAction::Groom => {
                let groomed = (self.horse.endurance + GROOM_ENDURANCE).min(MAX_GROOMED_ENDURANCE);
                self.horse.endurance = (groomed * 100.0).round() / 100.0;
            }
        }
        self.tickets -= 1;
        log::info!(
            "Care {:?} on {}: energy {:.0}, endurance {:.2}, {} tickets left",
            action,
            self.horse.name,
            self.horse.energy(),
            self.horse.endurance,
            self.tickets
        );
        Ok(self.tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::{Breed, Sex};

    #[test]
    fn tickets_run_out() {
        let mut horse = Horse::new("Luna", Breed::Thoroughbred, Sex::Mare);
        horse.consume_energy(72.0);
        let mut care = CareSession::new(&mut horse);
        assert_eq!(care.apply(CareAction::Feed).unwrap(), 2);
        assert_eq!(care.apply(CareAction::Rest).unwrap(), 1);
        assert_eq!(care.apply(CareAction::Groom).unwrap(), 0);
        assert!(matches!(
            care.apply(CareAction::Feed),
            Err(GameError::NoCareTickets)
        ));
        assert!((horse.energy() - (100.0 - 80.0 + 55.0)).abs() < 1e-3);
        assert!((horse.endurance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn grooming_caps_endurance() {
        let mut horse = Horse::new("Tank", Breed::Percheron, Sex::Stallion);
        let mut care = CareSession::new(&mut horse);
        for _ in 0..3 {
            care.apply(CareAction::Groom).unwrap();
        }
        assert_eq!(horse.endurance, 1.6);
    }
}
