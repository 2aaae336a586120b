//! Input sources feeding the race loop
//!
//! The graphical front end would translate key presses into [`RaceInput`]s;
//! headless runs and tests use the scripted sources below.

use crate::game_server::race::{RaceInput, RaceSnapshot};

/// Supplies the inputs gathered since the previous tick
pub trait InputSource {
    fn name(&self) -> &str;
    fn poll(&mut self, snapshot: &RaceSnapshot) -> Vec<RaceInput>;
}

/// Never presses anything
pub struct IdleInput;

impl InputSource for IdleInput {
    fn name(&self) -> &str {
        "idle"
    }

    fn poll(&mut self, _snapshot: &RaceSnapshot) -> Vec<RaceInput> {
        Vec::new()
    }
}

/// Taps at a steady rhythm and drinks water when the horse runs low
pub struct RhythmTapper {
    taps_per_second: f32,
    water_below: Option<f32>,
    taps_sent: u64,
}

impl RhythmTapper {
    pub const MAX_TAPS_PER_SECOND: f32 = 30.0;
    /// Backlog beyond this is dropped after a long stall
    const MAX_TAPS_PER_POLL: u64 = 16;

    /// Rates outside `[0, MAX_TAPS_PER_SECOND]` are clamped; non-finite rates mean no taps
    pub fn new(taps_per_second: f32) -> Self {
        let rate = if taps_per_second.is_finite() {
            taps_per_second.clamp(0.0, Self::MAX_TAPS_PER_SECOND)
        } else {
            log::warn!("Ignoring non-finite tap rate {}", taps_per_second);
            0.0
        };
        Self {
            taps_per_second: rate,
            water_below: None,
            taps_sent: 0,
        }
    }

    pub fn taps_per_second(&self) -> f32 {
        self.taps_per_second
    }

    /// Drink a ration whenever energy drops below `energy`
    pub fn with_water_below(mut self, energy: f32) -> Self {
        self.water_below = Some(energy);
        self
    }
}

impl InputSource for RhythmTapper {
    fn name(&self) -> &str {
        "rhythm"
    }

    fn poll(&mut self, snapshot: &RaceSnapshot) -> Vec<RaceInput> {
        let mut inputs = Vec::new();
        let player = snapshot.competitors.iter().find(|c| c.is_player);

        if let (Some(limit), Some(player)) = (self.water_below, player) {
            if snapshot.water_left > 0 && player.energy < limit {
                inputs.push(RaceInput::Water);
            }
        }

        if self.taps_per_second > 0.0 {
            // Taps fall on t = k / rate; count every slot up to now
            let elapsed = f64::from(snapshot.elapsed_time.max(0.0));
            let due_total = (elapsed * f64::from(self.taps_per_second)).floor() as u64 + 1;
            let due = due_total.saturating_sub(self.taps_sent);
            self.taps_sent = self.taps_sent.max(due_total);
            let burst = due.min(Self::MAX_TAPS_PER_POLL) as usize;
            inputs.extend(std::iter::repeat(RaceInput::Tap).take(burst));
        }
        inputs
    }
}

/// Replays a fixed per-tick input trace, then stays idle
pub struct ScriptedInput {
    frames: std::vec::IntoIter<Vec<RaceInput>>,
}

impl ScriptedInput {
    pub fn new(frames: Vec<Vec<RaceInput>>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll(&mut self, _snapshot: &RaceSnapshot) -> Vec<RaceInput> {
        self.frames.next().unwrap_or_default()
    }
}
