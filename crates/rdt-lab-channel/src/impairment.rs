use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ImpairmentProfile;

/// Per-packet fate decided by the engine. The delay check runs first and
/// short-circuits the rest: a delayed packet has already been handed to the
/// asynchronous forward path, so it is neither dropped nor corrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Delay,
    Drop,
    Corrupt,
}

/// Pure decision logic: rolls the configured probabilities, nothing else.
pub struct ImpairmentEngine {
    profile: ImpairmentProfile,
    rng: StdRng,
}

impl ImpairmentEngine {
    pub fn new(profile: ImpairmentProfile) -> Self {
        let rng = match profile.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { profile, rng }
    }

    /// Decide the fate of one packet. Order: delay, loss, corruption.
    pub fn decide(&mut self) -> Decision {
        if self.roll(self.profile.delay_percent) {
            Decision::Delay
        } else if self.roll(self.profile.loss_percent) {
            Decision::Drop
        } else if self.roll(self.profile.corrupt_percent) {
            Decision::Corrupt
        } else {
            Decision::Forward
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.profile.delay_ms)
    }

    fn roll(&mut self, percent: u8) -> bool {
        percent > 0 && self.rng.random_range(0..100u32) < u32::from(percent)
    }
}
