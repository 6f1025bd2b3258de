use serde::{Deserialize, Serialize};

/// Impairment configuration for the relay. Percentages are `0..=100`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpairmentProfile {
    pub loss_percent: u8,
    pub delay_percent: u8,
    pub corrupt_percent: u8,
    /// How long a delayed packet is held before it is forwarded.
    pub delay_ms: u64,
    /// RNG seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ImpairmentProfile {
    fn default() -> Self {
        Self {
            loss_percent: 0,
            delay_percent: 0,
            corrupt_percent: 0,
            delay_ms: 4000,
            seed: None,
        }
    }
}

/// Partial profile loaded from a TOML file; unset fields leave the base
/// profile untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImpairmentOverride {
    pub loss_percent: Option<u8>,
    pub delay_percent: Option<u8>,
    pub corrupt_percent: Option<u8>,
    pub delay_ms: Option<u64>,
    pub seed: Option<u64>,
}

impl ImpairmentOverride {
    pub fn apply_to(&self, profile: &mut ImpairmentProfile) {
        if let Some(v) = self.loss_percent {
            profile.loss_percent = v;
        }
        if let Some(v) = self.delay_percent {
            profile.delay_percent = v;
        }
        if let Some(v) = self.corrupt_percent {
            profile.corrupt_percent = v;
        }
        if let Some(v) = self.delay_ms {
            profile.delay_ms = v;
        }
        if let Some(v) = self.seed {
            profile.seed = Some(v);
        }
    }
}
