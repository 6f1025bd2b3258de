//! The unreliable-channel half of the lab: the impairment decision engine,
//! the relay node that applies it to live traffic, and the relay's
//! statistics.

pub mod config;
pub mod impairment;
pub mod relay;
pub mod stats;

pub use config::{ImpairmentOverride, ImpairmentProfile};
pub use impairment::{Decision, ImpairmentEngine};
pub use relay::{RelayError, RelayNode};
pub use stats::RelayStats;
