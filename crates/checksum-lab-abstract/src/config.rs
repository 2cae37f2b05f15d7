use serde::{Deserialize, Serialize};

/// Channel settings for the simulated wire between sender and receiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireConfig {
    /// Probability that a transmitted packet gets one bit flipped in transit.
    pub corrupt_rate: f64,
    pub seed: u64,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}
