use crate::config::WireConfig;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub config: WireConfigOverride,
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct WireConfigOverride {
    pub corrupt_rate: Option<f64>,
    pub seed: Option<u64>,
}

impl WireConfigOverride {
    pub fn apply_to(&self, config: &mut WireConfig) {
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// Sender computes the checksum for `data` and puts the packet on the wire
    Send { data: String },
    /// Put `data` on the wire with a hand-written checksum text
    SendRaw { data: String, checksum_hex: String },
    /// Replace the payload of the packet on the wire
    TamperData { data: String },
    /// Replace the checksum of the packet on the wire
    TamperChecksum { checksum: u16 },
    /// Flip bit `bit` (0..=6) of payload byte `byte`
    FlipBit { byte: usize, bit: u8 },
    /// Receiver verifies the packet currently on the wire
    Receive,
    /// Take the packet off the wire
    Clear,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// The last checksum computed by the sender
    Checksum { value: u16 },
    /// The receiver's last verdict
    Valid { expected: bool },
    /// The receiver's last folded sum (data words plus checksum)
    FinalSum { value: u16 },
    /// No active packet is left on the wire
    WireEmpty,
    /// The last sender run wrapped a carry at least `count` times
    CarryWrapsAtLeast { count: usize },
}
