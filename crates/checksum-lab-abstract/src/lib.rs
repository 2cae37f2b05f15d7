pub mod config;
pub mod packet;
pub mod scenario;
pub mod trace;

pub use packet::{Packet, parse_checksum_hex};
pub use trace::TraceStep;

pub use config::WireConfig;
pub use scenario::{TestAction, TestAssertion, TestScenario, WireConfigOverride};
