//! One's-complement checksum lab: a stateless sender/receiver engine that
//! returns a step-by-step derivation alongside every result, plus the
//! simulated wire and scenario tooling around it.

pub mod encoder;
pub mod error;
pub mod lab;
pub mod receiver;
pub mod report;
pub mod scenario_runner;
pub mod sender;
pub mod summation;
pub mod trace;
pub mod wire;

#[cfg(feature = "tui")]
pub mod tui;

pub use error::EncodingError;
pub use lab::Lab;
pub use receiver::{ALL_ONES, VerificationResult, verify};
pub use report::LabReport;
pub use sender::{ChecksumOutcome, compute_checksum};
pub use summation::{Summation, sum_words};
pub use wire::{Wire, WireEventSummary};
