//! Sender side: encode, segment, sum, invert.

use crate::encoder::{encode_traced, segment_traced};
use crate::error::Result;
use crate::summation::sum_words;
use crate::trace::{Role, TraceRecorder, bin16, hex16};
use checksum_lab_abstract::TraceStep;
use serde::Serialize;
use tracing::debug;

pub const SUMMATION_TITLE: &str = "Step 3: One's Complement Addition";
pub const INVERSION_TITLE: &str = "Step 4: One's Complement Operation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumOutcome {
    pub checksum: u16,
    /// Folded sum of the data words, before inversion.
    pub total: u16,
    pub word_count: usize,
    pub carry_wraps: usize,
    pub trace: Vec<TraceStep>,
}

/// Compute the 16-bit one's-complement checksum of `payload`.
pub fn compute_checksum(payload: &str) -> Result<ChecksumOutcome> {
    let mut trace = TraceRecorder::new();

    let bytes = encode_traced(payload, Role::Sender, &mut trace)?;
    let words = segment_traced(&bytes, Role::Sender, &mut trace);

    let sum = sum_words(&words, 0);
    trace.record(SUMMATION_TITLE, sum.trace_lines());

    let total = sum.total;
    let checksum = !total;
    trace.record(
        INVERSION_TITLE,
        vec![
            format!("Final Sum:    {} ({})", bin16(total), hex16(total)),
            format!("Inverted Bits:{} ({})", bin16(checksum), hex16(checksum)),
            format!("CHECKSUM: {}", hex16(checksum)),
        ],
    );

    debug!(
        words = words.len(),
        carry_wraps = sum.carry_wraps(),
        "checksum {}",
        hex16(checksum)
    );

    Ok(ChecksumOutcome {
        checksum,
        total,
        word_count: words.len(),
        carry_wraps: sum.carry_wraps(),
        trace: trace.finish(),
    })
}
