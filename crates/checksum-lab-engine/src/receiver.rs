//! Receiver side: re-derive the data words and add the transmitted checksum.

use crate::encoder::{encode_traced, segment_traced};
use crate::error::Result;
use crate::summation::sum_words;
use crate::trace::{Role, TraceRecorder, bin16, hex16};
use checksum_lab_abstract::TraceStep;
use serde::Serialize;
use tracing::{debug, warn};

/// A packet is intact when data words plus checksum fold to this value.
pub const ALL_ONES: u16 = 0xFFFF;

pub const SUMMATION_TITLE: &str = "Step 3: One's Complement Addition (Including Checksum)";
pub const VERDICT_TITLE: &str = "Step 4: Verification Result";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub final_sum: u16,
    /// Folded sum of the data words alone.
    pub data_sum: u16,
    pub trace: Vec<TraceStep>,
}

/// Check `payload` against the checksum that travelled with it.
pub fn verify(payload: &str, received_checksum: u16) -> Result<VerificationResult> {
    let mut trace = TraceRecorder::new();

    let bytes = encode_traced(payload, Role::Receiver, &mut trace)?;
    let words = segment_traced(&bytes, Role::Receiver, &mut trace);

    let data_sum = sum_words(&words, 0).total;
    let with_checksum = sum_words(&[received_checksum], data_sum);
    let final_sum = with_checksum.total;

    let mut lines = vec![
        format!("Sum of Data Words: {}", hex16(data_sum)),
        format!("Add Received Checksum: {}", hex16(received_checksum)),
    ];
    if with_checksum.carry_wraps() > 0 {
        lines.push("[Carry Wrapped]".to_string());
    }
    lines.push(format!(
        "Final Total: {} ({})",
        hex16(final_sum),
        bin16(final_sum)
    ));
    trace.record(SUMMATION_TITLE, lines);

    let is_valid = final_sum == ALL_ONES;
    let verdict = if is_valid {
        format!("Result is all 1s ({}) -> VALID", hex16(final_sum))
    } else {
        format!("Result ({}) IS NOT all 1s -> MISMATCH", hex16(final_sum))
    };
    trace.record(VERDICT_TITLE, vec![verdict]);

    if is_valid {
        debug!(words = words.len(), "checksum verified");
    } else {
        warn!(
            words = words.len(),
            "checksum mismatch: final sum {}",
            hex16(final_sum)
        );
    }

    Ok(VerificationResult {
        is_valid,
        final_sum,
        data_sum,
        trace: trace.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::compute_checksum;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_ascii(rng: &mut StdRng) -> String {
        let len = rng.random_range(0..64);
        (0..len)
            .map(|_| char::from(rng.random_range(0u8..128)))
            .collect()
    }

    #[test]
    fn sender_checksum_always_verifies() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut samples = vec![
            String::new(),
            "A".to_string(),
            "Hello, World!".to_string(),
            "\u{7f}\u{7f}\u{7f}".to_string(),
            "\0\0".to_string(),
        ];
        samples.extend((0..200).map(|_| random_ascii(&mut rng)));

        for payload in samples {
            let checksum = compute_checksum(&payload).unwrap().checksum;
            let result = verify(&payload, checksum).unwrap();
            assert!(result.is_valid, "payload {payload:?} failed to verify");
            assert_eq!(result.final_sum, ALL_ONES);
        }
    }

    #[test]
    fn wrong_checksum_is_rejected() {
        let checksum = compute_checksum("Hi").unwrap().checksum;
        assert_eq!(checksum, 0xB796);

        let result = verify("Hi", 0x1234).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.final_sum, 0x5A9D);
        assert_eq!(
            result.trace[3].lines,
            vec!["Result (0x5A9D) IS NOT all 1s -> MISMATCH"]
        );
    }

    #[test]
    fn single_bit_flips_in_checksum_are_rejected() {
        let checksum = compute_checksum("checksum lab").unwrap().checksum;
        for bit in 0..16 {
            let result = verify("checksum lab", checksum ^ (1 << bit)).unwrap();
            assert!(!result.is_valid, "bit {bit} flip went unnoticed");
        }
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let checksum = compute_checksum("Hi").unwrap().checksum;
        assert!(!verify("Ho", checksum).unwrap().is_valid);
    }

    #[test]
    fn empty_payload_with_all_ones() {
        let result = verify("", 0xFFFF).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.data_sum, 0);
        assert_eq!(result.trace[1].lines, vec!["No words: payload is empty."]);
    }

    #[test]
    fn carry_wrap_on_checksum_is_reported() {
        // 0x4869 + 0xC000 carries out of bit 16
        let result = verify("Hi", 0xC000).unwrap();
        assert_eq!(result.final_sum, 0x086A);
        assert!(result.trace[2].lines.contains(&"[Carry Wrapped]".to_string()));
    }

    #[test]
    fn trace_layout() {
        let checksum = compute_checksum("A").unwrap().checksum;
        let result = verify("A", checksum).unwrap();
        let titles: Vec<_> = result.trace.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Step 1: Received Data to Binary Conversion",
                "Step 2: Binary Word Segmentation",
                SUMMATION_TITLE,
                VERDICT_TITLE,
            ]
        );
        assert_eq!(
            result.trace[0].lines,
            vec!["Received Data: 'A'", "Binary: 01000001"]
        );
        assert_eq!(
            result.trace[2].lines,
            vec![
                "Sum of Data Words: 0x4100",
                "Add Received Checksum: 0xBEFF",
                "Final Total: 0xFFFF (1111111111111111)",
            ]
        );
        assert_eq!(
            result.trace[3].lines,
            vec!["Result is all 1s (0xFFFF) -> VALID"]
        );
    }
}
