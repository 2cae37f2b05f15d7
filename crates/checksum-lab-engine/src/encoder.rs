//! Text to bytes to big-endian 16-bit words.

use crate::error::{EncodingError, Result};
use crate::trace::{Role, TraceRecorder, bin8, byte_stream, hex16};
use tracing::debug;

pub const SEGMENTATION_TITLE: &str = "Step 2: Binary Word Segmentation";

/// Even-length byte sequence ready for word segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSequence {
    bytes: Vec<u8>,
    padded: bool,
}

impl ByteSequence {
    /// Append one zero byte when `bytes` has odd length.
    pub fn pad(mut bytes: Vec<u8>) -> Self {
        let padded = bytes.len() % 2 != 0;
        if padded {
            bytes.push(0);
        }
        Self { bytes, padded }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether a zero byte was appended.
    pub fn padded(&self) -> bool {
        self.padded
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Split into words, high byte first.
    pub fn words(&self) -> Vec<u16> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// One byte per character, rejecting anything outside 7-bit ASCII.
pub fn to_bytes(payload: &str) -> Result<Vec<u8>> {
    payload
        .chars()
        .enumerate()
        .map(|(position, ch)| {
            if ch.is_ascii() {
                Ok(ch as u8)
            } else {
                Err(EncodingError::NonAscii { ch, position })
            }
        })
        .collect()
}

pub fn encode(payload: &str) -> Result<ByteSequence> {
    Ok(ByteSequence::pad(to_bytes(payload)?))
}

/// Encode and record the "data to binary" step. The binary stream lists
/// the bytes before padding.
pub(crate) fn encode_traced(
    payload: &str,
    role: Role,
    trace: &mut TraceRecorder,
) -> Result<ByteSequence> {
    let raw = to_bytes(payload)?;
    let (title, lines) = match role {
        Role::Sender => (
            "Step 1: Data to Binary Conversion",
            vec![
                format!("Input: '{payload}'"),
                format!("Binary Stream: {}", byte_stream(&raw)),
            ],
        ),
        Role::Receiver => (
            "Step 1: Received Data to Binary Conversion",
            vec![
                format!("Received Data: '{payload}'"),
                format!("Binary: {}", byte_stream(&raw)),
            ],
        ),
    };
    trace.record(title, lines);

    let bytes = ByteSequence::pad(raw);
    if bytes.padded() {
        debug!("odd payload length, appended zero byte");
    }
    Ok(bytes)
}

/// Segment into words and record one line per word.
pub(crate) fn segment_traced(
    bytes: &ByteSequence,
    role: Role,
    trace: &mut TraceRecorder,
) -> Vec<u16> {
    let words = bytes.words();
    let mut lines: Vec<String> = bytes
        .as_bytes()
        .chunks_exact(2)
        .zip(&words)
        .enumerate()
        .map(|(i, (pair, word))| match role {
            Role::Sender => format!(
                "Word {}: {} {} ({})",
                i + 1,
                bin8(pair[0]),
                bin8(pair[1]),
                hex16(*word)
            ),
            Role::Receiver => format!("Word {}: {}", i + 1, hex16(*word)),
        })
        .collect();
    if lines.is_empty() {
        lines.push("No words: payload is empty.".to_string());
    }
    trace.record(SEGMENTATION_TITLE, lines);
    words
}
