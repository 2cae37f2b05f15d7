use serde::{Deserialize, Serialize};

/// The packet currently sitting on the simulated wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Packet {
    /// Payload text as transmitted (and possibly edited in transit).
    pub data: String,
    /// Numeric checksum the receiver will add to the data words.
    pub checksum: u16,
    /// Checksum text exactly as it was handed to the wire.
    pub checksum_hex: String,
    pub is_active: bool,
}

impl Packet {
    /// Packet carrying a checksum the sender computed itself.
    pub fn new(data: impl Into<String>, checksum: u16) -> Self {
        Self {
            data: data.into(),
            checksum,
            checksum_hex: format!("{checksum:04X}"),
            is_active: true,
        }
    }

    /// Packet built from user-supplied checksum text.
    ///
    /// Text that does not parse as a 16-bit hex value is transmitted as a
    /// zero checksum; the raw text is kept for display.
    pub fn from_transmission(data: impl Into<String>, checksum_hex: impl Into<String>) -> Self {
        let checksum_hex = checksum_hex.into();
        Self {
            data: data.into(),
            checksum: parse_checksum_hex(&checksum_hex).unwrap_or(0),
            checksum_hex,
            is_active: true,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Parse base-16 checksum text such as `BEFF`, `0xbeff` or ` 00ff `.
pub fn parse_checksum_hex(text: &str) -> Option<u16> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}
