use checksum_lab_abstract::{Packet, WireConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Highest bit index a payload flip may touch; keeps bytes 7-bit.
const MAX_PAYLOAD_BIT: u8 = 6;

/// Oldest events are dropped past this many.
pub const MAX_WIRE_EVENTS: usize = 1000;

/// A compact textual record of something that happened on the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireEventSummary {
    pub seq: u64,
    pub description: String,
}

/// Single-slot store for the packet in flight. A new transmission replaces
/// whatever was there.
pub struct Wire {
    slot: Option<Packet>,
    config: WireConfig,
    rng: StdRng,
    events: VecDeque<WireEventSummary>,
    next_seq: u64,
}

impl Wire {
    pub fn new(config: WireConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            slot: None,
            config,
            rng,
            events: VecDeque::new(),
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    /// The active packet, if any.
    pub fn current(&self) -> Option<&Packet> {
        self.slot.as_ref().filter(|p| p.is_active)
    }

    /// Recent wire events, oldest first. `seq` keeps counting after old
    /// events are dropped.
    pub fn events(&self) -> &VecDeque<WireEventSummary> {
        &self.events
    }

    /// Put `packet` on the wire, possibly corrupting it in transit.
    pub fn transmit(&mut self, packet: Packet) {
        info!(
            "packet on wire: {} bytes, checksum 0x{:04X}",
            packet.len(),
            packet.checksum
        );
        self.push_event(format!(
            "SEND '{}' checksum=0x{:04X} ({} bytes)",
            packet.data,
            packet.checksum,
            packet.len()
        ));
        if self.slot.is_some() {
            debug!("replacing previous packet on wire");
        }
        self.slot = Some(packet);

        if self.config.corrupt_rate > 0.0 && self.rng.random::<f64>() < self.config.corrupt_rate
        {
            self.corrupt_random();
        }
    }

    /// Overwrite the payload of the packet in flight.
    pub fn tamper_data(&mut self, data: impl Into<String>) -> bool {
        let data = data.into();
        let Some(packet) = self.slot.as_mut().filter(|p| p.is_active) else {
            return false;
        };
        let description = format!("TAMPER data '{}' -> '{}'", packet.data, data);
        packet.data = data;
        self.push_event(description);
        true
    }

    /// Overwrite the checksum of the packet in flight.
    pub fn tamper_checksum(&mut self, checksum: u16) -> bool {
        let Some(packet) = self.slot.as_mut().filter(|p| p.is_active) else {
            return false;
        };
        let description = format!(
            "TAMPER checksum 0x{:04X} -> 0x{checksum:04X}",
            packet.checksum
        );
        packet.checksum = checksum;
        packet.checksum_hex = format!("{checksum:04X}");
        self.push_event(description);
        true
    }

    /// Flip bit `bit` (0..=6) of payload byte `byte`. Out-of-range indices
    /// and non-ASCII bytes leave the packet untouched.
    pub fn flip_bit(&mut self, byte: usize, bit: u8) -> bool {
        if bit > MAX_PAYLOAD_BIT {
            return false;
        }
        let Some(packet) = self.slot.as_mut().filter(|p| p.is_active) else {
            return false;
        };
        let mut bytes = packet.data.clone().into_bytes();
        match bytes.get_mut(byte) {
            Some(b) if b.is_ascii() => *b ^= 1 << bit,
            _ => return false,
        }
        let Ok(data) = String::from_utf8(bytes) else {
            return false;
        };
        packet.data = data;
        let description = format!("CORRUPT byte {byte} bit {bit} -> '{}'", packet.data);
        self.push_event(description);
        true
    }

    /// Flip one random bit of the packet in flight. Empty payloads get a bit
    /// of the checksum flipped instead.
    pub fn corrupt_random(&mut self) -> bool {
        let Some(len) = self.current().map(|p| p.data.len()) else {
            return false;
        };
        if len > 0 {
            let byte = self.rng.random_range(0..len);
            let bit = self.rng.random_range(0..=MAX_PAYLOAD_BIT);
            if self.flip_bit(byte, bit) {
                return true;
            }
        }
        let bit = self.rng.random_range(0..16u32);
        let Some(checksum) = self.current().map(|p| p.checksum ^ (1 << bit)) else {
            return false;
        };
        self.tamper_checksum(checksum)
    }

    pub fn clear(&mut self) {
        if self.slot.take().is_some() {
            info!("wire cleared");
            self.push_event("CLEAR".to_string());
        }
    }

    fn push_event(&mut self, description: String) {
        if self.events.len() == MAX_WIRE_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(WireEventSummary {
            seq: self.next_seq,
            description,
        });
        self.next_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins() {
        let mut wire = Wire::new(WireConfig::default());
        wire.transmit(Packet::new("first", 1));
        wire.transmit(Packet::new("second", 2));
        assert_eq!(wire.current().map(|p| p.data.as_str()), Some("second"));
        assert_eq!(wire.events().len(), 2);
    }

    #[test]
    fn tampering_an_empty_wire_is_a_no_op() {
        let mut wire = Wire::new(WireConfig::default());
        assert!(!wire.tamper_data("x"));
        assert!(!wire.tamper_checksum(0));
        assert!(!wire.flip_bit(0, 0));
        assert!(!wire.corrupt_random());
        assert!(wire.events().is_empty());
    }

    #[test]
    fn flip_bit_stays_ascii_and_in_range() {
        let mut wire = Wire::new(WireConfig::default());
        wire.transmit(Packet::new("A", 0xBEFF));
        assert!(!wire.flip_bit(0, 7));
        assert!(!wire.flip_bit(1, 0));
        assert!(wire.flip_bit(0, 1));
        assert_eq!(wire.current().unwrap().data, "C");
    }

    #[test]
    fn full_corruption_rate_always_changes_packet() {
        let config = WireConfig {
            corrupt_rate: 1.0,
            seed: 9,
        };
        let mut wire = Wire::new(config);
        let sent = Packet::new("payload", 0x1234);
        wire.transmit(sent.clone());
        assert_ne!(wire.current(), Some(&sent));
        assert_eq!(wire.events().len(), 2);
    }

    #[test]
    fn corrupting_empty_payload_touches_checksum() {
        let mut wire = Wire::new(WireConfig::default());
        wire.transmit(Packet::new("", 0xFFFF));
        assert!(wire.corrupt_random());
        let packet = wire.current().unwrap();
        assert!(packet.data.is_empty());
        assert_eq!((packet.checksum ^ 0xFFFF).count_ones(), 1);
    }

    #[test]
    fn event_history_is_bounded() {
        let mut wire = Wire::new(WireConfig::default());
        wire.transmit(Packet::new("abc", 0));
        for _ in 0..MAX_WIRE_EVENTS {
            assert!(wire.flip_bit(0, 0));
        }
        let events = wire.events();
        assert_eq!(events.len(), MAX_WIRE_EVENTS);
        assert_eq!(events.front().unwrap().seq, 1);
        assert_eq!(events.back().unwrap().seq, MAX_WIRE_EVENTS as u64);
    }

    #[test]
    fn clear_empties_slot() {
        let mut wire = Wire::new(WireConfig::default());
        wire.transmit(Packet::new("x", 0));
        wire.clear();
        assert!(wire.current().is_none());
        wire.clear();
        assert_eq!(wire.events().len(), 2);
    }
}
