use crate::error::Result;
use crate::receiver::{VerificationResult, verify};
use crate::report::LabReport;
use crate::sender::{ChecksumOutcome, compute_checksum};
use crate::wire::Wire;
use checksum_lab_abstract::{Packet, WireConfig};
use tracing::{info, warn};

/// Sender, wire and receiver wired together. The checksum engine itself
/// stays stateless; everything remembered between calls lives here.
pub struct Lab {
    wire: Wire,
    last_text: Option<String>,
    last_sent: Option<ChecksumOutcome>,
    last_verification: Option<VerificationResult>,
}

impl Lab {
    pub fn new(config: WireConfig) -> Self {
        Self {
            wire: Wire::new(config),
            last_text: None,
            last_sent: None,
            last_verification: None,
        }
    }

    pub fn config(&self) -> &WireConfig {
        self.wire.config()
    }

    pub fn wire(&self) -> &Wire {
        &self.wire
    }

    /// Text most recently handed to [`Lab::send`].
    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }

    pub fn last_sent(&self) -> Option<&ChecksumOutcome> {
        self.last_sent.as_ref()
    }

    pub fn last_checksum(&self) -> Option<u16> {
        self.last_sent.as_ref().map(|o| o.checksum)
    }

    pub fn last_verification(&self) -> Option<&VerificationResult> {
        self.last_verification.as_ref()
    }

    /// Compute the checksum of `data` and transmit the packet.
    pub fn send(&mut self, data: &str) -> Result<u16> {
        let outcome = compute_checksum(data)?;
        let checksum = outcome.checksum;
        self.transmit(Packet::new(data, checksum), Some(outcome));
        Ok(checksum)
    }

    /// Transmit `data` with hand-written checksum text; nothing is computed.
    pub fn send_raw(&mut self, data: &str, checksum_hex: &str) {
        self.transmit(Packet::from_transmission(data, checksum_hex), None);
    }

    /// Compute the checksum of `data` for display, then transmit it with
    /// `checksum_hex` in place of the computed value.
    pub fn send_edited(&mut self, data: &str, checksum_hex: &str) -> Result<u16> {
        let outcome = compute_checksum(data)?;
        let computed = outcome.checksum;
        self.transmit(Packet::from_transmission(data, checksum_hex), Some(outcome));
        Ok(computed)
    }

    fn transmit(&mut self, packet: Packet, outcome: Option<ChecksumOutcome>) {
        self.last_text = Some(packet.data.clone());
        self.wire.transmit(packet);
        self.last_sent = outcome;
        self.last_verification = None;
    }

    /// Verify the packet on the wire. `Ok(None)` when nothing is in flight.
    pub fn receive(&mut self) -> Result<Option<&VerificationResult>> {
        let Some(packet) = self.wire.current() else {
            info!("receiver found no packet on wire");
            return Ok(None);
        };
        let result = match verify(&packet.data, packet.checksum) {
            Ok(result) => result,
            Err(err) => {
                self.last_verification = None;
                return Err(err);
            }
        };
        if result.is_valid {
            info!("receiver accepted packet (sum 0x{:04X})", result.final_sum);
        } else {
            warn!("receiver rejected packet (sum 0x{:04X})", result.final_sum);
        }
        self.last_verification = Some(result);
        Ok(self.last_verification.as_ref())
    }

    /// Send the last text again, replacing whatever is on the wire.
    pub fn resend(&mut self) -> Result<Option<u16>> {
        match self.last_text.clone() {
            Some(text) => self.send(&text).map(Some),
            None => Ok(None),
        }
    }

    pub fn tamper_data(&mut self, data: &str) -> bool {
        let changed = self.wire.tamper_data(data);
        self.invalidate_verdict(changed)
    }

    pub fn tamper_checksum(&mut self, checksum: u16) -> bool {
        let changed = self.wire.tamper_checksum(checksum);
        self.invalidate_verdict(changed)
    }

    pub fn flip_bit(&mut self, byte: usize, bit: u8) -> bool {
        let changed = self.wire.flip_bit(byte, bit);
        self.invalidate_verdict(changed)
    }

    pub fn corrupt_random(&mut self) -> bool {
        let changed = self.wire.corrupt_random();
        self.invalidate_verdict(changed)
    }

    /// A verdict only describes the packet it was computed for.
    fn invalidate_verdict(&mut self, changed: bool) -> bool {
        if changed {
            self.last_verification = None;
        }
        changed
    }

    pub fn clear(&mut self) {
        self.wire.clear();
        self.last_verification = None;
    }

    /// Produce a serializable snapshot of the current lab state.
    pub fn export_report(&self) -> LabReport {
        LabReport {
            config: self.config().clone(),
            last_checksum: self.last_checksum(),
            packet: self.wire.current().cloned(),
            verification: self.last_verification.as_ref().map(Into::into),
            sender_trace: self
                .last_sent
                .as_ref()
                .map(|o| o.trace.clone())
                .unwrap_or_default(),
            receiver_trace: self
                .last_verification
                .as_ref()
                .map(|v| v.trace.clone())
                .unwrap_or_default(),
            wire_events: self.wire.events().iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodingError;

    #[test]
    fn send_then_receive_is_valid() {
        let mut lab = Lab::new(WireConfig::default());
        assert_eq!(lab.send("A").unwrap(), 0xBEFF);
        let result = lab.receive().unwrap().unwrap();
        assert!(result.is_valid);
        assert_eq!(result.final_sum, 0xFFFF);
    }

    #[test]
    fn receive_on_empty_wire() {
        let mut lab = Lab::new(WireConfig::default());
        assert!(lab.receive().unwrap().is_none());
    }

    #[test]
    fn raw_send_with_bad_hex_transmits_zero() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send_raw("Hi", "oops");
        assert!(lab.last_checksum().is_none());
        let result = lab.receive().unwrap().unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.final_sum, 0x4869);
    }

    #[test]
    fn tampered_data_is_detected() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hello").unwrap();
        assert!(lab.tamper_data("Jello"));
        assert!(!lab.receive().unwrap().unwrap().is_valid);
    }

    #[test]
    fn non_ascii_tamper_surfaces_encoding_error() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hello").unwrap();
        lab.tamper_data("H\u{e9}llo");
        assert!(matches!(
            lab.receive(),
            Err(EncodingError::NonAscii { position: 1, .. })
        ));
    }

    #[test]
    fn resend_restores_valid_packet() {
        let mut lab = Lab::new(WireConfig::default());
        assert_eq!(lab.resend().unwrap(), None);
        lab.send("data").unwrap();
        lab.flip_bit(0, 0);
        assert!(!lab.receive().unwrap().unwrap().is_valid);
        lab.resend().unwrap();
        assert!(lab.receive().unwrap().unwrap().is_valid);
    }

    #[test]
    fn report_carries_both_traces() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hi").unwrap();
        lab.receive().unwrap();
        let report = lab.export_report();
        assert_eq!(report.last_checksum, Some(0xB796));
        assert_eq!(report.sender_trace.len(), 4);
        assert_eq!(report.receiver_trace.len(), 4);
        assert!(report.verification.unwrap().is_valid);

        let json = serde_json::to_string(&lab.export_report()).unwrap();
        assert!(json.contains("Step 4: Verification Result"));
    }

    #[test]
    fn new_packet_drops_previous_results() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("A").unwrap();
        lab.receive().unwrap();
        lab.send_raw("Hi", "1234");
        assert_eq!(lab.last_checksum(), None);
        assert!(lab.last_verification().is_none());

        let report = lab.export_report();
        assert!(report.sender_trace.is_empty());
        assert!(report.verification.is_none());
        assert_eq!(report.packet.unwrap().checksum, 0x1234);

        let result = lab.receive().unwrap().unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.final_sum, 0x5A9D);
    }

    #[test]
    fn resend_drops_previous_verdict() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send_raw("Hi", "0000");
        lab.receive().unwrap();
        lab.send("Hi").unwrap();
        assert!(lab.last_verification().is_none());
        assert_eq!(lab.last_checksum(), Some(0xB796));
    }

    #[test]
    fn edited_send_keeps_derivation_of_payload() {
        let mut lab = Lab::new(WireConfig::default());
        assert_eq!(lab.send_edited("Hi", "1234").unwrap(), 0xB796);
        assert_eq!(lab.last_checksum(), Some(0xB796));
        assert_eq!(lab.wire().current().unwrap().checksum, 0x1234);
        assert!(!lab.receive().unwrap().unwrap().is_valid);
    }

    #[test]
    fn tampering_drops_verdict() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hi").unwrap();
        lab.receive().unwrap();
        assert!(lab.tamper_checksum(0));
        assert!(lab.last_verification().is_none());
    }

    #[test]
    fn failed_receive_drops_verdict() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hello").unwrap();
        lab.receive().unwrap();
        lab.wire.tamper_data("H\u{e9}llo");
        assert!(lab.receive().is_err());
        assert!(lab.last_verification().is_none());
    }

    #[test]
    fn clear_drops_packet_and_verdict() {
        let mut lab = Lab::new(WireConfig::default());
        lab.send("Hi").unwrap();
        lab.receive().unwrap();
        lab.clear();
        assert!(lab.wire().current().is_none());
        assert!(lab.last_verification().is_none());
    }
}
