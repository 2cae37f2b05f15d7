use crate::receiver::VerificationResult;
use crate::wire::WireEventSummary;
use checksum_lab_abstract::{Packet, TraceStep, WireConfig};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LabReport {
    pub config: WireConfig,
    pub last_checksum: Option<u16>,
    pub packet: Option<Packet>,
    pub verification: Option<VerdictSummary>,
    pub sender_trace: Vec<TraceStep>,
    pub receiver_trace: Vec<TraceStep>,
    pub wire_events: Vec<WireEventSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerdictSummary {
    pub is_valid: bool,
    pub final_sum: u16,
    pub final_sum_hex: String,
}

impl From<&VerificationResult> for VerdictSummary {
    fn from(result: &VerificationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            final_sum: result.final_sum,
            final_sum_hex: format!("{:04X}", result.final_sum),
        }
    }
}
