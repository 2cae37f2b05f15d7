//! Fixed-width renderings shared by every trace-emitting step, plus the
//! recorder that collects the titled sections of one engine call.

use checksum_lab_abstract::TraceStep;

/// Which side of the wire a trace is written for. The two sides use
/// different labels for the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// 8-bit zero-padded binary, e.g. `01000001`.
pub fn bin8(byte: u8) -> String {
    format!("{byte:08b}")
}

/// 16-bit zero-padded binary.
pub fn bin16(value: u16) -> String {
    format!("{value:016b}")
}

/// Like [`bin16`], but for a raw intermediate that may carry into bit 16.
pub fn bin_wide(value: u32) -> String {
    format!("{value:016b}")
}

/// Standalone hex rendering, e.g. `0x4100`.
pub fn hex16(value: u16) -> String {
    format!("0x{value:04X}")
}

/// Space-separated 8-bit rendering of a byte stream.
pub fn byte_stream(bytes: &[u8]) -> String {
    bytes.iter().map(|b| bin8(*b)).collect::<Vec<_>>().join(" ")
}

/// Collects the ordered sections of a single sender or receiver run.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<TraceStep>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, title: impl Into<String>, lines: Vec<String>) {
        self.steps.push(TraceStep::new(title, lines));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self) -> Vec<TraceStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fixed_width() {
        assert_eq!(bin8(0x41), "01000001");
        assert_eq!(bin8(0), "00000000");
        assert_eq!(bin16(0x4100), "0100000100000000");
        assert_eq!(bin_wide(0x4100), "0100000100000000");
        assert_eq!(bin_wide(0x1_0000), "10000000000000000");
        assert_eq!(hex16(0xbeff), "0xBEFF");
        assert_eq!(hex16(0x1), "0x0001");
    }

    #[test]
    fn joins_byte_stream_with_spaces() {
        assert_eq!(byte_stream(b"Hi"), "01001000 01101001");
        assert_eq!(byte_stream(&[]), "");
    }

    #[test]
    fn recorder_keeps_insertion_order() {
        let mut trace = TraceRecorder::new();
        trace.record("first", vec!["a".into()]);
        trace.record("second", Vec::new());
        assert_eq!(trace.len(), 2);
        let steps = trace.finish();
        assert_eq!(steps[0].title, "first");
        assert_eq!(steps[1].title, "second");
        assert!(steps[1].is_empty());
    }
}
