use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use checksum_lab_abstract::{TraceStep, WireConfig};
use checksum_lab_engine::scenario_runner;
use checksum_lab_engine::tui::{MemoryLogBuffer, TuiApp};
use checksum_lab_engine::{Lab, LabReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "One's-complement checksum lab")]
struct Args {
    /// Text the sender computes a checksum for and puts on the wire.
    #[arg(long)]
    data: Option<String>,

    /// Transmit this hex checksum instead of the computed one. The sender
    /// derivation is still printed.
    #[arg(long)]
    checksum: Option<String>,

    /// Replace the payload on the wire before the receiver runs.
    #[arg(long)]
    tamper_data: Option<String>,

    /// Probability that the channel flips one bit of the packet.
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run a scenario from disk (mutually exclusive with --data).
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Launch the terminal UI visualizer.
    #[arg(long, default_value_t = false)]
    tui: bool,

    /// Write a JSON report of the finished run.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_buffer = init_logging(args.tui);
    info!("checksum-lab starting…");

    if args.scenario.is_some() && args.data.is_some() {
        anyhow::bail!("--scenario and --data cannot be used together");
    }

    let report = if let Some(path) = &args.scenario {
        if args.tui {
            let scenario = scenario_runner::load_scenario(path)?;
            let lab = scenario_runner::run_actions(&scenario)?;
            run_tui(lab, log_buffer)?
        } else {
            let report = scenario_runner::run_scenario(path)?;
            print_report(&report);
            report
        }
    } else {
        let lab = run_adhoc(&args)?;
        if args.tui {
            run_tui(lab, log_buffer)?
        } else {
            let report = lab.export_report();
            print_report(&report);
            report
        }
    };

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    Ok(())
}

impl Args {
    fn wire_config(&self) -> Result<WireConfig> {
        if !(0.0..=1.0).contains(&self.corrupt_rate) {
            anyhow::bail!("--corrupt-rate must be within 0.0..=1.0");
        }
        Ok(WireConfig {
            corrupt_rate: self.corrupt_rate,
            seed: self.seed,
        })
    }
}

fn init_logging(use_tui: bool) -> Option<MemoryLogBuffer> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if use_tui {
        let buffer = MemoryLogBuffer::new();
        let writer = buffer.clone();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .init();
        Some(buffer)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

fn run_adhoc(args: &Args) -> Result<Lab> {
    let data = args.data.as_deref().unwrap_or("");
    let mut lab = Lab::new(args.wire_config()?);

    let sent = match &args.checksum {
        Some(hex) => lab.send_edited(data, hex),
        None => lab.send(data),
    };
    sent.with_context(|| format!("Sender rejected payload {data:?}"))?;

    if let Some(edited) = &args.tamper_data {
        lab.tamper_data(edited);
    }

    lab.receive().context("Receiver rejected payload")?;
    Ok(lab)
}

fn run_tui(lab: Lab, logs: Option<MemoryLogBuffer>) -> Result<LabReport> {
    let mut app = TuiApp::new(lab, logs);
    app.run()?;
    Ok(app.into_lab().export_report())
}

fn print_report(report: &LabReport) {
    if !report.sender_trace.is_empty() {
        println!("== Sender ==");
        print_steps(&report.sender_trace);
    }
    if let Some(packet) = &report.packet {
        println!("== Wire ==");
        println!("  data: '{}'", packet.data);
        println!(
            "  checksum: 0x{:04X} (sent as '{}')",
            packet.checksum, packet.checksum_hex
        );
        println!();
    }
    if !report.receiver_trace.is_empty() {
        println!("== Receiver ==");
        print_steps(&report.receiver_trace);
    }
    match &report.verification {
        Some(v) if v.is_valid => println!("VALID (sum 0x{})", v.final_sum_hex),
        Some(v) => println!("MISMATCH (sum 0x{})", v.final_sum_hex),
        None => println!("No packet verified."),
    }
}

fn print_steps(steps: &[TraceStep]) {
    for step in steps {
        println!("{}", step.title);
        for line in &step.lines {
            println!("    {line}");
        }
        println!();
    }
}

fn write_trace(path: &Path, report: &LabReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize lab report")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adhoc(argv: &[&str]) -> Result<LabReport> {
        let args = Args::parse_from(std::iter::once("checksum-lab").chain(argv.iter().copied()));
        Ok(run_adhoc(&args)?.export_report())
    }

    #[test]
    fn overridden_checksum_still_shows_sender_derivation() {
        let report = adhoc(&["--data", "Hi", "--checksum", "1234"]).unwrap();
        assert_eq!(report.sender_trace.len(), 4);
        assert_eq!(report.last_checksum, Some(0xB796));
        assert_eq!(report.packet.unwrap().checksum, 0x1234);
        let verdict = report.verification.unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.final_sum_hex, "5A9D");
    }

    #[test]
    fn plain_send_verifies() {
        let report = adhoc(&["--data", "A"]).unwrap();
        assert_eq!(report.last_checksum, Some(0xBEFF));
        assert!(report.verification.unwrap().is_valid);
    }

    #[test]
    fn non_ascii_payload_is_rejected() {
        let err = adhoc(&["--data", "caf\u{e9}"]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid input"));
    }
}
