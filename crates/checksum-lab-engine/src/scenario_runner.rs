use crate::lab::Lab;
use crate::report::LabReport;
use anyhow::{Context, Result};
use checksum_lab_abstract::{TestAction, TestAssertion, TestScenario, WireConfig};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let scenario: TestScenario =
        toml::from_str(&content).context("Failed to parse scenario file")?;
    Ok(scenario)
}

/// Load, run and check a scenario file, returning the final lab report.
pub fn run_scenario(path: &Path) -> Result<LabReport> {
    let scenario = load_scenario(path)?;
    let lab = run_actions(&scenario)?;
    check_assertions(&lab, &scenario)?;
    Ok(lab.export_report())
}

/// Build a lab from the scenario config and play its actions in order.
pub fn run_actions(scenario: &TestScenario) -> Result<Lab> {
    let mut config = WireConfig::default();
    scenario.config.apply_to(&mut config);
    info!("running scenario '{}': {}", scenario.name, scenario.description);

    let mut lab = Lab::new(config);
    for (idx, action) in scenario.actions.iter().enumerate() {
        apply_action(&mut lab, action)
            .with_context(|| format!("Action #{} ({action:?}) failed", idx + 1))?;
    }
    Ok(lab)
}

fn apply_action(lab: &mut Lab, action: &TestAction) -> Result<()> {
    match action {
        TestAction::Send { data } => {
            lab.send(data)?;
        }
        TestAction::SendRaw { data, checksum_hex } => lab.send_raw(data, checksum_hex),
        TestAction::TamperData { data } => {
            if !lab.tamper_data(data) {
                warn!("tamper_data ignored: wire is empty");
            }
        }
        TestAction::TamperChecksum { checksum } => {
            if !lab.tamper_checksum(*checksum) {
                warn!("tamper_checksum ignored: wire is empty");
            }
        }
        TestAction::FlipBit { byte, bit } => {
            if !lab.flip_bit(*byte, *bit) {
                anyhow::bail!("cannot flip bit {bit} of byte {byte}");
            }
        }
        TestAction::Receive => {
            lab.receive()?;
        }
        TestAction::Clear => lab.clear(),
    }
    Ok(())
}

/// Evaluate every assertion; all failures are reported together.
pub fn check_assertions(lab: &Lab, scenario: &TestScenario) -> Result<()> {
    let failures: Vec<String> = scenario
        .assertions
        .iter()
        .filter_map(|assertion| check_one(lab, assertion).err())
        .collect();

    if failures.is_empty() {
        info!("scenario '{}' passed", scenario.name);
        return Ok(());
    }
    for failure in &failures {
        warn!("{failure}");
    }
    anyhow::bail!(
        "Scenario '{}' failed {} assertion(s):\n  {}",
        scenario.name,
        failures.len(),
        failures.join("\n  ")
    )
}

fn check_one(lab: &Lab, assertion: &TestAssertion) -> std::result::Result<(), String> {
    match assertion {
        TestAssertion::Checksum { value } => match lab.last_checksum() {
            Some(actual) if actual == *value => Ok(()),
            Some(actual) => Err(format!(
                "checksum: expected 0x{value:04X}, got 0x{actual:04X}"
            )),
            None => Err("checksum: sender never computed one".to_string()),
        },
        TestAssertion::Valid { expected } => match lab.last_verification() {
            Some(v) if v.is_valid == *expected => Ok(()),
            Some(v) => Err(format!(
                "valid: expected {expected}, got {} (sum 0x{:04X})",
                v.is_valid, v.final_sum
            )),
            None => Err("valid: receiver never ran".to_string()),
        },
        TestAssertion::FinalSum { value } => match lab.last_verification() {
            Some(v) if v.final_sum == *value => Ok(()),
            Some(v) => Err(format!(
                "final_sum: expected 0x{value:04X}, got 0x{:04X}",
                v.final_sum
            )),
            None => Err("final_sum: receiver never ran".to_string()),
        },
        TestAssertion::WireEmpty => match lab.wire().current() {
            None => Ok(()),
            Some(p) => Err(format!("wire_empty: packet '{}' still on wire", p.data)),
        },
        TestAssertion::CarryWrapsAtLeast { count } => {
            let actual = lab.last_sent().map(|o| o.carry_wraps).unwrap_or(0);
            if actual >= *count {
                Ok(())
            } else {
                Err(format!(
                    "carry_wraps_at_least: expected >= {count}, got {actual}"
                ))
            }
        }
    }
}
