use std::path::PathBuf;

use tranche_core::snapshot::PoolSnapshot;
use tranche_core::{PoolStatus, Withdrawal};
use tranche_sim::{ScenarioConfig, Simulation, StepDetail, StepOutcome};

fn basic_scenario() -> ScenarioConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/basic.toml");
    ScenarioConfig::load(path).unwrap()
}

#[test]
fn test_basic_scenario_settles_every_account() {
    let mut simulation = Simulation::new(basic_scenario()).unwrap();
    let report = simulation.run();

    assert_eq!(report.steps.len(), 13);
    assert_eq!(report.failed_steps(), 1);
    assert!(matches!(report.steps[2].outcome, StepOutcome::Failed { .. }));
    assert_eq!(report.halted_at, None);
    assert!(report.is_status(PoolStatus::Closed));

    assert_eq!(report.balance("treasury"), 10);
    assert_eq!(report.balance("pool"), 0);
    assert_eq!(report.balance("alice"), 1_000_102);
    assert_eq!(report.balance("bob"), 1_000_088);
    assert_eq!(report.balance("borrower"), 999_800);
    assert_eq!(report.total_deployed, 0);
}

#[test]
fn test_first_redemption_pays_senior_interest() {
    let mut simulation = Simulation::new(basic_scenario()).unwrap();
    let report = simulation.run();

    assert_eq!(
        report.steps[7].outcome,
        StepOutcome::Ok { detail: StepDetail::Withdrawal(Withdrawal { interest: 51, principal: 0 }) }
    );
    assert_eq!(
        report.steps[10].outcome,
        StepOutcome::Ok { detail: StepDetail::Withdrawal(Withdrawal { interest: 51, principal: 600 }) }
    );
}

#[test]
fn test_stop_on_error_halts_run() {
    let mut config = basic_scenario();
    config.stop_on_error = true;

    let mut simulation = Simulation::new(config).unwrap();
    let report = simulation.run();

    assert_eq!(report.halted_at, Some(2));
    assert_eq!(report.steps.len(), 3);
    assert!(report.is_status(PoolStatus::Open));
    assert_eq!(report.balance("pool"), 1_000);
}

#[test]
fn test_checkpoint_matches_final_state() {
    let mut simulation = Simulation::new(basic_scenario()).unwrap();
    simulation.run();

    let snapshot = PoolSnapshot::from_bytes(&simulation.checkpoint().unwrap()).unwrap();
    assert_eq!(snapshot.state, *simulation.pool().state());
    assert_eq!(snapshot.positions, *simulation.pool().positions());
}

#[test]
fn test_report_serializes_outcomes() {
    let mut simulation = Simulation::new(basic_scenario()).unwrap();
    let json = simulation.run().to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["scenario"], "basic");
    assert_eq!(value["steps"][2]["status"], "failed");
    assert_eq!(value["steps"][0]["detail"]["position"]["position_id"], 1);
    assert_eq!(value["status"], "closed");
}
