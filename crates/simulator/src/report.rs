//! JSON run report

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tranche_core::{AssessmentReport, PoolEvent, PoolSlice, PoolStatus, Position, Withdrawal};

use crate::error::SimResult;

/// What a successful step produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDetail {
    Position { position_id: u64 },
    Withdrawal(Withdrawal),
    Assessment(AssessmentReport),
    Slice { slice_index: usize },
    Clock { now: i64 },
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok { detail: StepDetail },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: &'static str,
    pub time: i64,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Final state of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub started_at: i64,
    pub finished_at: i64,
    /// Index of the step that aborted the run under `stop_on_error`
    pub halted_at: Option<usize>,
    pub steps: Vec<StepRecord>,
    pub status: String,
    pub total_deployed: u128,
    pub slices: Vec<PoolSlice>,
    pub positions: Vec<Position>,
    pub balances: BTreeMap<String, u128>,
    pub events: Vec<PoolEvent>,
}

impl SimulationReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.outcome.is_ok()).count()
    }

    pub fn balance(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn is_status(&self, status: PoolStatus) -> bool {
        self.status == status.to_string()
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> SimResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
