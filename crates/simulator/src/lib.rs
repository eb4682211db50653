//! # Tranche Simulator
//!
//! Replays TOML scenarios against the pool engine with in-memory
//! collaborators and reports the outcome as JSON.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use config::{AccountConfig, CreditLineConfig, PoolConfig, ProtocolConfig, ScenarioConfig, Step};
pub use error::{SimError, SimResult};
pub use report::{SimulationReport, StepDetail, StepOutcome, StepRecord};
pub use runner::{SimPool, Simulation};
