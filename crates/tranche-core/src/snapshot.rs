//! # Pool Snapshots
//!
//! Borsh-encoded checkpoints of everything the pool owns: parameters, hot
//! state and positions. Collaborators are not part of a snapshot; they are
//! handed back in on restore.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::errors::{CoreResult, TrancheError};
use crate::interfaces::{CashLedger, ConfigRegistry, CredentialGate, CreditLine};
use crate::pool::{PoolController, PoolState};
use crate::types::{PoolParams, PositionStore};

/// Format version written in front of every snapshot
pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PoolSnapshot {
    pub version: u8,
    pub params: PoolParams,
    pub state: PoolState,
    pub positions: PositionStore,
}

impl PoolSnapshot {
    pub fn capture<C, L, G, R>(pool: &PoolController<C, L, G, R>) -> Self
    where
        C: CreditLine + Clone,
        L: CashLedger,
        G: CredentialGate,
        R: ConfigRegistry,
    {
        Self {
            version: SNAPSHOT_VERSION,
            params: pool.params().clone(),
            state: pool.state().clone(),
            positions: pool.positions().clone(),
        }
    }

    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        self.try_to_vec().map_err(|e| TrancheError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let snapshot = Self::try_from_slice(bytes).map_err(|e| TrancheError::Snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(TrancheError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Rebuild a controller around the saved pool
    pub fn restore<C, L, G, R>(
        self,
        credit_line: C,
        ledger: L,
        gate: G,
        config: R,
    ) -> CoreResult<PoolController<C, L, G, R>>
    where
        C: CreditLine + Clone,
        L: CashLedger,
        G: CredentialGate,
        R: ConfigRegistry,
    {
        PoolController::from_parts(self.params, self.state, self.positions, credit_line, ledger, gate, config)
    }
}
