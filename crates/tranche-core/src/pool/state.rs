//! Hot pool state: slices and lifecycle flags, read on every assessment.

use crate::constants::{tranche_id_to_slice_index, BPS_DENOMINATOR};
use crate::errors::{CoreResult, TrancheError};
use crate::math::{mul_div_u128, safe_sum_u128, Rounding};
use crate::types::{PoolSlice, TrancheInfo};

/// Lifecycle status derived from [`PoolState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolStatus {
    /// Current slice accepts deposits and withdrawals
    Open,
    /// Current slice is funded; drawdowns and assessments run
    Locked,
    Closed,
    Cancelled,
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct PoolState {
    pub slices: Vec<PoolSlice>,
    /// Sum of `principal_deployed` over all slices
    pub total_deployed: u128,
    /// Deposits into the current slice open at this timestamp
    pub fundable_at: i64,
    pub cancelled: bool,
    pub closed: bool,
}

impl PoolState {
    pub fn new(fundable_at: i64) -> Self {
        Self {
            slices: vec![PoolSlice::new(0)],
            total_deployed: 0,
            fundable_at,
            cancelled: false,
            closed: false,
        }
    }

    pub fn status(&self) -> PoolStatus {
        if self.cancelled {
            PoolStatus::Cancelled
        } else if self.closed {
            PoolStatus::Closed
        } else if self.current_slice().map_or(false, PoolSlice::is_locked) {
            PoolStatus::Locked
        } else {
            PoolStatus::Open
        }
    }

    pub fn current_slice(&self) -> CoreResult<&PoolSlice> {
        self.slices
            .last()
            .ok_or_else(|| TrancheError::invalid_parameter("slices", "pool has no slices"))
    }

    pub fn current_slice_mut(&mut self) -> CoreResult<&mut PoolSlice> {
        self.slices
            .last_mut()
            .ok_or_else(|| TrancheError::invalid_parameter("slices", "pool has no slices"))
    }

    /// Some slice has been funded, so the credit line may carry debt
    pub fn has_locked_slice(&self) -> bool {
        self.slices.iter().any(PoolSlice::is_locked)
    }

    pub fn slice_index(&self, tranche_id: u64) -> CoreResult<usize> {
        if tranche_id == 0 {
            return Err(TrancheError::InvalidTrancheId(tranche_id));
        }
        let index = tranche_id_to_slice_index(tranche_id);
        if index >= self.slices.len() {
            return Err(TrancheError::InvalidTrancheId(tranche_id));
        }
        Ok(index)
    }

    pub fn tranche(&self, tranche_id: u64) -> CoreResult<&TrancheInfo> {
        let index = self.slice_index(tranche_id)?;
        self.slices[index].tranche(tranche_id)
    }

    pub fn tranche_mut(&mut self, tranche_id: u64) -> CoreResult<&mut TrancheInfo> {
        let index = self.slice_index(tranche_id)?;
        self.slices[index].tranche_mut(tranche_id)
    }

    /// Junior principal per senior principal in the current slice (bps)
    pub fn current_investment_ratio(&self) -> CoreResult<u128> {
        let slice = self.current_slice()?;
        if slice.senior.principal_deposited == 0 {
            return Ok(0);
        }
        mul_div_u128(
            slice.junior.principal_deposited,
            BPS_DENOMINATOR,
            slice.senior.principal_deposited,
            Rounding::Down,
        )
    }

    /// Interest already spread across slices
    pub fn total_interest_accrued(&self) -> CoreResult<u128> {
        safe_sum_u128(self.slices.iter().map(|s| s.total_interest_accrued))
    }
}
