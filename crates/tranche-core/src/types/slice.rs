//! # Slice Types
//!
//! One funding round: a senior and a junior tranche plus the slice-level
//! accrual counters the waterfall reads on every assessment.

use crate::constants::{junior_tranche_id, senior_tranche_id};
use crate::errors::{CoreResult, TrancheError};
use crate::math::safe_add_u128;
use crate::types::tranche::TrancheInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct PoolSlice {
    pub senior: TrancheInfo,
    pub junior: TrancheInfo,
    /// Principal drawn down from this slice and not yet repaid
    pub principal_deployed: u128,
    /// Interest accrued by the credit line attributed to this slice
    pub total_interest_accrued: u128,
    pub drawdown_made: bool,
}

impl PoolSlice {
    /// Fresh slice at `slice_index` with unit principal share prices
    pub fn new(slice_index: usize) -> Self {
        Self {
            senior: TrancheInfo::new(senior_tranche_id(slice_index)),
            junior: TrancheInfo::new(junior_tranche_id(slice_index)),
            principal_deployed: 0,
            total_interest_accrued: 0,
            drawdown_made: false,
        }
    }

    /// Senior plus junior principal deposited
    pub fn total_deposited(&self) -> CoreResult<u128> {
        safe_add_u128(self.senior.principal_deposited, self.junior.principal_deposited)
    }

    /// A slice stops taking deposits once both tranches are locked
    pub fn is_locked(&self) -> bool {
        self.senior.is_locked() && self.junior.is_locked()
    }

    pub fn tranche(&self, tranche_id: u64) -> CoreResult<&TrancheInfo> {
        if self.senior.id == tranche_id {
            Ok(&self.senior)
        } else if self.junior.id == tranche_id {
            Ok(&self.junior)
        } else {
            Err(TrancheError::InvalidTrancheId(tranche_id))
        }
    }

    pub fn tranche_mut(&mut self, tranche_id: u64) -> CoreResult<&mut TrancheInfo> {
        if self.senior.id == tranche_id {
            Ok(&mut self.senior)
        } else if self.junior.id == tranche_id {
            Ok(&mut self.junior)
        } else {
            Err(TrancheError::InvalidTrancheId(tranche_id))
        }
    }
}
