//! # Pool Parameters
//!
//! Cold configuration fixed at pool creation. Hot per-assessment state lives
//! in [`crate::pool::PoolState`].

use crate::constants::{MAX_JUNIOR_FEE_PERCENT, MAX_JUNIOR_RATIO_BPS, BPS_DENOMINATOR};
use crate::errors::{CoreResult, TrancheError};
use crate::math::mul_div_u128;
use crate::math::Rounding;
use crate::types::account::AccountId;
use crate::types::tranche::Seniority;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct PoolParams {
    /// Account holding deposited cash
    pub pool_account: AccountId,
    /// Receives drawdowns, makes payments
    pub borrower: AccountId,
    /// Share of senior interest paid to the junior tranche (whole percent)
    pub junior_fee_percent: u128,
    /// Target junior:senior principal ratio (bps, 5_000 = one junior per two senior)
    pub junior_ratio_bps: u128,
    /// Smallest accepted deposit
    pub min_ticket_size: u128,
    /// Deposits open at this timestamp for the first slice
    pub fundable_at: i64,
}

impl PoolParams {
    pub fn validate(&self) -> CoreResult<()> {
        if self.junior_fee_percent > MAX_JUNIOR_FEE_PERCENT {
            return Err(TrancheError::invalid_parameter(
                "junior_fee_percent",
                format!("{} exceeds {}", self.junior_fee_percent, MAX_JUNIOR_FEE_PERCENT),
            ));
        }

        if self.junior_ratio_bps == 0 || self.junior_ratio_bps > MAX_JUNIOR_RATIO_BPS {
            return Err(TrancheError::invalid_parameter(
                "junior_ratio_bps",
                format!("{} is outside 1..={}", self.junior_ratio_bps, MAX_JUNIOR_RATIO_BPS),
            ));
        }

        if self.min_ticket_size == 0 {
            return Err(TrancheError::invalid_parameter("min_ticket_size", "must be greater than 0"));
        }

        if self.pool_account == self.borrower {
            return Err(TrancheError::invalid_parameter(
                "borrower",
                "borrower and pool account must differ",
            ));
        }

        Ok(())
    }

    /// Cap on a tranche's principal given the credit line's maximum limit
    ///
    /// With `r = junior_ratio_bps` the junior tranche may take
    /// `max_limit * r / (10_000 + r)` and the senior tranche the rest.
    pub fn maximum_investment(&self, seniority: Seniority, max_limit: u128) -> CoreResult<u128> {
        let denominator = BPS_DENOMINATOR + self.junior_ratio_bps;
        let numerator = match seniority {
            Seniority::Junior => self.junior_ratio_bps,
            Seniority::Senior => BPS_DENOMINATOR,
        };
        mul_div_u128(max_limit, numerator, denominator, Rounding::Down)
    }
}
