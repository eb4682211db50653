//! # Pool Controller
//!
//! Orchestrates the pool lifecycle (`Open -> Locked -> Closed`, or
//! `Open -> Cancelled`) on top of share accounting and the waterfall.

mod controller;
mod operations;
mod staging;
pub mod state;

pub use controller::PoolController;
pub use state::{PoolState, PoolStatus};

use crate::errors::CoreResult;
use crate::interfaces::Assessment;
use crate::math::safe_add_u128;
use crate::waterfall::PaymentAllocation;

/// Cash handed to a position holder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Withdrawal {
    pub interest: u128,
    pub principal: u128,
}

impl Withdrawal {
    pub fn total(&self) -> CoreResult<u128> {
        safe_add_u128(self.interest, self.principal)
    }
}

/// Outcome of one `assess`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AssessmentReport {
    pub assessment: Assessment,
    /// Credit line interest newly spread across slices
    pub interest_accrued: u128,
    /// `None` when nothing was collected
    pub allocation: Option<PaymentAllocation>,
}

impl AssessmentReport {
    pub fn is_noop(&self) -> bool {
        self.allocation.is_none()
    }
}
