//! # Pool Events
//!
//! Accounting events recorded by the controller. Events of a failed
//! operation are discarded together with its staged state.

use crate::types::{AccountId, PositionId};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "snake_case"))]
pub enum PoolEvent {
    SliceCreated {
        slice_index: usize,
        fundable_at: i64,
    },
    DepositMade {
        owner: AccountId,
        tranche_id: u64,
        position_id: PositionId,
        amount: u128,
    },
    WithdrawalMade {
        owner: AccountId,
        tranche_id: u64,
        position_id: PositionId,
        interest_withdrawn: u128,
        principal_withdrawn: u128,
    },
    TrancheLocked {
        tranche_id: u64,
        locked_until: i64,
    },
    DrawdownMade {
        borrower: AccountId,
        amount: u128,
    },
    SharePriceUpdated {
        tranche_id: u64,
        principal_share_price: u128,
        interest_share_price: u128,
    },
    PaymentApplied {
        interest: u128,
        principal: u128,
        remaining: u128,
        reserve: u128,
    },
    ReserveFundsCollected {
        to: AccountId,
        amount: u128,
    },
    PoolCancelled,
    PoolClosed,
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SliceCreated { .. } => "slice_created",
            Self::DepositMade { .. } => "deposit_made",
            Self::WithdrawalMade { .. } => "withdrawal_made",
            Self::TrancheLocked { .. } => "tranche_locked",
            Self::DrawdownMade { .. } => "drawdown_made",
            Self::SharePriceUpdated { .. } => "share_price_updated",
            Self::PaymentApplied { .. } => "payment_applied",
            Self::ReserveFundsCollected { .. } => "reserve_funds_collected",
            Self::PoolCancelled => "pool_cancelled",
            Self::PoolClosed => "pool_closed",
        }
    }
}
