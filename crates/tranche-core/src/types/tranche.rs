//! # Tranche Types
//!
//! A tranche is one seniority class inside a slice. Shares are minted 1:1
//! with deposited USDC, so `principal_deposited` is also the share supply.

use crate::constants::{
    is_senior_tranche_id, INITIAL_INTEREST_SHARE_PRICE, INITIAL_PRINCIPAL_SHARE_PRICE,
};

/// Seniority class of a tranche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Seniority {
    /// Paid first, interest net of junior and reserve fees
    Senior,
    /// First-loss, absorbs every residual amount
    Junior,
}

/// Share accounting for one tranche
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct TrancheInfo {
    /// Odd ids are senior, even ids junior
    pub id: u64,
    /// Total principal deposited (equals total shares outstanding)
    pub principal_deposited: u128,
    /// USDC redeemable as principal per share (WAD)
    pub principal_share_price: u128,
    /// USDC redeemable as interest per share (WAD)
    pub interest_share_price: u128,
    /// Redemptions are blocked until this timestamp; 0 while the tranche is open
    pub locked_until: i64,
}

impl TrancheInfo {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            principal_deposited: 0,
            principal_share_price: INITIAL_PRINCIPAL_SHARE_PRICE,
            interest_share_price: INITIAL_INTEREST_SHARE_PRICE,
            locked_until: 0,
        }
    }

    pub fn seniority(&self) -> Seniority {
        if is_senior_tranche_id(self.id) {
            Seniority::Senior
        } else {
            Seniority::Junior
        }
    }

    #[inline]
    pub fn total_shares(&self) -> u128 {
        self.principal_deposited
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked_until != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tranche() {
        let senior = TrancheInfo::new(1);
        assert_eq!(senior.seniority(), Seniority::Senior);
        assert_eq!(senior.principal_share_price, INITIAL_PRINCIPAL_SHARE_PRICE);
        assert_eq!(senior.interest_share_price, 0);
        assert!(!senior.is_locked());

        assert_eq!(TrancheInfo::new(2).seniority(), Seniority::Junior);
    }
}
