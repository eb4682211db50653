//! # Collaborator Interfaces
//!
//! The pool consumes its surroundings through these traits only: the credit
//! line that tracks the borrower's debt, the cash ledger that moves stablecoin,
//! the credential gate guarding deposits and the protocol config registry.
//! Reference implementations live in [`crate::collaborators`].

use crate::errors::{CoreResult, TrancheError};
use crate::math::{safe_add_u128, safe_sub_u128};
use crate::types::AccountId;
use crate::waterfall::CreditLineView;

// ============================================================================
// Credit Line
// ============================================================================

/// Split of collected funds produced by one credit line assessment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Assessment {
    /// Collected funds not needed yet; they stay with the credit line
    pub payment_remaining: u128,
    pub interest_payment: u128,
    pub principal_payment: u128,
}

impl Assessment {
    pub fn total_payment(&self) -> CoreResult<u128> {
        safe_add_u128(self.interest_payment, self.principal_payment)
    }

    pub fn has_payment(&self) -> bool {
        self.interest_payment > 0 || self.principal_payment > 0
    }
}

/// The borrower's debt position backing a pool
pub trait CreditLine {
    /// Cash account payments are collected into
    fn account(&self) -> &AccountId;

    fn min_limit(&self) -> u128;
    fn max_limit(&self) -> u128;
    fn limit(&self) -> u128;
    fn set_limit(&mut self, limit: u128) -> CoreResult<()>;

    /// Outstanding principal
    fn balance(&self) -> u128;
    /// Principal currently due
    fn principal_owed(&self) -> u128;
    /// Interest currently due
    fn interest_owed(&self) -> u128;
    /// Lifetime interest accrued
    fn total_interest_accrued(&self) -> u128;

    fn funding_date(&self) -> i64;
    fn set_funding_date(&mut self, funding_date: i64);

    fn is_late(&self, now: i64) -> bool;
    /// Loan was drawn and is fully repaid
    fn is_paid_off(&self) -> bool;

    /// Record a drawdown of `amount` against the limit
    fn drawdown(&mut self, amount: u128, now: i64) -> CoreResult<()>;

    /// Accrue to `now` and apply `collected` funds to what is owed
    fn assess(&mut self, now: i64, collected: u128) -> CoreResult<Assessment>;

    fn view(&self) -> CreditLineView {
        CreditLineView { balance: self.balance(), principal_owed: self.principal_owed() }
    }
}

// ============================================================================
// Cash Ledger
// ============================================================================

/// Why cash moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferKind {
    Deposit,
    Withdrawal,
    Drawdown,
    Repayment,
    Collection,
    Reserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u128,
    pub kind: TransferKind,
}

/// Cash movements of one pool operation, settled all at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferBatch {
    transfers: Vec<Transfer>,
}

impl TransferBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transfer; zero amounts are dropped
    pub fn push(&mut self, from: &AccountId, to: &AccountId, amount: u128, kind: TransferKind) {
        if amount == 0 {
            return;
        }
        self.transfers.push(Transfer { from: from.clone(), to: to.clone(), amount, kind });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Balance `account` would hold once this batch settles
    pub fn projected_balance(&self, account: &AccountId, settled_balance: u128) -> CoreResult<u128> {
        let mut balance = settled_balance;
        for transfer in &self.transfers {
            if &transfer.to == account {
                balance = safe_add_u128(balance, transfer.amount)?;
            }
            if &transfer.from == account {
                balance = safe_sub_u128(balance, transfer.amount).map_err(|_| {
                    TrancheError::transfer_failed(format!("{} would be overdrawn", account))
                })?;
            }
        }
        Ok(balance)
    }
}

impl IntoIterator for TransferBatch {
    type Item = Transfer;
    type IntoIter = std::vec::IntoIter<Transfer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transfers.into_iter()
    }
}

/// Stablecoin balances
pub trait CashLedger {
    fn balance_of(&self, account: &AccountId) -> u128;

    /// Apply every transfer or none of them
    fn settle(&mut self, batch: &TransferBatch) -> CoreResult<()>;
}

// ============================================================================
// Credential Gate and Config Registry
// ============================================================================

pub trait CredentialGate {
    fn has_allowed_uid(&self, account: &AccountId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberKey {
    /// Reserve fee is `100 / ReserveDenominator` percent
    ReserveDenominator,
    /// Allowed deviation from the target junior ratio (bps)
    JuniorRatioSlippage,
    DrawdownPeriodInSeconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressKey {
    TreasuryReserve,
    ProtocolAdmin,
}

/// Protocol-wide parameters resolved by key
pub trait ConfigRegistry {
    fn number(&self, key: NumberKey) -> CoreResult<u128>;
    fn address(&self, key: AddressKey) -> CoreResult<AccountId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_skips_zero_and_projects_balances() {
        let alice = AccountId::from("alice");
        let pool = AccountId::from("pool");

        let mut batch = TransferBatch::new();
        batch.push(&alice, &pool, 0, TransferKind::Deposit);
        assert!(batch.is_empty());

        batch.push(&alice, &pool, 70, TransferKind::Deposit);
        batch.push(&pool, &alice, 20, TransferKind::Withdrawal);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.projected_balance(&pool, 0).unwrap(), 50);
        assert_eq!(batch.projected_balance(&alice, 100).unwrap(), 50);
        assert!(matches!(
            batch.projected_balance(&alice, 10),
            Err(TrancheError::TransferFailed(_))
        ));
    }

    #[test]
    fn test_assessment_totals() {
        let assessment = Assessment { payment_remaining: 3, interest_payment: 5, principal_payment: 7 };
        assert_eq!(assessment.total_payment().unwrap(), 12);
        assert!(assessment.has_payment());
        assert!(!Assessment::default().has_payment());
    }
}
