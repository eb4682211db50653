//! In-memory stablecoin ledger.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{CoreResult, TrancheError};
use crate::interfaces::{CashLedger, TransferBatch};
use crate::math::safe_add_u128;
use crate::types::AccountId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct InMemoryLedger {
    balances: BTreeMap<AccountId, u128>,
    /// Accounts whose transfers are rejected
    frozen: BTreeSet<AccountId>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air
    pub fn mint(&mut self, account: &AccountId, amount: u128) -> CoreResult<()> {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = safe_add_u128(*balance, amount)?;
        Ok(())
    }

    pub fn freeze(&mut self, account: &AccountId) {
        self.frozen.insert(account.clone());
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.balances.iter()
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl CashLedger for InMemoryLedger {
    fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn settle(&mut self, batch: &TransferBatch) -> CoreResult<()> {
        let mut staged = self.balances.clone();

        for transfer in batch.iter() {
            if self.frozen.contains(&transfer.from) || self.frozen.contains(&transfer.to) {
                return Err(TrancheError::transfer_failed(format!(
                    "{:?} of {} from {} to {}: account frozen",
                    transfer.kind, transfer.amount, transfer.from, transfer.to
                )));
            }

            let from_balance = staged.get(&transfer.from).copied().unwrap_or(0);
            if from_balance < transfer.amount {
                return Err(TrancheError::transfer_failed(format!(
                    "{:?} of {} from {}: balance is {}",
                    transfer.kind, transfer.amount, transfer.from, from_balance
                )));
            }
            staged.insert(transfer.from.clone(), from_balance - transfer.amount);

            let to_balance = staged.entry(transfer.to.clone()).or_insert(0);
            *to_balance = safe_add_u128(*to_balance, transfer.amount)?;
        }

        self.balances = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::TransferKind;

    #[test]
    fn test_settle_is_all_or_nothing() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice, 100).unwrap();

        let mut batch = TransferBatch::new();
        batch.push(&alice, &bob, 60, TransferKind::Deposit);
        batch.push(&alice, &bob, 60, TransferKind::Deposit);
        assert!(ledger.settle(&batch).is_err());
        assert_eq!(ledger.balance_of(&alice), 100);
        assert_eq!(ledger.balance_of(&bob), 0);

        let mut batch = TransferBatch::new();
        batch.push(&alice, &bob, 60, TransferKind::Deposit);
        batch.push(&bob, &alice, 10, TransferKind::Withdrawal);
        ledger.settle(&batch).unwrap();
        assert_eq!(ledger.balance_of(&alice), 50);
        assert_eq!(ledger.balance_of(&bob), 50);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn test_frozen_account_rejects_transfers() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice, 100).unwrap();
        ledger.freeze(&bob);

        let mut batch = TransferBatch::new();
        batch.push(&alice, &bob, 1, TransferKind::Deposit);
        assert!(matches!(ledger.settle(&batch), Err(TrancheError::TransferFailed(_))));

        ledger.unfreeze(&bob);
        ledger.settle(&batch).unwrap();
        assert_eq!(ledger.balance_of(&bob), 1);
    }
}
