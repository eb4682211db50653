//! Working copy of a pool operation.
//!
//! Every mutating operation runs against a [`Staged`] clone of the pool state
//! and credit line. Positions are borrowed and only copied on the first write,
//! so operations that never touch a position never clone the store. Cash
//! movements are queued in a [`TransferBatch`]; only after the ledger settles
//! that batch are the staged values written back. A failure anywhere leaves
//! the controller untouched.

use std::borrow::Cow;

use crate::errors::CoreResult;
use crate::events::PoolEvent;
use crate::interfaces::{CashLedger, ConfigRegistry, CredentialGate, TransferBatch, TransferKind};
use crate::pool::state::PoolState;
use crate::types::{AccountId, PoolParams, PositionStore};

/// Read-only collaborators visible to a staged operation
pub(crate) struct Env<'a> {
    pub params: &'a PoolParams,
    pub ledger: &'a dyn CashLedger,
    pub gate: &'a dyn CredentialGate,
    pub config: &'a dyn ConfigRegistry,
}

pub(crate) struct Staged<'a, C> {
    pub state: PoolState,
    pub positions: Cow<'a, PositionStore>,
    pub credit_line: C,
    pub transfers: TransferBatch,
    pub events: Vec<PoolEvent>,
}

impl<'a, C: Clone> Staged<'a, C> {
    pub fn new(state: &PoolState, positions: &'a PositionStore, credit_line: &C) -> Self {
        Self {
            state: state.clone(),
            positions: Cow::Borrowed(positions),
            credit_line: credit_line.clone(),
            transfers: TransferBatch::new(),
            events: Vec::new(),
        }
    }
}

impl<C> Staged<'_, C> {
    /// Writable positions, copied from the controller on first use
    pub fn positions_mut(&mut self) -> &mut PositionStore {
        self.positions.to_mut()
    }

    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128, kind: TransferKind) {
        self.transfers.push(from, to, amount, kind);
    }

    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    /// Balance `account` will hold once the queued transfers settle
    pub fn projected_balance(&self, env: &Env<'_>, account: &AccountId) -> CoreResult<u128> {
        self.transfers.projected_balance(account, env.ledger.balance_of(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_copied_on_first_write() {
        let mut store = PositionStore::new();
        store.mint(AccountId::new("alice"), 1, 100);
        let state = PoolState::new(0);

        let mut staged = Staged::new(&state, &store, &());
        assert_eq!(staged.positions.len(), 1);
        assert!(matches!(staged.positions, Cow::Borrowed(_)));

        staged.positions_mut().mint(AccountId::new("bob"), 2, 50);
        assert!(matches!(staged.positions, Cow::Owned(_)));
        assert_eq!(staged.positions.len(), 2);
        assert_eq!(store.len(), 1);
    }
}
