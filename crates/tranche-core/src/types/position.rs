//! # Positions
//!
//! A position is one holder's claim on one tranche. Positions live in a
//! [`PositionStore`] arena and are addressed by generated ids.

use std::collections::BTreeMap;

use crate::errors::{CoreResult, TrancheError};
use crate::math::{safe_add_u128, safe_sub_u128};
use crate::types::account::AccountId;

pub type PositionId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub tranche_id: u64,
    /// Principal deposited, which is also the share count
    pub principal_amount: u128,
    pub principal_redeemed: u128,
    pub interest_redeemed: u128,
}

impl Position {
    /// Nothing left to claim
    pub fn is_empty(&self) -> bool {
        self.principal_amount == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct PositionStore {
    next_id: PositionId,
    positions: BTreeMap<PositionId, Position>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self { next_id: 1, positions: BTreeMap::new() }
    }

    /// Record a new claim and return its id
    pub fn mint(&mut self, owner: AccountId, tranche_id: u64, principal_amount: u128) -> PositionId {
        // Default-constructed stores start at zero; ids are never reused
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.positions.insert(
            id,
            Position {
                id,
                owner,
                tranche_id,
                principal_amount,
                principal_redeemed: 0,
                interest_redeemed: 0,
            },
        );
        id
    }

    pub fn get(&self, id: PositionId) -> CoreResult<&Position> {
        self.positions.get(&id).ok_or(TrancheError::InvalidPositionId(id))
    }

    pub fn get_mut(&mut self, id: PositionId) -> CoreResult<&mut Position> {
        self.positions.get_mut(&id).ok_or(TrancheError::InvalidPositionId(id))
    }

    /// Pre-lock principal withdrawal, burning `amount` shares
    pub fn withdraw_principal(&mut self, id: PositionId, amount: u128) -> CoreResult<()> {
        let position = self.get_mut(id)?;
        if amount > position.principal_amount {
            return Err(TrancheError::InsufficientShares {
                requested: amount,
                available: position.principal_amount,
            });
        }
        position.principal_amount -= amount;
        Ok(())
    }

    /// Post-lock redemption bookkeeping
    pub fn redeem(&mut self, id: PositionId, principal: u128, interest: u128) -> CoreResult<()> {
        let position = self.get_mut(id)?;
        position.principal_redeemed = safe_add_u128(position.principal_redeemed, principal)?;
        position.interest_redeemed = safe_add_u128(position.interest_redeemed, interest)?;
        // Redeemed principal may never exceed what was deposited
        safe_sub_u128(position.principal_amount, position.principal_redeemed)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn by_owner<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a Position> + 'a {
        self.positions.values().filter(move |p| &p.owner == owner)
    }

    pub fn by_tranche(&self, tranche_id: u64) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(move |p| p.tranche_id == tranche_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_assigns_increasing_ids() {
        let mut store = PositionStore::new();
        let a = store.mint(AccountId::from("alice"), 1, 100);
        let b = store.mint(AccountId::from("bob"), 2, 50);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.by_owner(&AccountId::from("bob")).count(), 1);
        assert_eq!(store.by_tranche(1).count(), 1);
    }

    #[test]
    fn test_default_store_never_hands_out_zero() {
        let mut store = PositionStore::default();
        assert_eq!(store.mint(AccountId::from("alice"), 1, 1), 1);
        assert_eq!(store.mint(AccountId::from("alice"), 1, 1), 2);
    }

    #[test]
    fn test_withdraw_principal() {
        let mut store = PositionStore::new();
        let id = store.mint(AccountId::from("alice"), 1, 100);
        store.withdraw_principal(id, 40).unwrap();
        assert_eq!(store.get(id).unwrap().principal_amount, 60);

        assert_eq!(
            store.withdraw_principal(id, 61),
            Err(TrancheError::InsufficientShares { requested: 61, available: 60 })
        );
        assert_eq!(store.get(99).unwrap_err(), TrancheError::InvalidPositionId(99));
    }

    #[test]
    fn test_redeem_cannot_exceed_principal() {
        let mut store = PositionStore::new();
        let id = store.mint(AccountId::from("alice"), 1, 100);
        store.redeem(id, 100, 7).unwrap();
        assert_eq!(store.get(id).unwrap().interest_redeemed, 7);
        assert!(store.redeem(id, 1, 0).is_err());
    }
}
