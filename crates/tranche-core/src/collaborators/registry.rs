//! Static protocol configuration.

use std::collections::BTreeMap;

use crate::constants::{
    DEFAULT_DRAWDOWN_PERIOD_SECONDS, DEFAULT_JUNIOR_RATIO_SLIPPAGE_BPS, DEFAULT_RESERVE_DENOMINATOR,
};
use crate::errors::{CoreResult, TrancheError};
use crate::interfaces::{AddressKey, ConfigRegistry, NumberKey};
use crate::types::AccountId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticConfig {
    numbers: BTreeMap<NumberKey, u128>,
    addresses: BTreeMap<AddressKey, AccountId>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        let mut numbers = BTreeMap::new();
        numbers.insert(NumberKey::ReserveDenominator, DEFAULT_RESERVE_DENOMINATOR);
        numbers.insert(NumberKey::JuniorRatioSlippage, DEFAULT_JUNIOR_RATIO_SLIPPAGE_BPS);
        numbers.insert(NumberKey::DrawdownPeriodInSeconds, DEFAULT_DRAWDOWN_PERIOD_SECONDS as u128);
        Self { numbers, addresses: BTreeMap::new() }
    }
}

impl StaticConfig {
    pub fn with_number(mut self, key: NumberKey, value: u128) -> Self {
        self.numbers.insert(key, value);
        self
    }

    pub fn with_address(mut self, key: AddressKey, account: AccountId) -> Self {
        self.addresses.insert(key, account);
        self
    }
}

impl ConfigRegistry for StaticConfig {
    fn number(&self, key: NumberKey) -> CoreResult<u128> {
        self.numbers
            .get(&key)
            .copied()
            .ok_or_else(|| TrancheError::invalid_parameter("config", format!("{:?} is not set", key)))
    }

    fn address(&self, key: AddressKey) -> CoreResult<AccountId> {
        self.addresses
            .get(&key)
            .cloned()
            .ok_or_else(|| TrancheError::invalid_parameter("config", format!("{:?} is not set", key)))
    }
}
