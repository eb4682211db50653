//! Shared pool fixture for integration tests.

#![allow(dead_code)]

use tranche_core::collaborators::{AllowList, CreditTerms, FixedTermCreditLine, InMemoryLedger, StaticConfig};
use tranche_core::{AccountId, AddressKey, CashLedger, NumberKey, PoolController, PoolParams, SECONDS_PER_DAY, SECONDS_PER_YEAR};

pub type TestPool = PoolController<FixedTermCreditLine, InMemoryLedger, AllowList, StaticConfig>;

pub const START: i64 = 1_700_000_000;
pub const FUNDING_DATE: i64 = START + 7 * SECONDS_PER_DAY;
pub const DRAWDOWN_PERIOD: i64 = SECONDS_PER_DAY;
pub const STARTING_BALANCE: u128 = 1_000_000;

pub fn alice() -> AccountId {
    AccountId::from("alice")
}

pub fn bob() -> AccountId {
    AccountId::from("bob")
}

pub fn carol() -> AccountId {
    AccountId::from("carol")
}

pub fn borrower() -> AccountId {
    AccountId::from("borrower")
}

pub fn treasury() -> AccountId {
    AccountId::from("treasury")
}

pub fn pool_account() -> AccountId {
    AccountId::from("pool")
}

pub fn credit_line_account() -> AccountId {
    AccountId::from("credit-line")
}

/// Pool knobs, defaulting to a 10% APR two-year loan with a 10% junior fee
/// and a 5% reserve fee
#[derive(Debug, Clone)]
pub struct Fixture {
    pub junior_fee_percent: u128,
    pub junior_ratio_bps: u128,
    pub min_ticket_size: u128,
    pub min_limit: u128,
    pub max_limit: u128,
    pub interest_apr_bps: u128,
    pub term_seconds: i64,
    pub reserve_denominator: u128,
    pub slippage_bps: u128,
    pub open_gate: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            junior_fee_percent: 10,
            junior_ratio_bps: 6_667,
            min_ticket_size: 10,
            min_limit: 1_000,
            max_limit: 10_000,
            interest_apr_bps: 1_000,
            term_seconds: 2 * SECONDS_PER_YEAR,
            reserve_denominator: 20,
            slippage_bps: 500,
            open_gate: true,
        }
    }
}

impl Fixture {
    pub fn build(&self) -> TestPool {
        let params = PoolParams {
            pool_account: pool_account(),
            borrower: borrower(),
            junior_fee_percent: self.junior_fee_percent,
            junior_ratio_bps: self.junior_ratio_bps,
            min_ticket_size: self.min_ticket_size,
            fundable_at: START,
        };
        let terms = CreditTerms {
            min_limit: self.min_limit,
            max_limit: self.max_limit,
            interest_apr_bps: self.interest_apr_bps,
            payment_period_seconds: 30 * SECONDS_PER_DAY,
            term_seconds: self.term_seconds,
            grace_period_seconds: 5 * SECONDS_PER_DAY,
        };
        let credit_line = FixedTermCreditLine::new(credit_line_account(), terms, FUNDING_DATE)
            .expect("valid credit terms");

        let config = StaticConfig::default()
            .with_number(NumberKey::ReserveDenominator, self.reserve_denominator)
            .with_number(NumberKey::JuniorRatioSlippage, self.slippage_bps)
            .with_number(NumberKey::DrawdownPeriodInSeconds, DRAWDOWN_PERIOD as u128)
            .with_address(AddressKey::TreasuryReserve, treasury());

        let mut ledger = InMemoryLedger::new();
        for account in [alice(), bob(), carol(), borrower()] {
            ledger.mint(&account, STARTING_BALANCE).expect("mint");
        }

        let gate = if self.open_gate {
            AllowList::open()
        } else {
            let mut gate = AllowList::new();
            gate.allow(&alice());
            gate
        };

        PoolController::new(params, credit_line, ledger, gate, config).expect("valid pool")
    }
}

/// Senior 600 by alice, junior 400 by bob, locked and fully drawn down
pub fn funded_pool() -> (TestPool, u64, u64) {
    let mut pool = Fixture::default().build();
    let senior = pool.deposit(&alice(), 1, 600, START).unwrap();
    let junior = pool.deposit(&bob(), 2, 400, START).unwrap();
    pool.lock_pool(START).unwrap();
    pool.drawdown(1_000, START).unwrap();
    (pool, senior, junior)
}

pub fn balance(pool: &TestPool, account: &AccountId) -> u128 {
    pool.ledger().balance_of(account)
}
