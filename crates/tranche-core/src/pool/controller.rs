use std::borrow::Cow;

use crate::errors::{CoreResult, TrancheError};
use crate::events::PoolEvent;
use crate::interfaces::{AddressKey, CashLedger, ConfigRegistry, CredentialGate, CreditLine};
use crate::pool::operations::{self, waterfall_params};
use crate::pool::staging::{Env, Staged};
use crate::pool::state::{PoolState, PoolStatus};
use crate::pool::{AssessmentReport, Withdrawal};
use crate::types::{AccountId, PoolParams, PoolSlice, Position, PositionId, PositionStore};

/// Single owner of a pool and its collaborators
///
/// Every mutating operation takes `&mut self`, so operations on one pool can
/// never interleave. Each one is all-or-nothing: state, positions, credit
/// line, cash and events change together or not at all.
pub struct PoolController<C, L, G, R> {
    params: PoolParams,
    state: PoolState,
    positions: PositionStore,
    credit_line: C,
    ledger: L,
    gate: G,
    config: R,
    events: Vec<PoolEvent>,
}

impl<C, L, G, R> PoolController<C, L, G, R>
where
    C: CreditLine + Clone,
    L: CashLedger,
    G: CredentialGate,
    R: ConfigRegistry,
{
    /// Create a pool with its first slice
    pub fn new(params: PoolParams, credit_line: C, ledger: L, gate: G, config: R) -> CoreResult<Self> {
        let state = PoolState::new(params.fundable_at);
        let mut controller = Self::from_parts(params, state, PositionStore::new(), credit_line, ledger, gate, config)?;
        controller.record(vec![PoolEvent::SliceCreated {
            slice_index: 0,
            fundable_at: controller.params.fundable_at,
        }]);
        Ok(controller)
    }

    /// Reassemble a pool from previously saved parts
    pub fn from_parts(
        params: PoolParams,
        state: PoolState,
        positions: PositionStore,
        credit_line: C,
        ledger: L,
        gate: G,
        config: R,
    ) -> CoreResult<Self> {
        params.validate()?;
        if params.fundable_at > credit_line.funding_date() {
            return Err(TrancheError::invalid_parameter("fundable_at", "is after the funding date"));
        }
        if state.slices.is_empty() {
            return Err(TrancheError::invalid_parameter("slices", "pool has no slices"));
        }

        let controller = Self {
            params,
            state,
            positions,
            credit_line,
            ledger,
            gate,
            config,
            events: Vec::new(),
        };

        // Fail on a bad protocol config now rather than on the first payment
        waterfall_params(&controller.env())?;
        controller.config.address(AddressKey::TreasuryReserve)?;
        Ok(controller)
    }

    fn env(&self) -> Env<'_> {
        Env {
            params: &self.params,
            ledger: &self.ledger,
            gate: &self.gate,
            config: &self.config,
        }
    }

    fn record(&mut self, events: Vec<PoolEvent>) {
        for event in &events {
            log::info!("pool {}: {:?}", self.params.pool_account, event);
        }
        self.events.extend(events);
    }

    /// Run `op` on a staged copy, settle its cash movements, then commit
    fn execute<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Staged<'_, C>, &Env<'_>) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut staged = Staged::new(&self.state, &self.positions, &self.credit_line);

        let result = op(&mut staged, &self.env());
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                log::warn!("pool {}: {} rejected: {}", self.params.pool_account, operation, err);
                return Err(err);
            }
        };

        if let Err(err) = self.ledger.settle(&staged.transfers) {
            log::warn!("pool {}: {} rolled back: {}", self.params.pool_account, operation, err);
            return Err(err);
        }

        log::debug!(
            "pool {}: {} committed with {} transfers",
            self.params.pool_account,
            operation,
            staged.transfers.len()
        );
        let Staged { state, positions, credit_line, events, .. } = staged;
        self.state = state;
        // Operations that never wrote a position left the store borrowed
        if let Cow::Owned(positions) = positions {
            self.positions = positions;
        }
        self.credit_line = credit_line;
        self.record(events);
        Ok(value)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub fn deposit(&mut self, owner: &AccountId, tranche_id: u64, amount: u128, now: i64) -> CoreResult<PositionId> {
        self.execute("deposit", |staged, env| staged.deposit(env, owner, tranche_id, amount, now))
    }

    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        position_id: PositionId,
        amount: u128,
        now: i64,
    ) -> CoreResult<Withdrawal> {
        self.execute("withdraw", |staged, env| staged.withdraw(env, caller, position_id, amount, now))
    }

    /// Withdraw everything the position can currently take out
    pub fn withdraw_max(&mut self, caller: &AccountId, position_id: PositionId, now: i64) -> CoreResult<Withdrawal> {
        let position = self.positions.get(position_id)?;
        let tranche = self.state.tranche(position.tranche_id)?;
        let amount = if self.state.cancelled || !tranche.is_locked() {
            position.principal_amount
        } else {
            0
        };
        self.withdraw(caller, position_id, amount, now)
    }

    pub fn lock_pool(&mut self, now: i64) -> CoreResult<()> {
        self.execute("lock_pool", |staged, env| staged.lock_pool(env, now))
    }

    pub fn drawdown(&mut self, amount: u128, now: i64) -> CoreResult<()> {
        self.execute("drawdown", |staged, env| staged.drawdown(env, amount, now))
    }

    pub fn pay(&mut self, payer: &AccountId, amount: u128, now: i64) -> CoreResult<AssessmentReport> {
        self.execute("pay", |staged, env| staged.pay(env, payer, amount, now))
    }

    pub fn assess(&mut self, now: i64) -> CoreResult<AssessmentReport> {
        self.execute("assess", |staged, env| staged.assess(env, now))
    }

    pub fn initialize_next_slice(&mut self, fundable_at: i64, funding_date: i64, now: i64) -> CoreResult<usize> {
        self.execute("initialize_next_slice", |staged, _| {
            staged.initialize_next_slice(fundable_at, funding_date, now)
        })
    }

    pub fn cancel(&mut self, now: i64) -> CoreResult<()> {
        self.execute("cancel", |staged, _| staged.cancel(now))
    }

    pub fn close(&mut self) -> CoreResult<()> {
        self.execute("close", |staged, _| staged.close())
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn status(&self) -> PoolStatus {
        self.state.status()
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn slices(&self) -> &[PoolSlice] {
        &self.state.slices
    }

    pub fn total_deployed(&self) -> u128 {
        self.state.total_deployed
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn position(&self, position_id: PositionId) -> CoreResult<&Position> {
        self.positions.get(position_id)
    }

    pub fn credit_line(&self) -> &C {
        &self.credit_line
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for funding accounts outside pool operations
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut G {
        &mut self.gate
    }

    pub fn config(&self) -> &R {
        &self.config
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn available_to_withdraw(&self, position_id: PositionId) -> CoreResult<(u128, u128)> {
        operations::available_to_withdraw(&self.state, &self.positions, position_id)
    }

    pub fn maximum_investment(&self, tranche_id: u64) -> CoreResult<u128> {
        operations::maximum_investment(&self.state, &self.credit_line, &self.params, tranche_id)
    }

    pub fn current_investment_ratio(&self) -> CoreResult<u128> {
        self.state.current_investment_ratio()
    }

    pub fn pool_requirements_fulfilled(&self) -> CoreResult<bool> {
        operations::pool_requirements_fulfilled(&self.state, &self.credit_line, &self.env())
    }

    /// Funding succeeded: the current slice is locked and the pool was not
    /// cancelled
    pub fn pool_funding_evaluate(&self) -> bool {
        !self.state.cancelled && self.state.current_slice().map_or(false, PoolSlice::is_locked)
    }

    pub fn drawdown_available(&self) -> CoreResult<u128> {
        operations::drawdown_available(&self.state)
    }
}
