//! Pool operations, run against a staged copy of the pool.
//!
//! Each function validates before it mutates anything, queues its cash
//! movements on the staged transfer batch and records events. Committing is
//! the controller's job.

use crate::accounting;
use crate::constants::MAX_SLICES;
use crate::errors::{CoreResult, TrancheError};
use crate::events::PoolEvent;
use crate::interfaces::{AddressKey, CreditLine, NumberKey, TransferKind};
use crate::math::{
    safe_add_u128, safe_sub_u128, scale_by_fraction, share_price_to_usdc, Rounding,
};
use crate::pool::staging::{Env, Staged};
use crate::pool::state::{PoolState, PoolStatus};
use crate::pool::{AssessmentReport, Withdrawal};
use crate::types::{AccountId, PoolParams, PoolSlice, PositionId, PositionStore};
use crate::waterfall::{allocate_payment, WaterfallParams};

// ============================================================================
// Shared Checks
// ============================================================================

pub(crate) fn ensure_active(status: PoolStatus) -> CoreResult<()> {
    match status {
        PoolStatus::Cancelled => Err(TrancheError::PoolCancelled),
        PoolStatus::Closed => Err(TrancheError::PoolClosed),
        PoolStatus::Open | PoolStatus::Locked => Ok(()),
    }
}

pub(crate) fn config_seconds(env: &Env<'_>, key: NumberKey) -> CoreResult<i64> {
    let value = env.config.number(key)?;
    i64::try_from(value).map_err(|_| TrancheError::ConversionError)
}

pub(crate) fn waterfall_params(env: &Env<'_>) -> CoreResult<WaterfallParams> {
    let reserve_denominator = env.config.number(NumberKey::ReserveDenominator)?;
    WaterfallParams::from_reserve_denominator(env.params.junior_fee_percent, reserve_denominator)
}

// ============================================================================
// Read-Only Queries
// ============================================================================

/// Maximum principal a tranche may hold
pub(crate) fn maximum_investment<C: CreditLine>(
    state: &PoolState,
    credit_line: &C,
    params: &PoolParams,
    tranche_id: u64,
) -> CoreResult<u128> {
    let tranche = state.tranche(tranche_id)?;
    params.maximum_investment(tranche.seniority(), credit_line.max_limit())
}

/// Current slice meets the credit line minimum and the junior ratio band
pub(crate) fn pool_requirements_fulfilled<C: CreditLine>(
    state: &PoolState,
    credit_line: &C,
    env: &Env<'_>,
) -> CoreResult<bool> {
    let slice = state.current_slice()?;
    if slice.total_deposited()? < credit_line.min_limit() {
        return Ok(false);
    }

    let slippage = env.config.number(NumberKey::JuniorRatioSlippage)?;
    let target = env.params.junior_ratio_bps;
    let ratio = state.current_investment_ratio()?;

    Ok(ratio >= target.saturating_sub(slippage) && ratio <= target.saturating_add(slippage))
}

/// Cash the borrower can still draw from the current slice
pub(crate) fn drawdown_available(state: &PoolState) -> CoreResult<u128> {
    let slice = state.current_slice()?;
    let senior = share_price_to_usdc(
        slice.senior.principal_share_price,
        slice.senior.principal_deposited,
        Rounding::Down,
    )?;
    let junior = share_price_to_usdc(
        slice.junior.principal_share_price,
        slice.junior.principal_deposited,
        Rounding::Down,
    )?;
    safe_add_u128(senior, junior)
}

/// Position's currently withdrawable `(interest, principal)`
pub(crate) fn available_to_withdraw(
    state: &PoolState,
    positions: &PositionStore,
    position_id: PositionId,
) -> CoreResult<(u128, u128)> {
    let position = positions.get(position_id)?;
    let tranche = state.tranche(position.tranche_id)?;

    if state.cancelled || !tranche.is_locked() {
        return Ok((0, position.principal_amount));
    }
    accounting::redeemable_interest_and_principal(tranche, position)
}

// ============================================================================
// Funding Phase
// ============================================================================

impl<C: CreditLine> Staged<'_, C> {
    pub fn deposit(
        &mut self,
        env: &Env<'_>,
        owner: &AccountId,
        tranche_id: u64,
        amount: u128,
        now: i64,
    ) -> CoreResult<PositionId> {
        ensure_active(self.state.status())?;
        if amount == 0 {
            return Err(TrancheError::InvalidAmount);
        }
        if amount < env.params.min_ticket_size {
            return Err(TrancheError::InvalidTicketSize { amount, minimum: env.params.min_ticket_size });
        }
        if !env.gate.has_allowed_uid(owner) {
            return Err(TrancheError::NotAuthorized);
        }

        let tranche = self.state.tranche(tranche_id)?;
        if tranche.is_locked() {
            return Err(TrancheError::TrancheLocked);
        }

        self.ensure_fundable(now)?;

        let maximum = maximum_investment(&self.state, &self.credit_line, env.params, tranche_id)?;
        let available = maximum.saturating_sub(tranche.principal_deposited);
        if amount > available {
            return Err(TrancheError::MaximumInvestmentExceeded { requested: amount, available });
        }

        accounting::mint(self.state.tranche_mut(tranche_id)?, amount)?;
        let position_id = self.positions_mut().mint(owner.clone(), tranche_id, amount);

        self.transfer(owner, &env.params.pool_account, amount, TransferKind::Deposit);
        self.emit(PoolEvent::DepositMade { owner: owner.clone(), tranche_id, position_id, amount });
        Ok(position_id)
    }

    /// Principal moves in or out of an unlocked slice only inside its funding window
    fn ensure_fundable(&self, now: i64) -> CoreResult<()> {
        let funding_date = self.credit_line.funding_date();
        if now < self.state.fundable_at || now > funding_date {
            return Err(TrancheError::NotFundable { now, fundable_at: self.state.fundable_at, funding_date });
        }
        Ok(())
    }

    /// Dual-mode withdrawal
    ///
    /// * cancelled pool: refunds raw principal (`amount == 0` means all of it)
    /// * unlocked tranche: burns `amount` of principal 1:1 inside the funding window
    /// * locked tranche: `amount` must be zero; redeems everything accrued
    pub fn withdraw(
        &mut self,
        env: &Env<'_>,
        caller: &AccountId,
        position_id: PositionId,
        amount: u128,
        now: i64,
    ) -> CoreResult<Withdrawal> {
        let position = self.positions.get(position_id)?.clone();
        if &position.owner != caller {
            return Err(TrancheError::NotPositionOwner(position_id));
        }
        let tranche = self.state.tranche(position.tranche_id)?.clone();

        let withdrawal = if self.state.cancelled || !tranche.is_locked() {
            let principal = if self.state.cancelled {
                if amount == 0 {
                    position.principal_amount
                } else {
                    amount
                }
            } else {
                self.ensure_fundable(now)?;
                amount
            };
            accounting::burn(self.state.tranche_mut(tranche.id)?, &position, principal)?;
            self.positions_mut().withdraw_principal(position_id, principal)?;
            Withdrawal { interest: 0, principal }
        } else {
            if amount != 0 {
                return Err(TrancheError::MustBeZero);
            }
            if now <= tranche.locked_until {
                return Err(TrancheError::TrancheLocked);
            }
            let (interest, principal) = accounting::redeemable_interest_and_principal(&tranche, &position)?;
            if interest == 0 && principal == 0 {
                return Err(TrancheError::InvalidAmount);
            }
            self.positions_mut().redeem(position_id, principal, interest)?;
            Withdrawal { interest, principal }
        };

        self.transfer(&env.params.pool_account, caller, withdrawal.total()?, TransferKind::Withdrawal);
        self.emit(PoolEvent::WithdrawalMade {
            owner: caller.clone(),
            tranche_id: position.tranche_id,
            position_id,
            interest_withdrawn: withdrawal.interest,
            principal_withdrawn: withdrawal.principal,
        });
        Ok(withdrawal)
    }

    pub fn lock_pool(&mut self, env: &Env<'_>, now: i64) -> CoreResult<()> {
        ensure_active(self.state.status())?;
        if self.state.status() == PoolStatus::Locked {
            return Err(TrancheError::PoolLocked);
        }
        if !pool_requirements_fulfilled(&self.state, &self.credit_line, env)? {
            return Err(TrancheError::PoolRequirementsNotMet);
        }

        let drawdown_period = config_seconds(env, NumberKey::DrawdownPeriodInSeconds)?;
        let slice = self.state.current_slice_mut()?;
        let principal = slice.total_deposited()?;

        let locked_until = accounting::lock(&mut slice.senior, now, drawdown_period)?;
        accounting::lock(&mut slice.junior, now, drawdown_period)?;
        let (senior_id, junior_id) = (slice.senior.id, slice.junior.id);

        let new_limit = safe_add_u128(self.credit_line.limit(), principal)?.min(self.credit_line.max_limit());
        self.credit_line.set_limit(new_limit)?;
        if self.credit_line.funding_date() > now {
            self.credit_line.set_funding_date(now);
        }

        self.emit(PoolEvent::TrancheLocked { tranche_id: senior_id, locked_until });
        self.emit(PoolEvent::TrancheLocked { tranche_id: junior_id, locked_until });
        Ok(())
    }

    pub fn initialize_next_slice(&mut self, fundable_at: i64, funding_date: i64, now: i64) -> CoreResult<usize> {
        ensure_active(self.state.status())?;
        if self.state.status() != PoolStatus::Locked {
            return Err(TrancheError::PoolNotLocked);
        }
        if self.state.slices.len() >= MAX_SLICES {
            return Err(TrancheError::MaxSlicesReached(MAX_SLICES));
        }
        if self.credit_line.is_late(now) {
            return Err(TrancheError::CreditLineLate);
        }
        if self.credit_line.is_paid_off() {
            return Err(TrancheError::PoolPaidOff);
        }
        if fundable_at > funding_date {
            return Err(TrancheError::invalid_parameter("fundable_at", "is after the funding date"));
        }

        let slice_index = self.state.slices.len();
        self.state.slices.push(PoolSlice::new(slice_index));
        self.state.fundable_at = fundable_at;
        self.credit_line.set_funding_date(funding_date);

        self.emit(PoolEvent::SliceCreated { slice_index, fundable_at });
        Ok(slice_index)
    }

    pub fn cancel(&mut self, now: i64) -> CoreResult<()> {
        match self.state.status() {
            PoolStatus::Cancelled => return Err(TrancheError::AlreadyCancelled),
            PoolStatus::Closed => return Err(TrancheError::PoolClosed),
            PoolStatus::Locked => return Err(TrancheError::PoolLocked),
            PoolStatus::Open => {}
        }
        if self.state.has_locked_slice() {
            return Err(TrancheError::PoolLocked);
        }
        if now >= self.credit_line.funding_date() {
            return Err(TrancheError::FundingDatePassed);
        }

        self.state.cancelled = true;
        self.emit(PoolEvent::PoolCancelled);
        Ok(())
    }

    pub fn close(&mut self) -> CoreResult<()> {
        match self.state.status() {
            PoolStatus::Closed => return Err(TrancheError::AlreadyClosed),
            PoolStatus::Cancelled => return Err(TrancheError::PoolCancelled),
            PoolStatus::Open => return Err(TrancheError::PoolNotLocked),
            PoolStatus::Locked => {}
        }

        self.state.closed = true;
        self.emit(PoolEvent::PoolClosed);
        Ok(())
    }

    // ========================================================================
    // Loan Phase
    // ========================================================================

    pub fn drawdown(&mut self, env: &Env<'_>, amount: u128, now: i64) -> CoreResult<()> {
        ensure_active(self.state.status())?;
        if self.state.status() != PoolStatus::Locked {
            return Err(TrancheError::PoolNotLocked);
        }
        if amount == 0 {
            return Err(TrancheError::InvalidAmount);
        }
        // Holders may redeem once the lock lapses; the borrower may no longer draw
        let locked_until = self.state.current_slice()?.senior.locked_until;
        if now > locked_until {
            return Err(TrancheError::DrawdownPeriodEnded { locked_until });
        }

        let available = drawdown_available(&self.state)?;
        if amount > available {
            return Err(TrancheError::InsufficientFunds { requested: amount, available });
        }

        self.credit_line.drawdown(amount, now)?;

        // Both tranches keep the same fraction of their principal in the pool
        let remaining = available - amount;
        let slice = self.state.current_slice_mut()?;
        let senior_price = accounting::expected_share_price(&slice.senior, remaining, slice)?;
        let junior_price = accounting::expected_share_price(&slice.junior, remaining, slice)?;
        slice.senior.principal_share_price = senior_price;
        slice.junior.principal_share_price = junior_price;
        slice.principal_deployed = safe_add_u128(slice.principal_deployed, amount)?;
        slice.drawdown_made = true;

        let prices = [
            (slice.senior.id, senior_price, slice.senior.interest_share_price),
            (slice.junior.id, junior_price, slice.junior.interest_share_price),
        ];
        self.state.total_deployed = safe_add_u128(self.state.total_deployed, amount)?;

        self.transfer(&env.params.pool_account, &env.params.borrower, amount, TransferKind::Drawdown);
        self.emit(PoolEvent::DrawdownMade { borrower: env.params.borrower.clone(), amount });
        for (tranche_id, principal_share_price, interest_share_price) in prices {
            self.emit(PoolEvent::SharePriceUpdated { tranche_id, principal_share_price, interest_share_price });
        }
        Ok(())
    }

    pub fn pay(&mut self, env: &Env<'_>, payer: &AccountId, amount: u128, now: i64) -> CoreResult<AssessmentReport> {
        ensure_active(self.state.status())?;
        if amount == 0 {
            return Err(TrancheError::InvalidAmount);
        }
        let credit_line_account = self.credit_line.account().clone();
        self.transfer(payer, &credit_line_account, amount, TransferKind::Repayment);
        self.assess(env, now)
    }

    /// Collect whatever the credit line assesses as paid and run it through
    /// the waterfall
    pub fn assess(&mut self, env: &Env<'_>, now: i64) -> CoreResult<AssessmentReport> {
        ensure_active(self.state.status())?;
        if !self.state.has_locked_slice() {
            return Err(TrancheError::PoolNotLocked);
        }

        let credit_line_account = self.credit_line.account().clone();
        let collected = self.projected_balance(env, &credit_line_account)?;
        let assessment = self.credit_line.assess(now, collected)?;

        let total_deployed = self.state.total_deployed;
        let interest_accrued = self.distribute_accrued_interest(total_deployed)?;

        let mut report = AssessmentReport { assessment, interest_accrued, allocation: None };
        if !assessment.has_payment() {
            return Ok(report);
        }

        let treasury = env.config.address(AddressKey::TreasuryReserve)?;
        let pool_account = env.params.pool_account.clone();
        self.transfer(&credit_line_account, &pool_account, assessment.total_payment()?, TransferKind::Collection);

        let allocation = allocate_payment(
            &mut self.state.slices,
            assessment.interest_payment,
            assessment.principal_payment,
            total_deployed,
            self.credit_line.view(),
            waterfall_params(env)?,
        )?;

        for (slice, principal) in self.state.slices.iter_mut().zip(&allocation.principal_per_slice) {
            slice.principal_deployed = safe_sub_u128(slice.principal_deployed, *principal)?;
            self.state.total_deployed = safe_sub_u128(self.state.total_deployed, *principal)?;
        }

        for payout in &allocation.payouts {
            if payout.total_paid() > 0 {
                self.emit(PoolEvent::SharePriceUpdated {
                    tranche_id: payout.tranche_id,
                    principal_share_price: payout.new_principal_share_price,
                    interest_share_price: payout.new_interest_share_price,
                });
            }
        }

        let to_reserve = allocation.to_reserve()?;
        self.transfer(&pool_account, &treasury, to_reserve, TransferKind::Reserve);
        self.emit(PoolEvent::PaymentApplied {
            interest: assessment.interest_payment,
            principal: assessment.principal_payment,
            remaining: assessment.payment_remaining,
            reserve: to_reserve,
        });
        if to_reserve > 0 {
            self.emit(PoolEvent::ReserveFundsCollected { to: treasury, amount: to_reserve });
        }

        report.allocation = Some(allocation);
        Ok(report)
    }

    /// Spread newly accrued credit line interest across slices by deployment
    fn distribute_accrued_interest(&mut self, total_deployed: u128) -> CoreResult<u128> {
        let already_distributed = self.state.total_interest_accrued()?;
        let accrued = self.credit_line.total_interest_accrued().saturating_sub(already_distributed);
        if accrued == 0 {
            return Ok(0);
        }

        for slice in self.state.slices.iter_mut() {
            let slice_interest = scale_by_fraction(accrued, slice.principal_deployed, total_deployed)?;
            slice.total_interest_accrued = safe_add_u128(slice.total_interest_accrued, slice_interest)?;
        }
        Ok(accrued)
    }
}
