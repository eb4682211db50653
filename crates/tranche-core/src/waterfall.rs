//! # Payment Waterfall
//!
//! Splits one `(interest, principal)` payment across every slice of the pool,
//! pro-rata by deployed capital, and within a slice senior first:
//!
//! 1. **Senior pass** - the reserve fee is skimmed from the slice's interest,
//!    then the senior tranche is paid up to its expected principal price and
//!    its expected interest price net of the junior and reserve fees.
//! 2. **Junior pass** - the junior tranche takes every unit of interest left,
//!    is paid up to its expected principal price, and any principal still
//!    left over is reclassified as junior interest (minus the reserve fee).
//!
//! Everything here is pure: the caller hands in the slices and a view of the
//! credit line, and receives share price updates plus a reserve total to
//! sweep. Per-slice amounts never exceed what is left of the payment, so the
//! allocation always conserves the input.

use crate::accounting::{apply_by_amount, apply_by_share_price, expected_share_price};
use crate::constants::{INITIAL_PRINCIPAL_SHARE_PRICE, ONE_HUNDRED};
use crate::errors::{CoreResult, TrancheError};
use crate::math::{
    safe_add_u128, safe_sub_u128, scale_by_fraction, scale_by_percent, usdc_to_share_price,
};
use crate::types::{PoolSlice, TrancheInfo};

// ============================================================================
// Inputs
// ============================================================================

/// Fee configuration applied to every slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterfallParams {
    /// Share of senior interest redirected to the junior tranche (whole percent)
    pub junior_fee_percent: u128,
    /// Protocol skim on all interest (whole percent)
    pub reserve_fee_percent: u128,
}

impl WaterfallParams {
    pub fn new(junior_fee_percent: u128, reserve_fee_percent: u128) -> CoreResult<Self> {
        let total = safe_add_u128(junior_fee_percent, reserve_fee_percent)?;
        if total > ONE_HUNDRED {
            return Err(TrancheError::invalid_parameter(
                "junior_fee_percent",
                format!(
                    "junior fee {}% plus reserve fee {}% exceeds 100%",
                    junior_fee_percent, reserve_fee_percent
                ),
            ));
        }
        Ok(Self { junior_fee_percent, reserve_fee_percent })
    }

    /// Reserve fee expressed as a denominator (10 => 10%)
    pub fn from_reserve_denominator(junior_fee_percent: u128, reserve_denominator: u128) -> CoreResult<Self> {
        if reserve_denominator == 0 {
            return Err(TrancheError::DivisionByZero);
        }
        Self::new(junior_fee_percent, ONE_HUNDRED / reserve_denominator)
    }

    /// Multiplier (percent) applied to the senior expected interest price
    fn senior_net_percent(&self) -> u128 {
        ONE_HUNDRED
            .saturating_sub(self.junior_fee_percent)
            .saturating_sub(self.reserve_fee_percent)
    }
}

/// Credit line figures read after the assessment that produced the payment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct CreditLineView {
    pub balance: u128,
    pub principal_owed: u128,
}

/// Totals a slice's tranches are entitled to at this point of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceInfo {
    pub reserve_fee_percent: u128,
    pub interest_accrued: u128,
    pub principal_accrued: u128,
}

// ============================================================================
// Outputs
// ============================================================================

/// Result of applying funds to one tranche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    pub interest_remaining: u128,
    pub principal_remaining: u128,
    pub reserve_deduction: u128,
    /// Principal the junior pass turned into interest
    pub reclassified_principal: u128,
    pub old_interest_share_price: u128,
    pub old_principal_share_price: u128,
}

/// What one tranche received from one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TranchePayout {
    pub tranche_id: u64,
    pub interest_paid: u128,
    pub principal_paid: u128,
    pub old_interest_share_price: u128,
    pub new_interest_share_price: u128,
    pub old_principal_share_price: u128,
    pub new_principal_share_price: u128,
}

impl TranchePayout {
    fn record(tranche: &TrancheInfo, result: &ApplyResult, interest_in: u128, principal_in: u128) -> Self {
        Self {
            tranche_id: tranche.id,
            interest_paid: interest_in + result.reclassified_principal
                - result.interest_remaining
                - result.reserve_deduction,
            principal_paid: principal_in - result.principal_remaining - result.reclassified_principal,
            old_interest_share_price: result.old_interest_share_price,
            new_interest_share_price: tranche.interest_share_price,
            old_principal_share_price: result.old_principal_share_price,
            new_principal_share_price: tranche.principal_share_price,
        }
    }

    pub fn total_paid(&self) -> u128 {
        self.interest_paid.saturating_add(self.principal_paid)
    }
}

/// Full outcome of one payment across the pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct PaymentAllocation {
    pub interest: u128,
    pub principal: u128,
    /// Senior payouts in slice order, then junior payouts in slice order
    pub payouts: Vec<TranchePayout>,
    /// Principal attributed to each slice, used to reduce its deployed amount
    pub principal_per_slice: Vec<u128>,
    /// Fee skimmed for the protocol reserve
    pub reserve_deduction: u128,
    /// Funds no tranche could absorb (rounding dust, empty tranches)
    pub unapplied: u128,
}

impl PaymentAllocation {
    /// Amount the caller must move to the reserve
    pub fn to_reserve(&self) -> CoreResult<u128> {
        safe_add_u128(self.reserve_deduction, self.unapplied)
    }

    pub fn total_paid_to_tranches(&self) -> u128 {
        self.payouts.iter().map(TranchePayout::total_paid).sum()
    }

    pub fn payout(&self, tranche_id: u64) -> impl Iterator<Item = &TranchePayout> {
        self.payouts.iter().filter(move |p| p.tranche_id == tranche_id)
    }
}

// ============================================================================
// Slice Entitlements
// ============================================================================

/// `(interest, principal)` the slice's holders are entitled to in total
///
/// Principal counts what the credit line still owes plus what was already
/// repaid early (`total_deployed - balance`), scaled to this slice, plus any
/// deposits this slice never deployed.
pub fn get_total_interest_and_principal(
    slice: &PoolSlice,
    credit_line: CreditLineView,
    total_deployed: u128,
) -> CoreResult<(u128, u128)> {
    let repaid = total_deployed.saturating_sub(credit_line.balance);
    let principal_accrued = safe_add_u128(credit_line.principal_owed, repaid)?;
    let principal_accrued = scale_by_fraction(principal_accrued, slice.principal_deployed, total_deployed)?;

    let undeployed = slice.total_deposited()?.saturating_sub(slice.principal_deployed);
    let principal_accrued = safe_add_u128(principal_accrued, undeployed)?;

    Ok((slice.total_interest_accrued, principal_accrued))
}

pub fn get_slice_info(
    slice: &PoolSlice,
    credit_line: CreditLineView,
    total_deployed: u128,
    reserve_fee_percent: u128,
) -> CoreResult<SliceInfo> {
    let (interest_accrued, principal_accrued) =
        get_total_interest_and_principal(slice, credit_line, total_deployed)?;
    Ok(SliceInfo { reserve_fee_percent, interest_accrued, principal_accrued })
}

/// Slice's pro-rata part of a pool-level amount
pub fn scale_for_slice(slice: &PoolSlice, amount: u128, total_deployed: u128) -> CoreResult<u128> {
    scale_by_fraction(amount, slice.principal_deployed, total_deployed)
}

/// Expected principal price, never above the initial price
fn expected_principal_share_price(tranche: &TrancheInfo, slice: &PoolSlice, info: &SliceInfo) -> CoreResult<u128> {
    Ok(expected_share_price(tranche, info.principal_accrued, slice)?.min(INITIAL_PRINCIPAL_SHARE_PRICE))
}

// ============================================================================
// Per-Tranche Passes
// ============================================================================

/// Senior pass for one slice
pub fn apply_to_senior_tranche(
    slice: &mut PoolSlice,
    interest_remaining: u128,
    principal_remaining: u128,
    params: WaterfallParams,
    info: &SliceInfo,
) -> CoreResult<ApplyResult> {
    let expected_interest_share_price = expected_share_price(&slice.senior, info.interest_accrued, slice)?;
    let expected_principal_share_price = expected_principal_share_price(&slice.senior, slice, info)?;

    let desired_net_interest_share_price =
        scale_by_fraction(expected_interest_share_price, params.senior_net_percent(), ONE_HUNDRED)?;

    // Reserve comes off the top of the slice's interest
    let reserve_deduction = scale_by_percent(interest_remaining, info.reserve_fee_percent)?;
    let interest_remaining = safe_sub_u128(interest_remaining, reserve_deduction)?;

    let old_interest_share_price = slice.senior.interest_share_price;
    let old_principal_share_price = slice.senior.principal_share_price;

    let (interest_remaining, principal_remaining) = apply_by_share_price(
        &mut slice.senior,
        interest_remaining,
        principal_remaining,
        desired_net_interest_share_price,
        expected_principal_share_price,
    )?;

    Ok(ApplyResult {
        interest_remaining,
        principal_remaining,
        reserve_deduction,
        reclassified_principal: 0,
        old_interest_share_price,
        old_principal_share_price,
    })
}

/// Junior pass for one slice
pub fn apply_to_junior_tranche(
    slice: &mut PoolSlice,
    interest_remaining: u128,
    principal_remaining: u128,
    info: &SliceInfo,
) -> CoreResult<ApplyResult> {
    let expected_interest_share_price = safe_add_u128(
        slice.junior.interest_share_price,
        usdc_to_share_price(interest_remaining, slice.junior.principal_deposited)?,
    )?;
    let expected_principal_share_price = expected_principal_share_price(&slice.junior, slice, info)?;

    let old_interest_share_price = slice.junior.interest_share_price;
    let old_principal_share_price = slice.junior.principal_share_price;

    let (interest_remaining, principal_remaining) = apply_by_share_price(
        &mut slice.junior,
        interest_remaining,
        principal_remaining,
        expected_interest_share_price,
        expected_principal_share_price,
    )?;

    // Residual principal becomes junior yield; the reserve only saw the
    // original interest, so take its cut of the reclassified part here
    let reserve_deduction = scale_by_percent(principal_remaining, info.reserve_fee_percent)?;
    let bonus = safe_sub_u128(safe_add_u128(interest_remaining, principal_remaining)?, reserve_deduction)?;

    let (interest_remaining, _) = apply_by_amount(&mut slice.junior, bonus, 0, bonus, 0)?;

    Ok(ApplyResult {
        interest_remaining,
        principal_remaining: 0,
        reserve_deduction,
        reclassified_principal: principal_remaining,
        old_interest_share_price,
        old_principal_share_price,
    })
}

// ============================================================================
// Pool-Level Passes
// ============================================================================

/// Running totals handed from one pass to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassRemainder {
    pub interest_remaining: u128,
    pub principal_remaining: u128,
    pub reserve_deduction: u128,
}

/// Pro-rata share of `amount` for `slice`, capped by what is left of it
fn take_for_slice(slice: &PoolSlice, amount: u128, left: &mut u128, total_deployed: u128) -> CoreResult<u128> {
    let share = scale_for_slice(slice, amount, total_deployed)?.min(*left);
    *left -= share;
    Ok(share)
}

/// Senior pass over every slice
///
/// Remainders include whatever the pro-rata scaling did not hand to any
/// slice, so the junior pass sees the whole unspent payment.
pub fn apply_to_all_senior_tranches(
    slices: &mut [PoolSlice],
    interest: u128,
    principal: u128,
    params: WaterfallParams,
    total_deployed: u128,
    credit_line: CreditLineView,
    payouts: &mut Vec<TranchePayout>,
) -> CoreResult<PassRemainder> {
    let mut interest_left = interest;
    let mut principal_left = principal;
    let mut totals = PassRemainder::default();

    for slice in slices.iter_mut() {
        let info = get_slice_info(slice, credit_line, total_deployed, params.reserve_fee_percent)?;
        let slice_interest = take_for_slice(slice, interest, &mut interest_left, total_deployed)?;
        let slice_principal = take_for_slice(slice, principal, &mut principal_left, total_deployed)?;

        let result = apply_to_senior_tranche(slice, slice_interest, slice_principal, params, &info)?;
        payouts.push(TranchePayout::record(&slice.senior, &result, slice_interest, slice_principal));

        totals.interest_remaining = safe_add_u128(totals.interest_remaining, result.interest_remaining)?;
        totals.principal_remaining = safe_add_u128(totals.principal_remaining, result.principal_remaining)?;
        totals.reserve_deduction = safe_add_u128(totals.reserve_deduction, result.reserve_deduction)?;
    }

    totals.interest_remaining = safe_add_u128(totals.interest_remaining, interest_left)?;
    totals.principal_remaining = safe_add_u128(totals.principal_remaining, principal_left)?;
    Ok(totals)
}

/// Junior pass over every slice
///
/// Returned remainders are funds no junior tranche could absorb.
pub fn apply_to_all_junior_tranches(
    slices: &mut [PoolSlice],
    interest: u128,
    principal: u128,
    reserve_fee_percent: u128,
    total_deployed: u128,
    credit_line: CreditLineView,
    payouts: &mut Vec<TranchePayout>,
) -> CoreResult<PassRemainder> {
    let mut interest_left = interest;
    let mut principal_left = principal;
    let mut totals = PassRemainder::default();

    for slice in slices.iter_mut() {
        let info = get_slice_info(slice, credit_line, total_deployed, reserve_fee_percent)?;
        let slice_interest = take_for_slice(slice, interest, &mut interest_left, total_deployed)?;
        let slice_principal = take_for_slice(slice, principal, &mut principal_left, total_deployed)?;

        let result = apply_to_junior_tranche(slice, slice_interest, slice_principal, &info)?;

        payouts.push(TranchePayout::record(&slice.junior, &result, slice_interest, slice_principal));

        totals.interest_remaining = safe_add_u128(totals.interest_remaining, result.interest_remaining)?;
        totals.reserve_deduction = safe_add_u128(totals.reserve_deduction, result.reserve_deduction)?;
    }

    totals.interest_remaining = safe_add_u128(totals.interest_remaining, interest_left)?;
    totals.principal_remaining = principal_left;
    Ok(totals)
}

/// Run both passes for one payment
///
/// `total_deployed` is the pool total before this payment's principal is
/// taken off the slices; `credit_line` reflects the state after the
/// assessment that produced the payment.
pub fn allocate_payment(
    slices: &mut [PoolSlice],
    interest: u128,
    principal: u128,
    total_deployed: u128,
    credit_line: CreditLineView,
    params: WaterfallParams,
) -> CoreResult<PaymentAllocation> {
    let mut principal_per_slice = Vec::with_capacity(slices.len());
    for slice in slices.iter() {
        principal_per_slice.push(
            scale_for_slice(slice, principal, total_deployed)?.min(slice.principal_deployed),
        );
    }

    let mut payouts = Vec::with_capacity(slices.len() * 2);

    let senior = apply_to_all_senior_tranches(
        slices,
        interest,
        principal,
        params,
        total_deployed,
        credit_line,
        &mut payouts,
    )?;
    let junior = apply_to_all_junior_tranches(
        slices,
        senior.interest_remaining,
        senior.principal_remaining,
        params.reserve_fee_percent,
        total_deployed,
        credit_line,
        &mut payouts,
    )?;

    let allocation = PaymentAllocation {
        interest,
        principal,
        payouts,
        principal_per_slice,
        reserve_deduction: safe_add_u128(senior.reserve_deduction, junior.reserve_deduction)?,
        unapplied: safe_add_u128(junior.interest_remaining, junior.principal_remaining)?,
    };

    log::debug!(
        "waterfall: interest={} principal={} to_tranches={} reserve={} unapplied={}",
        interest,
        principal,
        allocation.total_paid_to_tranches(),
        allocation.reserve_deduction,
        allocation.unapplied
    );

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;

    /// One slice, fully drawn down, deposits 600 senior / 400 junior
    fn drawn_slice() -> PoolSlice {
        let mut slice = PoolSlice::new(0);
        slice.senior.principal_deposited = 600;
        slice.junior.principal_deposited = 400;
        slice.senior.principal_share_price = 0;
        slice.junior.principal_share_price = 0;
        slice.principal_deployed = 1_000;
        slice
    }

    #[test]
    fn test_params_reject_fees_above_hundred() {
        assert!(WaterfallParams::new(90, 11).is_err());
        assert_eq!(WaterfallParams::from_reserve_denominator(20, 10).unwrap().reserve_fee_percent, 10);
        assert_eq!(
            WaterfallParams::from_reserve_denominator(20, 0),
            Err(TrancheError::DivisionByZero)
        );
    }

    #[test]
    fn test_interest_split_senior_junior_reserve() {
        let mut slices = vec![drawn_slice()];
        slices[0].total_interest_accrued = 100;
        let params = WaterfallParams::new(10, 5).unwrap();
        let view = CreditLineView { balance: 1_000, principal_owed: 0 };

        let allocation = allocate_payment(&mut slices, 100, 0, 1_000, view, params).unwrap();

        let senior = allocation.payout(1).next().unwrap();
        let junior = allocation.payout(2).next().unwrap();
        assert_eq!(senior.interest_paid, 51);
        assert_eq!(junior.interest_paid, 44);
        assert_eq!(allocation.reserve_deduction, 5);
        assert_eq!(allocation.unapplied, 0);

        assert_eq!(slices[0].senior.interest_share_price, 85 * WAD / 1_000);
        assert_eq!(slices[0].junior.interest_share_price, 11 * WAD / 100);
    }

    #[test]
    fn test_principal_restores_share_prices() {
        let mut slices = vec![drawn_slice()];
        let params = WaterfallParams::new(20, 10).unwrap();
        // Half the loan repaid early: balance dropped to 500
        let view = CreditLineView { balance: 500, principal_owed: 0 };

        let allocation = allocate_payment(&mut slices, 0, 500, 1_000, view, params).unwrap();

        assert_eq!(slices[0].senior.principal_share_price, WAD / 2);
        assert_eq!(slices[0].junior.principal_share_price, WAD / 2);
        assert_eq!(allocation.principal_per_slice, vec![500]);
        assert_eq!(allocation.total_paid_to_tranches(), 500);
        assert_eq!(allocation.reserve_deduction, 0);
    }

    #[test]
    fn test_excess_principal_becomes_junior_interest() {
        let mut slices = vec![drawn_slice()];
        let params = WaterfallParams::new(20, 10).unwrap();
        // Credit line only acknowledges 400 as owed, 500 arrives
        let view = CreditLineView { balance: 600, principal_owed: 0 };

        let allocation = allocate_payment(&mut slices, 0, 500, 1_000, view, params).unwrap();

        // 400 restores principal, 100 is reclassified: 10 to reserve, 90 to junior
        assert_eq!(allocation.reserve_deduction, 10);
        let junior = allocation.payout(2).next().unwrap();
        assert_eq!(junior.interest_paid, 90);
        assert_eq!(allocation.total_paid_to_tranches() + allocation.reserve_deduction, 500);
    }

    #[test]
    fn test_zero_payment_changes_nothing() {
        let mut slices = vec![drawn_slice()];
        slices[0].total_interest_accrued = 100;
        let before = slices.clone();
        let params = WaterfallParams::new(10, 5).unwrap();
        let view = CreditLineView { balance: 1_000, principal_owed: 0 };

        let allocation = allocate_payment(&mut slices, 0, 0, 1_000, view, params).unwrap();
        assert_eq!(slices, before);
        assert_eq!(allocation.to_reserve().unwrap(), 0);
    }

    #[test]
    fn test_nothing_deployed_leaves_payment_unapplied() {
        let mut slices = vec![drawn_slice()];
        slices[0].principal_deployed = 0;
        let params = WaterfallParams::new(10, 5).unwrap();

        let allocation =
            allocate_payment(&mut slices, 10, 0, 0, CreditLineView::default(), params).unwrap();
        assert_eq!(allocation.unapplied, 10);
        assert_eq!(allocation.total_paid_to_tranches(), 0);
    }

    #[test]
    fn test_two_slices_split_pro_rata() {
        let mut first = drawn_slice();
        first.total_interest_accrued = 75;
        let mut second = PoolSlice::new(1);
        second.senior.principal_deposited = 300;
        second.junior.principal_deposited = 200;
        second.senior.principal_share_price = 0;
        second.junior.principal_share_price = 0;
        second.principal_deployed = 500;
        second.total_interest_accrued = 75;

        let mut slices = vec![first, second];
        let params = WaterfallParams::new(10, 5).unwrap();
        let view = CreditLineView { balance: 1_500, principal_owed: 0 };

        let allocation = allocate_payment(&mut slices, 150, 0, 1_500, view, params).unwrap();

        let conserved = allocation.total_paid_to_tranches()
            + allocation.reserve_deduction
            + allocation.unapplied;
        assert_eq!(conserved, 150);
        assert!(slices[0].senior.interest_share_price > 0);
        assert!(slices[1].senior.interest_share_price > 0);
    }
}
