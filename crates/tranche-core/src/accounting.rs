//! # Share Accounting
//!
//! Per-tranche share bookkeeping. Deposits mint shares 1:1 before lock;
//! afterwards a holder's claim is `shares * (principal_share_price +
//! interest_share_price)` minus what was already redeemed.
//!
//! The `apply_*` functions are the only code that moves share prices upward.
//! They are driven by amounts the waterfall has already decided on and never
//! hand out more than the funds remaining.

use crate::errors::{CoreResult, TrancheError};
use crate::math::{
    safe_add_i64, safe_add_u128, safe_sub_u128, scale_by_fraction, share_price_to_usdc,
    usdc_to_share_price, Rounding,
};
use crate::types::{PoolSlice, Position, TrancheInfo};

// ============================================================================
// Deposits and Pre-Lock Withdrawals
// ============================================================================

/// Mint `amount` shares into an open tranche
pub fn mint(tranche: &mut TrancheInfo, amount: u128) -> CoreResult<()> {
    if amount == 0 {
        return Err(TrancheError::InvalidAmount);
    }
    if tranche.is_locked() {
        return Err(TrancheError::TrancheLocked);
    }
    tranche.principal_deposited = safe_add_u128(tranche.principal_deposited, amount)?;
    Ok(())
}

/// Burn `amount` of `position`'s shares from an open tranche
pub fn burn(tranche: &mut TrancheInfo, position: &Position, amount: u128) -> CoreResult<()> {
    if amount == 0 {
        return Err(TrancheError::InvalidAmount);
    }
    if tranche.is_locked() {
        return Err(TrancheError::TrancheLocked);
    }
    if position.tranche_id != tranche.id {
        return Err(TrancheError::InvalidTrancheId(position.tranche_id));
    }
    if amount > position.principal_amount {
        return Err(TrancheError::InsufficientShares {
            requested: amount,
            available: position.principal_amount,
        });
    }
    tranche.principal_deposited = safe_sub_u128(tranche.principal_deposited, amount)?;
    Ok(())
}

/// Freeze deposits and block redemptions until `now + drawdown_period`
pub fn lock(tranche: &mut TrancheInfo, now: i64, drawdown_period: i64) -> CoreResult<i64> {
    if tranche.is_locked() {
        return Err(TrancheError::TrancheLocked);
    }
    // A zero timestamp means "unlocked", keep a real lock distinguishable
    let locked_until = safe_add_i64(now, drawdown_period)?.max(1);
    tranche.locked_until = locked_until;
    Ok(locked_until)
}

// ============================================================================
// Share Price Projection
// ============================================================================

/// Share price this tranche reaches if `amount` of slice-level funds is split
/// by its share of the slice's deposits
pub fn expected_share_price(tranche: &TrancheInfo, amount: u128, slice: &PoolSlice) -> CoreResult<u128> {
    let share_price = usdc_to_share_price(amount, tranche.principal_deposited)?;
    scale_by_percent_ownership(tranche, share_price, slice)
}

/// Scale `amount` by the tranche's fraction of the slice's total deposits
pub fn scale_by_percent_ownership(tranche: &TrancheInfo, amount: u128, slice: &PoolSlice) -> CoreResult<u128> {
    let total_deposited = slice.total_deposited()?;
    scale_by_fraction(amount, tranche.principal_deposited, total_deposited)
}

/// USDC needed to move `actual` up to `desired`; a lower target is ignored
pub fn desired_amount_from_share_price(
    desired_share_price: u128,
    actual_share_price: u128,
    total_shares: u128,
) -> CoreResult<u128> {
    let difference = desired_share_price.saturating_sub(actual_share_price);
    share_price_to_usdc(difference, total_shares, Rounding::HalfUp)
}

// ============================================================================
// Payment Application
// ============================================================================

/// Spend up to `desired_amount` of `amount_remaining` on a share price
///
/// Returns the funds left over and the new share price. When funds run short
/// everything left is paid and the desired price is not reached. A tranche
/// without shares cannot receive anything.
pub fn apply_to_share_price(
    amount_remaining: u128,
    current_share_price: u128,
    desired_amount: u128,
    total_shares: u128,
) -> CoreResult<(u128, u128)> {
    if amount_remaining == 0 || desired_amount == 0 || total_shares == 0 {
        return Ok((amount_remaining, current_share_price));
    }

    let applied = desired_amount.min(amount_remaining);
    let share_price_difference = usdc_to_share_price(applied, total_shares)?;

    Ok((
        amount_remaining - applied,
        safe_add_u128(current_share_price, share_price_difference)?,
    ))
}

/// Apply interest and principal toward desired USDC amounts
///
/// Returns `(interest_remaining, principal_remaining)`.
pub fn apply_by_amount(
    tranche: &mut TrancheInfo,
    interest_remaining: u128,
    principal_remaining: u128,
    desired_interest_amount: u128,
    desired_principal_amount: u128,
) -> CoreResult<(u128, u128)> {
    let total_shares = tranche.total_shares();

    let (interest_remaining, interest_share_price) = apply_to_share_price(
        interest_remaining,
        tranche.interest_share_price,
        desired_interest_amount,
        total_shares,
    )?;
    let (principal_remaining, principal_share_price) = apply_to_share_price(
        principal_remaining,
        tranche.principal_share_price,
        desired_principal_amount,
        total_shares,
    )?;

    tranche.interest_share_price = interest_share_price;
    tranche.principal_share_price = principal_share_price;

    Ok((interest_remaining, principal_remaining))
}

/// Apply interest and principal toward desired share prices
pub fn apply_by_share_price(
    tranche: &mut TrancheInfo,
    interest_remaining: u128,
    principal_remaining: u128,
    desired_interest_share_price: u128,
    desired_principal_share_price: u128,
) -> CoreResult<(u128, u128)> {
    let total_shares = tranche.total_shares();
    let desired_interest_amount = desired_amount_from_share_price(
        desired_interest_share_price,
        tranche.interest_share_price,
        total_shares,
    )?;
    let desired_principal_amount = desired_amount_from_share_price(
        desired_principal_share_price,
        tranche.principal_share_price,
        total_shares,
    )?;

    apply_by_amount(
        tranche,
        interest_remaining,
        principal_remaining,
        desired_interest_amount,
        desired_principal_amount,
    )
}

// ============================================================================
// Redemption
// ============================================================================

/// `(interest, principal)` a position can still redeem, rounded down
pub fn redeemable_interest_and_principal(
    tranche: &TrancheInfo,
    position: &Position,
) -> CoreResult<(u128, u128)> {
    let max_principal = share_price_to_usdc(
        tranche.principal_share_price,
        position.principal_amount,
        Rounding::Down,
    )?;
    let max_interest = share_price_to_usdc(
        tranche.interest_share_price,
        position.principal_amount,
        Rounding::Down,
    )?;

    Ok((
        max_interest.saturating_sub(position.interest_redeemed),
        max_principal.saturating_sub(position.principal_redeemed),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use crate::types::AccountId;

    fn position(tranche_id: u64, amount: u128) -> Position {
        Position {
            id: 1,
            owner: AccountId::from("alice"),
            tranche_id,
            principal_amount: amount,
            principal_redeemed: 0,
            interest_redeemed: 0,
        }
    }

    #[test]
    fn test_mint_and_burn() {
        let mut tranche = TrancheInfo::new(1);
        assert_eq!(mint(&mut tranche, 0), Err(TrancheError::InvalidAmount));

        mint(&mut tranche, 500).unwrap();
        assert_eq!(tranche.total_shares(), 500);

        let pos = position(1, 500);
        assert_eq!(
            burn(&mut tranche, &pos, 501),
            Err(TrancheError::InsufficientShares { requested: 501, available: 500 })
        );
        burn(&mut tranche, &pos, 200).unwrap();
        assert_eq!(tranche.principal_deposited, 300);

        lock(&mut tranche, 1_000, 60).unwrap();
        assert_eq!(tranche.locked_until, 1_060);
        assert_eq!(mint(&mut tranche, 1), Err(TrancheError::TrancheLocked));
        assert_eq!(burn(&mut tranche, &pos, 1), Err(TrancheError::TrancheLocked));
    }

    #[test]
    fn test_expected_share_price_scales_by_ownership() {
        let mut slice = PoolSlice::new(0);
        slice.senior.principal_deposited = 600;
        slice.junior.principal_deposited = 400;

        // 100 across the slice, senior owns 60%: 60 over 600 shares
        let price = expected_share_price(&slice.senior, 100, &slice).unwrap();
        assert_eq!(price, WAD / 10);

        let empty = PoolSlice::new(1);
        assert_eq!(expected_share_price(&empty.senior, 100, &empty).unwrap(), 0);
    }

    #[test]
    fn test_apply_to_share_price_never_overshoots() {
        // Enough funds: reach the target
        let (left, price) = apply_to_share_price(100, 0, 60, 600).unwrap();
        assert_eq!(left, 40);
        assert_eq!(price, WAD / 10);

        // Short of funds: pay everything, stop below target
        let (left, price) = apply_to_share_price(30, 0, 60, 600).unwrap();
        assert_eq!(left, 0);
        assert_eq!(price, WAD / 20);

        // No shares: nothing moves
        assert_eq!(apply_to_share_price(30, 7, 60, 0).unwrap(), (30, 7));
    }

    #[test]
    fn test_desired_amount_ignores_lower_target() {
        assert_eq!(desired_amount_from_share_price(WAD / 2, WAD, 100).unwrap(), 0);
        assert_eq!(desired_amount_from_share_price(WAD, WAD / 2, 100).unwrap(), 50);
    }

    #[test]
    fn test_redeemable_rounds_down_and_subtracts_redeemed() {
        let mut tranche = TrancheInfo::new(2);
        tranche.principal_deposited = 3;
        tranche.interest_share_price = usdc_to_share_price(2, 3).unwrap();

        let mut pos = position(2, 1);
        let (interest, principal) = redeemable_interest_and_principal(&tranche, &pos).unwrap();
        assert_eq!(interest, 0);
        assert_eq!(principal, 1);

        pos.principal_amount = 3;
        pos.principal_redeemed = 1;
        let (interest, principal) = redeemable_interest_and_principal(&tranche, &pos).unwrap();
        assert_eq!(interest, 2);
        assert_eq!(principal, 2);
    }
}
