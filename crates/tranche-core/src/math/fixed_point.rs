//! # Fixed-Point Arithmetic
//!
//! WAD (1e18) fixed-point helpers used for share prices and pro-rata splits.
//!
//! Allocation math rounds half-up through [`mul_div_half_up`]; conversions that
//! pay a holder round down so the sum of holder claims can never exceed what
//! a tranche actually received.

use crate::constants::{ONE_HUNDRED, WAD};
use crate::errors::CoreResult;
use crate::math::big_int::{mul_div_u128, Rounding};

// ============================================================================
// Primitive Scaled Operations
// ============================================================================

/// `round_half_up(a * b / scale)` on a 256-bit intermediate
pub fn mul_div_half_up(a: u128, b: u128, scale: u128) -> CoreResult<u128> {
    mul_div_u128(a, b, scale, Rounding::HalfUp)
}

/// Inverse of [`mul_div_half_up`]: `round_half_up(a * scale / b)`
pub fn div_scaled(a: u128, b: u128, scale: u128) -> CoreResult<u128> {
    mul_div_u128(a, scale, b, Rounding::HalfUp)
}

/// WAD multiplication (a * b / WAD), rounded half-up
#[inline]
pub fn wad_mul(a: u128, b: u128) -> CoreResult<u128> {
    mul_div_half_up(a, b, WAD)
}

/// WAD division (a * WAD / b), rounded half-up
#[inline]
pub fn wad_div(a: u128, b: u128) -> CoreResult<u128> {
    div_scaled(a, b, WAD)
}

// ============================================================================
// Share Price Conversions
// ============================================================================

/// Share price increment produced by distributing `amount` over `total_shares`
///
/// Returns 0 when there are no shares; nothing can be distributed to an
/// empty tranche.
pub fn usdc_to_share_price(amount: u128, total_shares: u128) -> CoreResult<u128> {
    if total_shares == 0 {
        return Ok(0);
    }
    wad_div(amount, total_shares)
}

/// USDC value of `shares` at `share_price`
pub fn share_price_to_usdc(share_price: u128, shares: u128, rounding: Rounding) -> CoreResult<u128> {
    mul_div_u128(share_price, shares, WAD, rounding)
}

/// `amount * fraction / total`, or 0 when `total` is 0
pub fn scale_by_fraction(amount: u128, fraction: u128, total: u128) -> CoreResult<u128> {
    if total == 0 {
        return Ok(0);
    }
    mul_div_half_up(amount, fraction, total)
}

/// `amount * percent / 100`
pub fn scale_by_percent(amount: u128, percent: u128) -> CoreResult<u128> {
    scale_by_fraction(amount, percent, ONE_HUNDRED)
}
