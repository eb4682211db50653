//! Big integer operations for high-precision math
//!
//! This module provides U256 operations and the mul_div primitive every
//! share price and pro-rata split goes through. Products of two u128 values
//! are held in 256 bits so `a * b / c` never overflows in the middle.

use crate::errors::{CoreResult, TrancheError};
use std::cmp::Ordering;

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
    /// Round to nearest, exact halves away from zero
    HalfUp,
}

/// 256-bit unsigned integer for intermediate calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U256 {
    /// Low 128 bits
    pub lo: u128,
    /// High 128 bits
    pub hi: u128,
}

impl U256 {
    pub const ZERO: U256 = U256 { lo: 0, hi: 0 };
    pub const ONE: U256 = U256 { lo: 1, hi: 0 };

    /// Create a new U256 from low and high parts
    pub const fn new(lo: u128, hi: u128) -> Self {
        Self { lo, hi }
    }

    /// Create from a single u128 value
    pub const fn from_u128(value: u128) -> Self {
        Self { lo: value, hi: 0 }
    }

    /// Check if the value is zero
    pub const fn is_zero(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Convert to u128, returning None if overflow
    pub fn to_u128(&self) -> Option<u128> {
        if self.hi == 0 {
            Some(self.lo)
        } else {
            None
        }
    }

    /// Add two U256 values
    pub fn add(&self, other: &U256) -> Option<U256> {
        let (lo, carry) = self.lo.overflowing_add(other.lo);
        let hi = self.hi.checked_add(other.hi)?.checked_add(carry as u128)?;
        Some(U256::new(lo, hi))
    }

    /// Subtract two U256 values
    pub fn sub(&self, other: &U256) -> Option<U256> {
        let (lo, borrow) = self.lo.overflowing_sub(other.lo);
        let hi = self.hi.checked_sub(other.hi)?.checked_sub(borrow as u128)?;
        Some(U256::new(lo, hi))
    }

    /// Subtract modulo 2^256
    fn wrapping_sub(&self, other: &U256) -> U256 {
        let (lo, borrow) = self.lo.overflowing_sub(other.lo);
        let hi = self.hi.wrapping_sub(other.hi).wrapping_sub(borrow as u128);
        U256::new(lo, hi)
    }

    /// Multiply two U256 values, None if the product does not fit in 256 bits
    pub fn mul(&self, other: &U256) -> Option<U256> {
        if self.hi != 0 && other.hi != 0 {
            return None;
        }

        let low = mul_u128_to_u256(self.lo, other.lo);

        // At most one of the cross terms is non-zero
        let cross = self
            .hi
            .checked_mul(other.lo)?
            .checked_add(self.lo.checked_mul(other.hi)?)?;

        Some(U256::new(low.lo, low.hi.checked_add(cross)?))
    }

    /// Divide, returning quotient and remainder (binary long division)
    pub fn div_rem(&self, divisor: &U256) -> Option<(U256, U256)> {
        if divisor.is_zero() {
            return None;
        }

        if self < divisor {
            return Some((U256::ZERO, *self));
        }

        // Fast path: both fit in u128
        if self.hi == 0 && divisor.hi == 0 {
            return Some((
                U256::from_u128(self.lo / divisor.lo),
                U256::from_u128(self.lo % divisor.lo),
            ));
        }

        let mut quotient = U256::ZERO;
        let mut remainder = U256::ZERO;

        for i in (0..256u32).rev() {
            let carry = remainder.hi >> 127;
            remainder = remainder.shl1();
            remainder.lo |= self.bit(i);

            if carry == 1 || remainder >= *divisor {
                remainder = remainder.wrapping_sub(divisor);
                quotient.set_bit(i);
            }
        }

        Some((quotient, remainder))
    }

    /// Divide U256 by U256, returning quotient
    pub fn div(&self, other: &U256) -> Option<U256> {
        self.div_rem(other).map(|(quotient, _)| quotient)
    }

    fn shl1(&self) -> U256 {
        U256::new(self.lo << 1, (self.hi << 1) | (self.lo >> 127))
    }

    fn bit(&self, index: u32) -> u128 {
        if index < 128 {
            (self.lo >> index) & 1
        } else {
            (self.hi >> (index - 128)) & 1
        }
    }

    fn set_bit(&mut self, index: u32) {
        if index < 128 {
            self.lo |= 1u128 << index;
        } else {
            self.hi |= 1u128 << (index - 128);
        }
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.hi.cmp(&other.hi) {
            Ordering::Equal => self.lo.cmp(&other.lo),
            ordering => ordering,
        }
    }
}

/// Multiply two u128 values and return the full 256-bit product
pub fn mul_u128_to_u256(a: u128, b: u128) -> U256 {
    // Split into 64-bit parts for multiplication
    let a_lo = a as u64 as u128;
    let a_hi = a >> 64;
    let b_lo = b as u64 as u128;
    let b_hi = b >> 64;

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    // Cross products can carry into bit 128 of the middle term
    let (mid, mid_carry) = lo_hi.overflowing_add(hi_lo);
    let (lo, lo_carry) = lo_lo.overflowing_add(mid << 64);
    let hi = hi_hi + (mid >> 64) + ((mid_carry as u128) << 64) + lo_carry as u128;

    U256::new(lo, hi)
}

/// Multiply two values and divide by a third with specified rounding
/// result = (a * b) / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    if denominator.is_zero() {
        return Err(TrancheError::DivisionByZero);
    }

    let product = a.mul(&b).ok_or(TrancheError::MulDivOverflow)?;

    let (quotient, remainder) = product
        .div_rem(&denominator)
        .ok_or(TrancheError::DivisionByZero)?;

    if remainder.is_zero() {
        return Ok(quotient);
    }

    let round_up = match rounding {
        Rounding::Down => false,
        Rounding::Up => true,
        // remainder >= denominator / 2 without doubling the remainder
        Rounding::HalfUp => {
            let rest = denominator.sub(&remainder).ok_or(TrancheError::MathUnderflow)?;
            remainder >= rest
        }
    };

    if round_up {
        quotient.add(&U256::ONE).ok_or(TrancheError::MulDivOverflow)
    } else {
        Ok(quotient)
    }
}

/// Multiply two u128 values and divide by a third with specified rounding
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    if denominator == 0 {
        return Err(TrancheError::DivisionByZero);
    }

    if a == 0 || b == 0 {
        return Ok(0);
    }

    let result = mul_div(
        U256::from_u128(a),
        U256::from_u128(b),
        U256::from_u128(denominator),
        rounding,
    )?;

    result.to_u128().ok_or(TrancheError::MulDivOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_basic_ops() {
        let a = U256::from_u128(100);
        let b = U256::from_u128(200);

        assert_eq!(a.add(&b).unwrap().to_u128().unwrap(), 300);
        assert_eq!(b.sub(&a).unwrap().to_u128().unwrap(), 100);
        assert!(a.sub(&b).is_none());
        assert_eq!(a.mul(&b).unwrap().to_u128().unwrap(), 20000);
        assert_eq!(b.div(&a).unwrap().to_u128().unwrap(), 2);
        assert!(a.div(&U256::ZERO).is_none());
    }

    #[test]
    fn test_widening_multiply() {
        let product = mul_u128_to_u256(u128::MAX, u128::MAX);
        // (2^128 - 1)^2 = 2^256 - 2^129 + 1
        assert_eq!(product.lo, 1);
        assert_eq!(product.hi, u128::MAX - 1);

        let product = mul_u128_to_u256(1u128 << 64, 1u128 << 64);
        assert_eq!(product, U256::new(0, 1));
    }

    #[test]
    fn test_long_division() {
        let product = mul_u128_to_u256(u128::MAX, 3);
        let (quotient, remainder) = product.div_rem(&U256::from_u128(3)).unwrap();
        assert_eq!(quotient.to_u128().unwrap(), u128::MAX);
        assert!(remainder.is_zero());

        let (quotient, remainder) = U256::new(5, 1).div_rem(&U256::new(0, 1)).unwrap();
        assert_eq!(quotient, U256::ONE);
        assert_eq!(remainder, U256::from_u128(5));
    }

    #[test]
    fn test_mul_div_rounding() {
        // 10 * 3 / 4 = 7.5
        assert_eq!(mul_div_u128(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div_u128(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div_u128(10, 3, 4, Rounding::HalfUp).unwrap(), 8);

        // 2 / 3 = 0.667 and 1 / 3 = 0.333
        assert_eq!(mul_div_u128(2, 1, 3, Rounding::HalfUp).unwrap(), 1);
        assert_eq!(mul_div_u128(1, 1, 3, Rounding::HalfUp).unwrap(), 0);
        assert_eq!(mul_div_u128(1, 1, 3, Rounding::Up).unwrap(), 1);

        // Exact division is unaffected by rounding mode
        assert_eq!(mul_div_u128(10, 4, 5, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div_u128(10, 4, 5, Rounding::HalfUp).unwrap(), 8);
    }

    #[test]
    fn test_mul_div_large_numbers() {
        let a = u128::MAX / 2;
        assert_eq!(mul_div_u128(a, 2, 2, Rounding::Down).unwrap(), a);

        // Intermediate product far beyond u128
        let wad = 1_000_000_000_000_000_000u128;
        let amount = 1u128 << 100;
        assert_eq!(mul_div_u128(amount, wad, wad, Rounding::HalfUp).unwrap(), amount);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div_u128(1, 1, 0, Rounding::Down),
            Err(TrancheError::DivisionByZero)
        );
        assert_eq!(
            mul_div_u128(u128::MAX, u128::MAX, 1, Rounding::Down),
            Err(TrancheError::MulDivOverflow)
        );
    }
}
