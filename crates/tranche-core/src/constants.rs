//! # Protocol Constants
//!
//! Fixed-point scales, percentage denominators and pool limits.

// ============================================================================
// Mathematical Constants
// ============================================================================

/// WAD fixed-point scale factor (1e18), used for every share price
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Half of WAD, the half-up rounding threshold
pub const HALF_WAD: u128 = WAD / 2;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Fee percentages are whole percents out of one hundred
pub const ONE_HUNDRED: u128 = 100;

// ============================================================================
// Share Price Constants
// ============================================================================

/// Principal share price of a fresh tranche (one share redeems one USDC unit)
pub const INITIAL_PRINCIPAL_SHARE_PRICE: u128 = WAD;

/// Interest share price of a fresh tranche
pub const INITIAL_INTEREST_SHARE_PRICE: u128 = 0;

// ============================================================================
// Pool Limits
// ============================================================================

/// Maximum number of slices (funding rounds) per pool
pub const MAX_SLICES: usize = 5;

/// Maximum junior fee percent
pub const MAX_JUNIOR_FEE_PERCENT: u128 = ONE_HUNDRED;

/// Maximum junior:senior target ratio (junior may not exceed senior)
pub const MAX_JUNIOR_RATIO_BPS: u128 = BPS_DENOMINATOR;

/// USDC has 6 decimals
pub const USDC_DECIMALS: u32 = 6;

/// One whole USDC in base units
pub const USDC_MANTISSA: u128 = 1_000_000;

// ============================================================================
// Time Constants
// ============================================================================

/// Seconds per day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Seconds per (365 day) year, used for simple interest accrual
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

// ============================================================================
// Protocol Configuration Defaults
// ============================================================================

/// Default reserve denominator (reserve takes 1/10 = 10% of interest)
pub const DEFAULT_RESERVE_DENOMINATOR: u128 = 10;

/// Default junior ratio slippage (bps of ratio)
pub const DEFAULT_JUNIOR_RATIO_SLIPPAGE_BPS: u128 = 500;

/// Default drawdown period after lock
pub const DEFAULT_DRAWDOWN_PERIOD_SECONDS: i64 = 86_400;

// ============================================================================
// Tranche Id Helpers
// ============================================================================

/// Senior tranche ids are odd: 1, 3, 5, ...
pub const fn senior_tranche_id(slice_index: usize) -> u64 {
    (slice_index as u64) * 2 + 1
}

/// Junior tranche ids are even: 2, 4, 6, ...
pub const fn junior_tranche_id(slice_index: usize) -> u64 {
    (slice_index as u64) * 2 + 2
}

/// Slice index owning a tranche id (ids start at 1)
pub const fn tranche_id_to_slice_index(tranche_id: u64) -> usize {
    ((tranche_id.saturating_sub(1)) / 2) as usize
}

pub const fn is_senior_tranche_id(tranche_id: u64) -> bool {
    tranche_id % 2 == 1
}

pub const fn is_junior_tranche_id(tranche_id: u64) -> bool {
    tranche_id != 0 && tranche_id % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tranche_ids() {
        assert_eq!(senior_tranche_id(0), 1);
        assert_eq!(junior_tranche_id(0), 2);
        assert_eq!(senior_tranche_id(2), 5);
        assert_eq!(junior_tranche_id(2), 6);

        for slice in 0..MAX_SLICES {
            assert_eq!(tranche_id_to_slice_index(senior_tranche_id(slice)), slice);
            assert_eq!(tranche_id_to_slice_index(junior_tranche_id(slice)), slice);
        }

        assert!(is_senior_tranche_id(3));
        assert!(is_junior_tranche_id(4));
        assert!(!is_junior_tranche_id(0));
    }
}
