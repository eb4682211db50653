//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for money amounts and share prices.

use crate::errors::{CoreResult, TrancheError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked arithmetic returning a core error instead of wrapping
        #[inline]
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };

    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        /// Safe division with zero check
        #[inline]
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(TrancheError::DivisionByZero);
            }
            Ok(a / b)
        }
    };

    // Simple cast with only max check
    (cast_max, $fn_name:ident, $from_type:ty, $to_type:ty, $max_val:expr) => {
        /// Safe narrowing cast
        #[inline]
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            if value > $max_val {
                return Err(TrancheError::ConversionError);
            }
            Ok(value as $to_type)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, TrancheError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, TrancheError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, TrancheError::MathOverflow);
safe_arith!(div, safe_div_u128, u128);

safe_arith!(safe_add_i64, i64, checked_add, TrancheError::MathOverflow);
safe_arith!(safe_sub_i64, i64, checked_sub, TrancheError::MathUnderflow);

safe_arith!(cast_max, safe_cast_u128_to_u64, u128, u64, u64::MAX as u128);

/// Non-negative elapsed seconds between two timestamps
pub fn elapsed_seconds(from: i64, to: i64) -> u128 {
    if to <= from {
        0
    } else {
        (to as i128 - from as i128) as u128
    }
}

/// Sum a sequence of amounts with overflow checking
pub fn safe_sum_u128<I>(values: I) -> CoreResult<u128>
where
    I: IntoIterator<Item = u128>,
{
    values.into_iter().try_fold(0u128, safe_add_u128)
}
