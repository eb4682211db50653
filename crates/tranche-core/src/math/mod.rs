//! # Mathematical Functions
//!
//! Pure fixed-point functions shared by share accounting and the waterfall.

pub mod big_int;
pub mod fixed_point;
pub mod safe_math;

// Re-export commonly used functions
pub use big_int::*;
pub use fixed_point::*;
pub use safe_math::*;
