//! # Core Type Definitions
//!
//! Entities of the pool: accounts, tranches, slices, positions and the cold
//! pool parameters.

pub mod account;
pub mod params;
pub mod position;
pub mod slice;
pub mod tranche;

// Re-export all types
pub use account::*;
pub use params::*;
pub use position::*;
pub use slice::*;
pub use tranche::*;
