//! # Tranche Core - Tranched Pool Accounting
//!
//! Pure accounting engine for a multi-slice, two-tranche lending pool.
//! It provides:
//!
//! - Fixed-point math on a 256-bit intermediate
//! - Per-tranche share accounting
//! - The senior/junior payment waterfall
//! - A pool controller enforcing the funding and repayment lifecycle
//! - Collaborator traits with in-memory reference implementations
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde/borsh serialization for reports and snapshots

pub mod accounting;
pub mod collaborators;
pub mod constants;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod math;
pub mod pool;
#[cfg(feature = "client")]
pub mod snapshot;
pub mod types;
pub mod waterfall;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, TrancheError};
pub use events::PoolEvent;
pub use interfaces::{
    AddressKey, Assessment, CashLedger, ConfigRegistry, CredentialGate, CreditLine, NumberKey,
    Transfer, TransferBatch, TransferKind,
};
pub use pool::{AssessmentReport, PoolController, PoolState, PoolStatus, Withdrawal};
pub use types::*;
pub use waterfall::{allocate_payment, CreditLineView, PaymentAllocation, TranchePayout, WaterfallParams};
