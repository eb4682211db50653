//! # Reference Collaborators
//!
//! In-memory implementations of the collaborator traits, used by the
//! simulator and the tests.

pub mod credit_line;
pub mod gate;
pub mod ledger;
pub mod registry;

pub use credit_line::{CreditTerms, FixedTermCreditLine};
pub use gate::AllowList;
pub use ledger::InMemoryLedger;
pub use registry::StaticConfig;
