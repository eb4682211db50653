//! # Core Error Types
//!
//! Every fallible operation in the engine returns [`TrancheError`]. Errors are
//! grouped the way callers react to them: input validation and state-machine
//! violations are rejected before anything is mutated, arithmetic failures are
//! fatal for the whole operation, and collaborator failures (cash settlement,
//! credit line) roll back the staged operation.

use thiserror::Error;

/// Errors raised by the tranched pool engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum TrancheError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Mul div overflow")]
    MulDivOverflow,

    #[error("Conversion error")]
    ConversionError,

    // ========================================================================
    // Input Validation Errors
    // ========================================================================

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid ticket size: {amount} is below the minimum of {minimum}")]
    InvalidTicketSize { amount: u128, minimum: u128 },

    #[error("Invalid tranche id: {0}")]
    InvalidTrancheId(u64),

    #[error("Invalid position id: {0}")]
    InvalidPositionId(u64),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    // ========================================================================
    // Pool State Machine Errors
    // ========================================================================

    #[error("Pool is locked")]
    PoolLocked,

    #[error("Pool is not locked")]
    PoolNotLocked,

    #[error("Pool has been cancelled")]
    PoolCancelled,

    #[error("Pool has been closed")]
    PoolClosed,

    #[error("Pool is already cancelled")]
    AlreadyCancelled,

    #[error("Pool is already closed")]
    AlreadyClosed,

    #[error("Pool is not open for funding at {now} (window {fundable_at}..={funding_date})")]
    NotFundable { now: i64, fundable_at: i64, funding_date: i64 },

    #[error("Funding date has passed")]
    FundingDatePassed,

    #[error("Pool funding requirements not met")]
    PoolRequirementsNotMet,

    #[error("Tranche is locked")]
    TrancheLocked,

    #[error("Drawdown period ended at {locked_until}")]
    DrawdownPeriodEnded { locked_until: i64 },

    #[error("Amount must be zero once the pool is funded")]
    MustBeZero,

    #[error("Maximum number of slices reached ({0})")]
    MaxSlicesReached(usize),

    #[error("Credit line is late")]
    CreditLineLate,

    #[error("Pool has been paid off")]
    PoolPaidOff,

    // ========================================================================
    // Capacity and Balance Errors
    // ========================================================================

    #[error("Maximum investment exceeded: {requested} requested, {available} available")]
    MaximumInvestmentExceeded { requested: u128, available: u128 },

    #[error("Insufficient shares: {requested} requested, {available} held")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("Insufficient funds in slice: {requested} requested, {available} available")]
    InsufficientFunds { requested: u128, available: u128 },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Caller does not own position {0}")]
    NotPositionOwner(u64),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Credit line error: {0}")]
    CreditLine(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, TrancheError>;

impl TrancheError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.to_string(), reason: reason.into() }
    }

    /// Create a transfer failure
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed(reason.into())
    }

    /// Create a credit line error
    pub fn credit_line(reason: impl Into<String>) -> Self {
        Self::CreditLine(reason.into())
    }

    /// Arithmetic failures abort the whole operation and are never retried
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::MathOverflow
                | Self::MathUnderflow
                | Self::DivisionByZero
                | Self::MulDivOverflow
                | Self::ConversionError
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TrancheError::InvalidTicketSize { amount: 5, minimum: 10 };
        assert_eq!(format!("{}", err), "Invalid ticket size: 5 is below the minimum of 10");

        let err = TrancheError::invalid_parameter("junior_fee_percent", "must be at most 100");
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'junior_fee_percent': must be at most 100"
        );
    }

    #[test]
    fn test_arithmetic_classification() {
        assert!(TrancheError::MulDivOverflow.is_arithmetic());
        assert!(TrancheError::DivisionByZero.is_arithmetic());
        assert!(!TrancheError::MustBeZero.is_arithmetic());
        assert!(!TrancheError::transfer_failed("boom").is_arithmetic());
    }
}
