//! Fixed-term credit line with simple interest.
//!
//! Interest accrues on the outstanding balance and is due immediately.
//! Principal is a bullet due at term end; anything collected beyond what is
//! owed prepays the balance. The term starts on the first drawdown.

use crate::constants::{BPS_DENOMINATOR, SECONDS_PER_YEAR};
use crate::errors::{CoreResult, TrancheError};
use crate::interfaces::{Assessment, CreditLine};
use crate::math::{elapsed_seconds, mul_div_u128, safe_add_i64, safe_add_u128, safe_sub_u128, Rounding};
use crate::types::AccountId;

/// Terms agreed with the borrower
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct CreditTerms {
    pub min_limit: u128,
    pub max_limit: u128,
    /// Annual interest rate in basis points
    pub interest_apr_bps: u128,
    pub payment_period_seconds: i64,
    pub term_seconds: i64,
    pub grace_period_seconds: i64,
}

impl CreditTerms {
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_limit > self.max_limit {
            return Err(TrancheError::invalid_parameter("min_limit", "exceeds max_limit"));
        }
        if self.payment_period_seconds <= 0 {
            return Err(TrancheError::invalid_parameter("payment_period_seconds", "must be positive"));
        }
        if self.term_seconds <= 0 {
            return Err(TrancheError::invalid_parameter("term_seconds", "must be positive"));
        }
        if self.grace_period_seconds < 0 {
            return Err(TrancheError::invalid_parameter("grace_period_seconds", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedTermCreditLine {
    account: AccountId,
    terms: CreditTerms,
    limit: u128,
    funding_date: i64,

    balance: u128,
    interest_owed: u128,
    principal_owed: u128,
    total_interest_accrued: u128,

    /// First drawdown time, `None` until the loan starts
    term_start: Option<i64>,
    term_end: i64,
    interest_accrued_as_of: i64,
    last_full_payment_time: i64,
}

impl FixedTermCreditLine {
    pub fn new(account: AccountId, terms: CreditTerms, funding_date: i64) -> CoreResult<Self> {
        terms.validate()?;
        Ok(Self {
            account,
            terms,
            limit: 0,
            funding_date,
            balance: 0,
            interest_owed: 0,
            principal_owed: 0,
            total_interest_accrued: 0,
            term_start: None,
            term_end: 0,
            interest_accrued_as_of: 0,
            last_full_payment_time: 0,
        })
    }

    pub fn terms(&self) -> &CreditTerms {
        &self.terms
    }

    pub fn term_end(&self) -> i64 {
        self.term_end
    }

    fn has_started(&self) -> bool {
        self.term_start.is_some()
    }

    /// Simple interest on the current balance since the last accrual
    fn interest_since_last_accrual(&self, now: i64) -> CoreResult<u128> {
        let elapsed = elapsed_seconds(self.interest_accrued_as_of, now);
        let per_year = mul_div_u128(self.balance, self.terms.interest_apr_bps, BPS_DENOMINATOR, Rounding::Down)?;
        mul_div_u128(per_year, elapsed, SECONDS_PER_YEAR as u128, Rounding::Down)
    }

    fn accrue(&mut self, now: i64) -> CoreResult<()> {
        if now <= self.interest_accrued_as_of {
            return Ok(());
        }
        let interest = self.interest_since_last_accrual(now)?;
        self.interest_owed = safe_add_u128(self.interest_owed, interest)?;
        self.total_interest_accrued = safe_add_u128(self.total_interest_accrued, interest)?;
        self.interest_accrued_as_of = now;

        if now >= self.term_end {
            self.principal_owed = self.balance;
        }
        Ok(())
    }
}

impl CreditLine for FixedTermCreditLine {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn min_limit(&self) -> u128 {
        self.terms.min_limit
    }

    fn max_limit(&self) -> u128 {
        self.terms.max_limit
    }

    fn limit(&self) -> u128 {
        self.limit
    }

    fn set_limit(&mut self, limit: u128) -> CoreResult<()> {
        if limit > self.terms.max_limit {
            return Err(TrancheError::credit_line(format!(
                "limit {} exceeds max limit {}",
                limit, self.terms.max_limit
            )));
        }
        self.limit = limit;
        Ok(())
    }

    fn balance(&self) -> u128 {
        self.balance
    }

    fn principal_owed(&self) -> u128 {
        self.principal_owed
    }

    fn interest_owed(&self) -> u128 {
        self.interest_owed
    }

    fn total_interest_accrued(&self) -> u128 {
        self.total_interest_accrued
    }

    fn funding_date(&self) -> i64 {
        self.funding_date
    }

    fn set_funding_date(&mut self, funding_date: i64) {
        self.funding_date = funding_date;
    }

    fn is_late(&self, now: i64) -> bool {
        if self.balance == 0 {
            return false;
        }
        let deadline = self
            .last_full_payment_time
            .saturating_add(self.terms.payment_period_seconds)
            .saturating_add(self.terms.grace_period_seconds);
        now > deadline
    }

    fn is_paid_off(&self) -> bool {
        self.has_started() && self.balance == 0 && self.interest_owed == 0
    }

    fn drawdown(&mut self, amount: u128, now: i64) -> CoreResult<()> {
        if amount == 0 {
            return Err(TrancheError::InvalidAmount);
        }
        let new_balance = safe_add_u128(self.balance, amount)?;
        if new_balance > self.limit {
            return Err(TrancheError::credit_line(format!(
                "drawdown of {} exceeds limit {} (balance {})",
                amount, self.limit, self.balance
            )));
        }

        if self.has_started() {
            if now >= self.term_end {
                return Err(TrancheError::credit_line("term has ended"));
            }
            self.accrue(now)?;
        } else {
            self.term_start = Some(now);
            self.term_end = safe_add_i64(now, self.terms.term_seconds)?;
            self.interest_accrued_as_of = now;
            self.last_full_payment_time = now;
        }

        self.balance = new_balance;
        log::debug!("credit line {}: drawdown {} -> balance {}", self.account, amount, self.balance);
        Ok(())
    }

    fn assess(&mut self, now: i64, collected: u128) -> CoreResult<Assessment> {
        if !self.has_started() {
            return Ok(Assessment { payment_remaining: collected, ..Assessment::default() });
        }
        self.accrue(now)?;

        let interest_payment = collected.min(self.interest_owed);
        let remaining = collected - interest_payment;
        let owed_payment = remaining.min(self.principal_owed);
        let remaining = remaining - owed_payment;
        let prepayment = remaining.min(self.balance - owed_payment);
        let principal_payment = owed_payment + prepayment;

        self.interest_owed = safe_sub_u128(self.interest_owed, interest_payment)?;
        self.principal_owed = safe_sub_u128(self.principal_owed, owed_payment)?;
        self.balance = safe_sub_u128(self.balance, principal_payment)?;

        if self.interest_owed == 0 && self.principal_owed == 0 {
            self.last_full_payment_time = now;
        }

        Ok(Assessment {
            payment_remaining: remaining - prepayment,
            interest_payment,
            principal_payment,
        })
    }
}
