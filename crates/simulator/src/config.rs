use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tranche_core::collaborators::CreditTerms;
use tranche_core::{AccountId, PoolParams, SECONDS_PER_DAY};

use crate::error::{SimError, SimResult};

// TOML integers are 64-bit; amounts widen to u128 on the way into the engine

/// Scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Scenario name for logging and the report
    pub name: String,

    /// Unix time the simulation clock starts at
    #[serde(default = "default_start_time")]
    pub start_time: i64,

    /// Abort the run on the first failing step
    #[serde(default)]
    pub stop_on_error: bool,

    pub pool: PoolConfig,
    pub credit_line: CreditLineConfig,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Pool parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_account")]
    pub account: String,

    pub borrower: String,

    /// Share of senior interest paid to the junior tranche (whole percent)
    pub junior_fee_percent: u64,

    /// Target junior/senior ratio in basis points
    pub junior_ratio_bps: u64,

    pub min_ticket_size: u64,
}

/// Terms of the pool's credit line, durations in days
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreditLineConfig {
    #[serde(default = "default_credit_line_account")]
    pub account: String,

    pub min_limit: u64,
    pub max_limit: u64,
    pub interest_apr_bps: u64,
    pub payment_period_days: i64,
    pub term_days: i64,

    #[serde(default)]
    pub grace_period_days: i64,

    /// Days after `start_time` until the funding window closes
    pub funding_window_days: i64,
}

/// Protocol-wide configuration numbers and addresses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Reserve takes `100 / reserve_denominator` percent of interest
    pub reserve_denominator: u64,
    pub junior_ratio_slippage_bps: u64,
    pub drawdown_period_seconds: i64,
    pub treasury: String,
}

/// Funded account in the in-memory ledger
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub name: String,

    #[serde(default)]
    pub balance: u64,

    /// Holds a credential accepted by the pool
    #[serde(default)]
    pub allowed: bool,
}

/// One scripted action, applied at the current simulation time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Deposit {
        account: String,
        tranche_id: u64,
        amount: u64,
    },
    /// Without `amount` the position withdraws everything it can
    Withdraw {
        account: String,
        position: u64,
        #[serde(default)]
        amount: Option<u64>,
    },
    Lock,
    Drawdown {
        amount: u64,
    },
    /// Payer defaults to the borrower
    Pay {
        amount: u64,
        #[serde(default)]
        payer: Option<String>,
    },
    Assess,
    Advance {
        #[serde(default)]
        days: i64,
        #[serde(default)]
        seconds: i64,
    },
    Cancel,
    Close,
    NextSlice {
        /// Days from now until the new slice's funding window closes
        funding_window_days: i64,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Lock => "lock",
            Step::Drawdown { .. } => "drawdown",
            Step::Pay { .. } => "pay",
            Step::Assess => "assess",
            Step::Advance { .. } => "advance",
            Step::Cancel => "cancel",
            Step::Close => "close",
            Step::NextSlice { .. } => "next_slice",
        }
    }

    /// Account the step acts on behalf of, if any
    fn account(&self) -> Option<&str> {
        match self {
            Step::Deposit { account, .. } | Step::Withdraw { account, .. } => Some(account),
            Step::Pay { payer, .. } => payer.as_deref(),
            _ => None,
        }
    }
}

fn default_start_time() -> i64 {
    1_700_000_000
}

fn default_pool_account() -> String {
    "pool".to_string()
}

fn default_credit_line_account() -> String {
    "credit-line".to_string()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            reserve_denominator: 10,
            junior_ratio_slippage_bps: 500,
            drawdown_period_seconds: tranche_core::DEFAULT_DRAWDOWN_PERIOD_SECONDS,
            treasury: "treasury".to_string(),
        }
    }
}

impl ScenarioConfig {
    /// Load and validate a scenario from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> SimResult<Self> {
        let config: ScenarioConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> SimResult<()> {
        if self.name.is_empty() {
            return Err(SimError::invalid("name must not be empty"));
        }

        self.pool_params().validate()?;
        self.credit_terms().validate()?;

        if self.credit_line.funding_window_days < 0 {
            return Err(SimError::invalid("funding_window_days must not be negative"));
        }
        if self.protocol.reserve_denominator == 0 {
            return Err(SimError::invalid("reserve_denominator must be greater than 0"));
        }
        if self.protocol.drawdown_period_seconds < 0 {
            return Err(SimError::invalid("drawdown_period_seconds must not be negative"));
        }

        let mut names = BTreeSet::new();
        for account in &self.accounts {
            if account.name.is_empty() {
                return Err(SimError::invalid("account name must not be empty"));
            }
            if !names.insert(account.name.as_str()) {
                return Err(SimError::invalid(format!("account '{}' is listed twice", account.name)));
            }
        }
        if names.contains(self.pool.account.as_str()) || names.contains(self.credit_line.account.as_str()) {
            return Err(SimError::invalid("pool and credit line accounts cannot be funded directly"));
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(account) = step.account() {
                if !names.contains(account) {
                    return Err(SimError::UnknownAccount(format!("{} (step {})", account, index)));
                }
            }
            if let Step::Advance { days, seconds } = step {
                if *days < 0 || *seconds < 0 {
                    return Err(SimError::invalid(format!("step {}: time only moves forward", index)));
                }
            }
        }

        Ok(())
    }

    pub fn pool_params(&self) -> PoolParams {
        PoolParams {
            pool_account: AccountId::new(&self.pool.account),
            borrower: AccountId::new(&self.pool.borrower),
            junior_fee_percent: u128::from(self.pool.junior_fee_percent),
            junior_ratio_bps: u128::from(self.pool.junior_ratio_bps),
            min_ticket_size: u128::from(self.pool.min_ticket_size),
            fundable_at: self.start_time,
        }
    }

    pub fn credit_terms(&self) -> CreditTerms {
        let line = &self.credit_line;
        CreditTerms {
            min_limit: u128::from(line.min_limit),
            max_limit: u128::from(line.max_limit),
            interest_apr_bps: u128::from(line.interest_apr_bps),
            payment_period_seconds: line.payment_period_days.saturating_mul(SECONDS_PER_DAY),
            term_seconds: line.term_days.saturating_mul(SECONDS_PER_DAY),
            grace_period_seconds: line.grace_period_days.saturating_mul(SECONDS_PER_DAY),
        }
    }

    pub fn funding_date(&self) -> i64 {
        self.start_time
            .saturating_add(self.credit_line.funding_window_days.saturating_mul(SECONDS_PER_DAY))
    }
}
