use tranche_core::collaborators::{AllowList, FixedTermCreditLine, InMemoryLedger, StaticConfig};
use tranche_core::snapshot::PoolSnapshot;
use tranche_core::{
    AccountId, AddressKey, CoreResult, NumberKey, PoolController, TrancheError, SECONDS_PER_DAY,
};

use crate::config::{ScenarioConfig, Step};
use crate::error::SimResult;
use crate::report::{SimulationReport, StepDetail, StepOutcome, StepRecord};

pub type SimPool = PoolController<FixedTermCreditLine, InMemoryLedger, AllowList, StaticConfig>;

/// Replays a scenario against one pool with in-memory collaborators
pub struct Simulation {
    config: ScenarioConfig,
    pool: SimPool,
    now: i64,
}

impl Simulation {
    /// Build the pool, fund accounts and register credentials
    pub fn new(config: ScenarioConfig) -> SimResult<Self> {
        config.validate()?;

        let credit_line = FixedTermCreditLine::new(
            AccountId::new(&config.credit_line.account),
            config.credit_terms(),
            config.funding_date(),
        )?;

        let mut ledger = InMemoryLedger::new();
        let mut gate = AllowList::new();
        for account in &config.accounts {
            let id = AccountId::new(&account.name);
            ledger.mint(&id, u128::from(account.balance))?;
            if account.allowed {
                gate.allow(&id);
            }
        }

        let protocol = &config.protocol;
        let registry = StaticConfig::default()
            .with_number(NumberKey::ReserveDenominator, u128::from(protocol.reserve_denominator))
            .with_number(NumberKey::JuniorRatioSlippage, u128::from(protocol.junior_ratio_slippage_bps))
            .with_number(
                NumberKey::DrawdownPeriodInSeconds,
                u128::try_from(protocol.drawdown_period_seconds).map_err(|_| TrancheError::ConversionError)?,
            )
            .with_address(AddressKey::TreasuryReserve, AccountId::new(&protocol.treasury));

        let pool = PoolController::new(config.pool_params(), credit_line, ledger, gate, registry)?;
        let now = config.start_time;

        log::info!(
            "Loaded scenario '{}' with {} accounts and {} steps",
            config.name,
            config.accounts.len(),
            config.steps.len()
        );

        Ok(Self { config, pool, now })
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn pool(&self) -> &SimPool {
        &self.pool
    }

    /// Run every step, recording failures instead of stopping unless the
    /// scenario asks to stop on the first error
    pub fn run(&mut self) -> SimulationReport {
        let steps = self.config.steps.clone();
        let mut records = Vec::with_capacity(steps.len());
        let mut halted_at = None;

        for (index, step) in steps.iter().enumerate() {
            let time = self.now;
            let outcome = match self.apply(step) {
                Ok(detail) => {
                    log::debug!("Step {} ({}) at {}: {:?}", index, step.action(), time, detail);
                    StepOutcome::Ok { detail }
                }
                Err(err) => {
                    log::warn!("Step {} ({}) at {} failed: {}", index, step.action(), time, err);
                    StepOutcome::Failed { error: err.to_string() }
                }
            };

            let failed = !outcome.is_ok();
            records.push(StepRecord { index, action: step.action(), time, outcome });

            if failed && self.config.stop_on_error {
                halted_at = Some(index);
                break;
            }
        }

        self.report(records, halted_at)
    }

    fn apply(&mut self, step: &Step) -> CoreResult<StepDetail> {
        let now = self.now;
        match step {
            Step::Deposit { account, tranche_id, amount } => {
                let position_id =
                    self.pool.deposit(&AccountId::new(account), *tranche_id, u128::from(*amount), now)?;
                Ok(StepDetail::Position { position_id })
            }
            Step::Withdraw { account, position, amount } => {
                let caller = AccountId::new(account);
                let withdrawal = match amount {
                    Some(amount) => self.pool.withdraw(&caller, *position, u128::from(*amount), now)?,
                    None => self.pool.withdraw_max(&caller, *position, now)?,
                };
                Ok(StepDetail::Withdrawal(withdrawal))
            }
            Step::Lock => {
                self.pool.lock_pool(now)?;
                Ok(StepDetail::Done)
            }
            Step::Drawdown { amount } => {
                self.pool.drawdown(u128::from(*amount), now)?;
                Ok(StepDetail::Done)
            }
            Step::Pay { amount, payer } => {
                let payer = match payer {
                    Some(payer) => AccountId::new(payer),
                    None => self.pool.params().borrower.clone(),
                };
                let report = self.pool.pay(&payer, u128::from(*amount), now)?;
                Ok(StepDetail::Assessment(report))
            }
            Step::Assess => Ok(StepDetail::Assessment(self.pool.assess(now)?)),
            Step::Advance { days, seconds } => {
                let delta = days
                    .checked_mul(SECONDS_PER_DAY)
                    .and_then(|d| d.checked_add(*seconds))
                    .ok_or(TrancheError::MathOverflow)?;
                self.now = now.checked_add(delta).ok_or(TrancheError::MathOverflow)?;
                Ok(StepDetail::Clock { now: self.now })
            }
            Step::Cancel => {
                self.pool.cancel(now)?;
                Ok(StepDetail::Done)
            }
            Step::Close => {
                self.pool.close()?;
                Ok(StepDetail::Done)
            }
            Step::NextSlice { funding_window_days } => {
                let funding_date = funding_window_days
                    .checked_mul(SECONDS_PER_DAY)
                    .and_then(|d| now.checked_add(d))
                    .ok_or(TrancheError::MathOverflow)?;
                let slice_index = self.pool.initialize_next_slice(now, funding_date, now)?;
                Ok(StepDetail::Slice { slice_index })
            }
        }
    }

    fn report(&self, steps: Vec<StepRecord>, halted_at: Option<usize>) -> SimulationReport {
        SimulationReport {
            scenario: self.config.name.clone(),
            started_at: self.config.start_time,
            finished_at: self.now,
            halted_at,
            steps,
            status: self.pool.status().to_string(),
            total_deployed: self.pool.total_deployed(),
            slices: self.pool.slices().to_vec(),
            positions: self.pool.positions().iter().cloned().collect(),
            balances: self
                .pool
                .ledger()
                .balances()
                .map(|(account, balance)| (account.to_string(), *balance))
                .collect(),
            events: self.pool.events().to_vec(),
        }
    }

    /// Borsh snapshot of the pool as it stands
    pub fn checkpoint(&self) -> SimResult<Vec<u8>> {
        Ok(PoolSnapshot::capture(&self.pool).to_bytes()?)
    }
}
