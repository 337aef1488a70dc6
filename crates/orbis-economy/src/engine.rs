//! Event handler applying the economy rules to stored accounts.
//!
//! Every operation follows the same shape: resolve the account(s),
//! run the pure components on the values read, then commit the result as
//! one versioned update. A version conflict means another handler
//! committed in between; the whole read-compute-commit is repeated up to
//! [`RetryPolicy::max_attempts`](crate::config::RetryPolicy) times.
//! Validation failures are returned immediately and never retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use orbis_core::{
    Account, AccountId, AccountStore, AccountUpdate, ActivitySnapshot, EconomyError,
    FortuneSource, NeutralFortune, Participant,
};

use crate::config::EconomyConfig;
use crate::cooldown::CooldownStatus;
use crate::ranking::RankPage;
use crate::transfer::TransferLedger;

/// Result of a paid work invocation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkOutcome {
    pub income: u64,
    pub fortune_multiplier: f64,
    /// Account as committed.
    pub account: Account,
}

/// Result of a qualifying message.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MessageOutcome {
    pub activity_score: f64,
    pub level: u32,
    /// Zero when the reward draw did not pay.
    pub income: u64,
    /// Whether inactivity reset the score first.
    pub reset: bool,
    pub account: Account,
}

/// Both sides of a committed transfer.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub sender: Account,
    pub recipient: Account,
    pub amount: u64,
}

pub struct EconomyEngine {
    store: Arc<dyn AccountStore>,
    fortune: Arc<dyn FortuneSource>,
    config: EconomyConfig,
    ledger: TransferLedger,
}

impl EconomyEngine {
    /// Create an engine with a neutral fortune source.
    pub fn new(store: Arc<dyn AccountStore>, config: EconomyConfig) -> Self {
        Self {
            store,
            fortune: Arc::new(NeutralFortune),
            config,
            ledger: TransferLedger::new(),
        }
    }

    pub fn with_fortune(mut self, fortune: Arc<dyn FortuneSource>) -> Self {
        self.fortune = fortune;
        self
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Fetch an account, creating it with starting values on first contact.
    pub fn ensure_account(&self, id: &AccountId) -> Result<Account, EconomyError> {
        Ok(self.store.get_or_create(self.fresh_account(id))?)
    }

    fn fresh_account(&self, id: &AccountId) -> Account {
        Account::with_activity(id.clone(), self.config.starting_activity)
    }

    /// Current account state for the balance query.
    pub fn balance(&self, id: &AccountId) -> Result<Account, EconomyError> {
        self.ensure_account(id)
    }

    /// Total needed for the level after the account's current one.
    pub fn next_level_threshold(&self, account: &Account) -> f64 {
        self.config.level.threshold_for(account.level.saturating_add(1))
    }

    /// Rate-limited work action.
    ///
    /// The cooldown is checked against the same read that the payment is
    /// committed on, so concurrent calls cannot both be paid.
    pub fn work(&self, id: &AccountId, now: DateTime<Utc>) -> Result<WorkOutcome, EconomyError> {
        let multiplier = self.fortune.income_multiplier(id, now.date_naive());

        let outcome = self.with_retry("work", id, || {
            let account = self.ensure_account(id)?;
            if let CooldownStatus::Blocked { remaining_secs } =
                self.config.cooldown.check(account.last_work_time, now)
            {
                return Err(EconomyError::CooldownActive { remaining_secs });
            }

            let income = self.config.reward.work_income(
                account.activity_score,
                account.level,
                multiplier,
                &mut rand::thread_rng(),
            );
            let balance = account
                .balance
                .checked_add(income)
                .ok_or(EconomyError::BalanceOverflow)?;

            let committed = self.store.update(
                id,
                account.version,
                &[AccountUpdate::Balance(balance), AccountUpdate::LastWork(now)],
            )?;
            Ok(WorkOutcome {
                income,
                fortune_multiplier: multiplier,
                account: committed,
            })
        })?;

        info!(
            account = %id,
            income = outcome.income,
            fortune = outcome.fortune_multiplier,
            balance = outcome.account.balance,
            "work paid"
        );
        Ok(outcome)
    }

    /// Per-message activity update and reward draw.
    ///
    /// Returns `None` for messages that do not qualify (automated author or
    /// too short); those never touch the store.
    pub fn record_message(
        &self,
        author: &Participant,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MessageOutcome>, EconomyError> {
        if !self.config.activity.qualifies(author, content) {
            debug!(account = %author.id, automated = author.automated, "message ignored");
            return Ok(None);
        }
        let today = now.date_naive();
        let id = &author.id;

        let outcome = self.with_retry("message", id, || {
            let account = self.ensure_account(id)?;
            let mut rng = rand::thread_rng();

            let update = self.config.activity.update(
                account.activity_score,
                account.last_active_date,
                today,
                &mut rng,
            );
            // Level uses the balance before this message's reward.
            let level = self
                .config
                .level
                .level_for(account.balance as f64 + update.activity_score);
            let income = self.config.reward.message_income(
                update.activity_score,
                level,
                update.reset,
                account.last_active_date.is_none(),
                &mut rng,
            );
            let balance = account
                .balance
                .checked_add(income)
                .ok_or(EconomyError::BalanceOverflow)?;

            let snapshot = ActivitySnapshot {
                activity_score: update.activity_score,
                level,
                last_active_date: today,
            };
            let committed = self.store.update(
                id,
                account.version,
                &[AccountUpdate::Activity(snapshot), AccountUpdate::Balance(balance)],
            )?;
            Ok(MessageOutcome {
                activity_score: update.activity_score,
                level,
                income,
                reset: update.reset,
                account: committed,
            })
        })?;

        if outcome.income > 0 {
            info!(account = %id, income = outcome.income, reset = outcome.reset, "message reward paid");
        } else {
            debug!(account = %id, activity = outcome.activity_score, level = outcome.level, "activity updated");
        }
        Ok(Some(outcome))
    }

    /// Move `amount` from `sender` to `recipient` atomically.
    pub fn transfer(
        &self,
        sender: &Participant,
        recipient: &Participant,
        amount: i64,
    ) -> Result<TransferReceipt, EconomyError> {
        let amount = self.ledger.validate(sender, recipient, amount)?;

        let receipt = self.with_retry("transfer", &sender.id, || {
            let from = self.ensure_account(&sender.id)?;
            // The recipient is only created once the transfer is known to settle.
            let existing = self.store.get(&recipient.id)?;
            let known = existing.is_some();
            let peek = existing.unwrap_or_else(|| self.fresh_account(&recipient.id));
            let mut settled = self.ledger.settle(&from, &peek, amount)?;
            let to = if known {
                peek
            } else {
                let created = self.ensure_account(&recipient.id)?;
                settled = self.ledger.settle(&from, &created, amount)?;
                created
            };
            let (from_after, to_after) = settled;

            let (sender_account, recipient_account) = self.store.update_pair(
                (&from.id, from.version, &[AccountUpdate::Balance(from_after)]),
                (&to.id, to.version, &[AccountUpdate::Balance(to_after)]),
            )?;
            Ok(TransferReceipt {
                sender: sender_account,
                recipient: recipient_account,
                amount,
            })
        })?;

        info!(from = %sender.id, to = %recipient.id, amount, "transfer committed");
        Ok(receipt)
    }

    /// Administrator balance override. Permission checks belong to the caller.
    pub fn set_balance(&self, id: &AccountId, amount: i64) -> Result<Account, EconomyError> {
        if amount < 0 {
            return Err(EconomyError::InvalidAmount(amount));
        }
        let balance = amount as u64;

        let account = self.with_retry("set_balance", id, || {
            let current = self.ensure_account(id)?;
            Ok(self
                .store
                .update(id, current.version, &[AccountUpdate::Balance(balance)])?)
        })?;

        info!(account = %id, balance, "balance overridden");
        Ok(account)
    }

    /// One page of the level leaderboard over a snapshot of all accounts.
    pub fn rank(&self, page: i64) -> Result<RankPage, EconomyError> {
        let accounts = self.store.list_all()?;
        Ok(self.config.ranking.rank(accounts, page))
    }

    fn with_retry<T>(
        &self,
        op: &'static str,
        id: &AccountId,
        mut attempt_once: impl FnMut() -> Result<T, EconomyError>,
    ) -> Result<T, EconomyError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match attempt_once() {
                Err(err) if err.is_conflict() && attempt < max_attempts => {
                    debug!(op, account = %id, attempt, "version conflict, retrying");
                    attempt += 1;
                }
                Err(err) if err.is_conflict() => {
                    warn!(op, account = %id, attempts = attempt, "giving up after repeated conflicts");
                    return Err(err);
                }
                other => return other,
            }
        }
    }
}
