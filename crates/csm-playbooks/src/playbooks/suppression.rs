use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::domain::{CustomerId, PlaybookTrigger};

/// Whether a trigger that already fired for a customer may fire again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionPolicy {
    /// Every evaluation reports every match.
    Disabled,
    /// A trigger stays quiet for this long after it last fired for the same customer.
    Window(Duration),
}

/// Record of when each trigger last fired for each customer.
pub trait TriggerLedger: Send + Sync {
    fn last_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
    ) -> Result<Option<DateTime<Utc>>, LedgerError>;

    fn record_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
        fired_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Forget that a trigger fired, used to undo a partially recorded run.
    fn clear_fired(&self, customer: &CustomerId, trigger_type: &str) -> Result<(), LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("trigger ledger unavailable: {0}")]
    Unavailable(String),
}

/// Thread-safe ledger for single-process deployments and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTriggerLedger {
    entries: Arc<Mutex<HashMap<(CustomerId, String), DateTime<Utc>>>>,
}

impl InMemoryTriggerLedger {
    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TriggerLedger for InMemoryTriggerLedger {
    fn last_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
    ) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))?;
        Ok(guard
            .get(&(customer.clone(), trigger_type.to_string()))
            .copied())
    }

    fn record_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
        fired_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))?;
        guard.insert((customer.clone(), trigger_type.to_string()), fired_at);
        Ok(())
    }

    fn clear_fired(&self, customer: &CustomerId, trigger_type: &str) -> Result<(), LedgerError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))?;
        guard.remove(&(customer.clone(), trigger_type.to_string()));
        Ok(())
    }
}

/// Matched triggers split by whether they may act now.
///
/// Nothing is written to the ledger until [`TriggerSuppressor::commit`] runs.
#[derive(Debug)]
pub struct SuppressionOutcome<'a> {
    pub fresh: Vec<&'a PlaybookTrigger>,
    pub suppressed: Vec<&'a PlaybookTrigger>,
    // Ledger entry for each fresh trigger before this run, restored on a failed commit.
    prior: Vec<Option<DateTime<Utc>>>,
}

/// Applies a [`SuppressionPolicy`] against a [`TriggerLedger`].
pub struct TriggerSuppressor<L> {
    ledger: Arc<L>,
    policy: SuppressionPolicy,
}

impl<L> TriggerSuppressor<L>
where
    L: TriggerLedger,
{
    pub fn new(ledger: Arc<L>, policy: SuppressionPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> SuppressionPolicy {
        self.policy
    }

    /// Splits `matched` into fresh and suppressed triggers without touching the ledger.
    ///
    /// A trigger is suppressed when it last fired for `customer` less than the window before
    /// `now`. Input order is preserved in both halves.
    pub fn partition<'a>(
        &self,
        customer: &CustomerId,
        matched: Vec<&'a PlaybookTrigger>,
        now: DateTime<Utc>,
    ) -> Result<SuppressionOutcome<'a>, LedgerError> {
        let mut outcome = SuppressionOutcome {
            fresh: Vec::with_capacity(matched.len()),
            suppressed: Vec::new(),
            prior: Vec::with_capacity(matched.len()),
        };

        for trigger in matched {
            let last_fired = self.ledger.last_fired(customer, &trigger.trigger_type)?;
            let quiet = match self.policy {
                SuppressionPolicy::Disabled => false,
                SuppressionPolicy::Window(window) => last_fired
                    .map(|fired_at| fired_at <= now && now - fired_at < window)
                    .unwrap_or(false),
            };

            if quiet {
                outcome.suppressed.push(trigger);
            } else {
                outcome.fresh.push(trigger);
                outcome.prior.push(last_fired);
            }
        }

        Ok(outcome)
    }

    /// Records every fresh trigger at `now`. All or nothing: when a write fails, entries
    /// already written for this outcome are restored before the error is returned.
    pub fn commit(
        &self,
        customer: &CustomerId,
        outcome: &SuppressionOutcome<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        for (written, trigger) in outcome.fresh.iter().enumerate() {
            if let Err(err) = self.ledger.record_fired(customer, &trigger.trigger_type, now) {
                self.restore(customer, &outcome.fresh[..written], &outcome.prior[..written]);
                return Err(err);
            }
        }
        Ok(())
    }

    fn restore(
        &self,
        customer: &CustomerId,
        triggers: &[&PlaybookTrigger],
        prior: &[Option<DateTime<Utc>>],
    ) {
        for (trigger, previous) in triggers.iter().zip(prior) {
            let restored = match previous {
                Some(fired_at) => {
                    self.ledger.record_fired(customer, &trigger.trigger_type, *fired_at)
                }
                None => self.ledger.clear_fired(customer, &trigger.trigger_type),
            };
            if let Err(err) = restored {
                warn!(
                    customer = %customer,
                    trigger = %trigger.trigger_type,
                    error = %err,
                    "failed to roll back trigger ledger entry"
                );
            }
        }
    }
}
