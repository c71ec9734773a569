use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::actions::{aggregate_actions, PlaybookActions};
use super::domain::{
    ActionKind, CustomerId, CustomerSnapshot, PlaybookTrigger, Priority, Segment, ServiceType,
};
use super::engine::TriggerEngine;
use super::registry::PlaybookRegistry;
use super::suppression::{LedgerError, SuppressionPolicy, TriggerLedger, TriggerSuppressor};

/// Compact view of a fired trigger for job payloads and API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerSummary {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub name: String,
    pub priority: Priority,
    pub action_kinds: Vec<ActionKind>,
}

impl From<&PlaybookTrigger> for TriggerSummary {
    fn from(trigger: &PlaybookTrigger) -> Self {
        Self {
            trigger_type: trigger.trigger_type.clone(),
            name: trigger.name.clone(),
            priority: trigger.priority,
            action_kinds: trigger.actions.iter().map(|action| action.kind).collect(),
        }
    }
}

/// Result of evaluating one customer on a scheduled refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookRun {
    pub customer_id: CustomerId,
    pub evaluated_at: DateTime<Utc>,
    pub segment: Segment,
    pub service_type: ServiceType,
    pub triggered: Vec<TriggerSummary>,
    /// Trigger types that matched but fired recently for this customer.
    pub suppressed: Vec<String>,
    pub actions: PlaybookActions,
}

/// Stateless evaluation result without ledger bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookPreview {
    pub triggers: Vec<TriggerSummary>,
    pub actions: PlaybookActions,
}

/// Service composing the trigger engine, suppression ledger, and action aggregation.
pub struct PlaybookService<L> {
    engine: TriggerEngine,
    suppressor: TriggerSuppressor<L>,
}

impl<L> PlaybookService<L>
where
    L: TriggerLedger + 'static,
{
    pub fn new(registry: Arc<PlaybookRegistry>, ledger: Arc<L>, policy: SuppressionPolicy) -> Self {
        Self {
            engine: TriggerEngine::new(registry),
            suppressor: TriggerSuppressor::new(ledger, policy),
        }
    }

    pub fn registry(&self) -> &PlaybookRegistry {
        self.engine.registry()
    }

    /// Evaluate a customer, drop recently fired triggers, and aggregate the remaining actions.
    pub fn run(
        &self,
        customer_id: &CustomerId,
        snapshot: &CustomerSnapshot,
        previous: Option<&CustomerSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<PlaybookRun, PlaybookServiceError> {
        let matched = self.engine.evaluate_with_previous(snapshot, previous);
        let outcome = self
            .suppressor
            .partition(customer_id, matched, now)
            .map_err(|err| {
                warn!(customer = %customer_id, error = %err, "trigger ledger failure");
                err
            })?;

        let actions = aggregate_actions(&outcome.fresh);
        self.suppressor
            .commit(customer_id, &outcome, now)
            .map_err(|err| {
                warn!(customer = %customer_id, error = %err, "trigger ledger write failed");
                err
            })?;
        info!(
            customer = %customer_id,
            fired = outcome.fresh.len(),
            suppressed = outcome.suppressed.len(),
            critical = actions.critical_actions.len(),
            "playbook evaluation complete"
        );

        Ok(PlaybookRun {
            customer_id: customer_id.clone(),
            evaluated_at: now,
            segment: snapshot.segment,
            service_type: snapshot.service_type,
            triggered: outcome
                .fresh
                .iter()
                .map(|trigger| TriggerSummary::from(*trigger))
                .collect(),
            suppressed: outcome
                .suppressed
                .iter()
                .map(|trigger| trigger.trigger_type.clone())
                .collect(),
            actions,
        })
    }

    /// Evaluate without consulting or updating the ledger.
    pub fn preview(&self, snapshot: &CustomerSnapshot) -> PlaybookPreview {
        let matched = self.engine.evaluate(snapshot);
        PlaybookPreview {
            triggers: matched
                .iter()
                .map(|trigger| TriggerSummary::from(*trigger))
                .collect(),
            actions: aggregate_actions(&matched),
        }
    }
}

/// Error raised by the playbook service.
#[derive(Debug, thiserror::Error)]
pub enum PlaybookServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
