use std::sync::Arc;

use tracing::debug;

use super::condition::evaluate_condition;
use super::domain::{CustomerSnapshot, PlaybookTrigger};
use super::registry::PlaybookRegistry;

/// Stateless evaluator that matches a snapshot against the injected registry.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    registry: Arc<PlaybookRegistry>,
}

impl TriggerEngine {
    pub fn new(registry: Arc<PlaybookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PlaybookRegistry {
        &self.registry
    }

    /// Matched triggers, most urgent first. Ties keep catalog order.
    pub fn evaluate(&self, snapshot: &CustomerSnapshot) -> Vec<&PlaybookTrigger> {
        self.evaluate_with_previous(snapshot, None)
    }

    pub fn evaluate_with_previous(
        &self,
        snapshot: &CustomerSnapshot,
        previous: Option<&CustomerSnapshot>,
    ) -> Vec<&PlaybookTrigger> {
        let matched = match_triggers(&self.registry, snapshot, previous);

        debug!(
            segment = snapshot.segment.as_str(),
            service_type = snapshot.service_type.as_str(),
            matched = matched.len(),
            "evaluated playbook triggers"
        );

        matched
    }
}

/// True when every `conditions` entry holds and, if present, any `any_conditions` entry holds.
pub fn trigger_fires(
    trigger: &PlaybookTrigger,
    snapshot: &CustomerSnapshot,
    previous: Option<&CustomerSnapshot>,
) -> bool {
    let all_hold = trigger
        .conditions
        .iter()
        .all(|condition| evaluate_condition(condition, snapshot, previous));

    all_hold
        && (trigger.any_conditions.is_empty()
            || trigger
                .any_conditions
                .iter()
                .any(|condition| evaluate_condition(condition, snapshot, previous)))
}

/// Evaluates `snapshot` against `registry`, returning owned matches sorted by priority.
pub fn evaluate_playbook_triggers(
    registry: &PlaybookRegistry,
    snapshot: &CustomerSnapshot,
) -> Vec<PlaybookTrigger> {
    match_triggers(registry, snapshot, None)
        .into_iter()
        .cloned()
        .collect()
}

fn match_triggers<'a>(
    registry: &'a PlaybookRegistry,
    snapshot: &CustomerSnapshot,
    previous: Option<&CustomerSnapshot>,
) -> Vec<&'a PlaybookTrigger> {
    let mut matched: Vec<&PlaybookTrigger> = registry
        .triggers()
        .iter()
        .filter(|trigger| trigger.applies_to(snapshot))
        .filter(|trigger| trigger_fires(trigger, snapshot, previous))
        .collect();

    // `sort_by_key` is stable, so equal priorities keep catalog order.
    matched.sort_by_key(|trigger| trigger.priority.rank());
    matched
}
