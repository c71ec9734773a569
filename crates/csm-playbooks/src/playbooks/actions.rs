use std::borrow::Borrow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{ActionKind, PlaybookTrigger, Priority};

/// Action labels bucketed for the task-creation and alerting collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookActions {
    pub critical_actions: Vec<String>,
    pub tasks: Vec<String>,
    pub automated_actions: Vec<String>,
}

impl PlaybookActions {
    pub fn is_empty(&self) -> bool {
        self.critical_actions.is_empty()
            && self.tasks.is_empty()
            && self.automated_actions.is_empty()
    }

    pub fn total(&self) -> usize {
        self.critical_actions.len() + self.tasks.len() + self.automated_actions.len()
    }
}

#[derive(Default)]
struct Bucket {
    labels: Vec<String>,
    seen: HashSet<String>,
}

impl Bucket {
    fn push(&mut self, label: String) {
        if self.seen.insert(label.clone()) {
            self.labels.push(label);
        }
    }
}

/// Flattens matched triggers into deduplicated action buckets, preserving input order.
///
/// Escalations and anything raised by a critical trigger land in `critical_actions`;
/// remaining tasks land in `tasks`; everything else is automated.
pub fn aggregate_actions<T>(triggers: &[T]) -> PlaybookActions
where
    T: Borrow<PlaybookTrigger>,
{
    let mut critical = Bucket::default();
    let mut tasks = Bucket::default();
    let mut automated = Bucket::default();

    for trigger in triggers {
        let trigger = trigger.borrow();
        for action in &trigger.actions {
            let label = format!("[{}] {}", trigger.name, action.description);
            if action.kind == ActionKind::Escalate || trigger.priority == Priority::Critical {
                critical.push(label);
            } else if action.kind == ActionKind::Task {
                tasks.push(label);
            } else {
                automated.push(label);
            }
        }
    }

    PlaybookActions {
        critical_actions: critical.labels,
        tasks: tasks.labels,
        automated_actions: automated.labels,
    }
}

/// Entry point used by the scheduled job; identical to [`aggregate_actions`].
pub fn get_playbook_actions<T>(triggers: &[T]) -> PlaybookActions
where
    T: Borrow<PlaybookTrigger>,
{
    aggregate_actions(triggers)
}
