use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::condition::{Condition, ConditionValue, Operator, SnapshotField};
use super::domain::{ActionKind, PlaybookAction, PlaybookTrigger, Priority, Segment, ServiceType};

/// Immutable, validated catalog of playbook triggers.
#[derive(Debug, Clone)]
pub struct PlaybookRegistry {
    triggers: Vec<PlaybookTrigger>,
}

impl PlaybookRegistry {
    pub fn new(triggers: Vec<PlaybookTrigger>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for trigger in &triggers {
            validate_trigger(trigger)?;
            if !seen.insert(trigger.trigger_type.as_str()) {
                return Err(RegistryError::DuplicateTrigger(trigger.trigger_type.clone()));
            }
        }
        Ok(Self { triggers })
    }

    /// Built-in catalog used when no override file is configured.
    pub fn standard() -> Self {
        Self {
            triggers: standard_triggers(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RegistryError> {
        let triggers: Vec<PlaybookTrigger> = serde_json::from_str(raw)?;
        Self::new(triggers)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn triggers(&self) -> &[PlaybookTrigger] {
        &self.triggers
    }

    pub fn get(&self, trigger_type: &str) -> Option<&PlaybookTrigger> {
        self.triggers
            .iter()
            .find(|trigger| trigger.trigger_type == trigger_type)
    }

    pub fn for_segment(&self, segment: Segment) -> Vec<&PlaybookTrigger> {
        self.triggers
            .iter()
            .filter(|trigger| trigger.applicable_segments.contains(&segment))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// Catalog definitions that cannot be evaluated safely.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("trigger '{0}' has no applicable segments")]
    NoSegments(String),
    #[error("trigger '{0}' has no applicable service types")]
    NoServiceTypes(String),
    #[error("trigger '{0}' defines no actions")]
    NoActions(String),
    #[error("trigger '{0}' defines no conditions")]
    NoConditions(String),
    #[error("trigger '{0}' is defined more than once")]
    DuplicateTrigger(String),
    #[error("trigger '{trigger}' references unknown field '{field}'")]
    UnknownField { trigger: String, field: String },
    #[error("trigger '{trigger}' compares '{field}' with an incompatible value for {operator:?}")]
    IncompatibleValue {
        trigger: String,
        field: String,
        operator: Operator,
    },
    #[error("trigger '{trigger}' has unparseable timeframe '{timeframe}'")]
    InvalidTimeframe { trigger: String, timeframe: String },
    #[error("unable to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn validate_trigger(trigger: &PlaybookTrigger) -> Result<(), RegistryError> {
    let id = || trigger.trigger_type.clone();

    if trigger.applicable_segments.is_empty() {
        return Err(RegistryError::NoSegments(id()));
    }
    if trigger.applicable_service_types.is_empty() {
        return Err(RegistryError::NoServiceTypes(id()));
    }
    if trigger.actions.is_empty() {
        return Err(RegistryError::NoActions(id()));
    }
    if trigger.conditions.is_empty() && trigger.any_conditions.is_empty() {
        return Err(RegistryError::NoConditions(id()));
    }

    for condition in trigger.conditions.iter().chain(&trigger.any_conditions) {
        let field = SnapshotField::from_name(&condition.field).ok_or_else(|| {
            RegistryError::UnknownField {
                trigger: id(),
                field: condition.field.clone(),
            }
        })?;

        let compatible = match (condition.operator, &condition.value) {
            (operator, ConditionValue::Number(_)) if operator.is_ordering() => field.is_numeric(),
            (operator, ConditionValue::Text(_)) if operator.is_ordering() => false,
            (Operator::Contains, value) => !field.is_numeric() && value.as_text().is_some(),
            (_, ConditionValue::Number(_)) => field.is_numeric(),
            (_, ConditionValue::Text(_)) => !field.is_numeric(),
        };
        if !compatible {
            return Err(RegistryError::IncompatibleValue {
                trigger: id(),
                field: condition.field.clone(),
                operator: condition.operator,
            });
        }

        if let Some(timeframe) = &condition.timeframe {
            if condition.timeframe_days().is_none() {
                return Err(RegistryError::InvalidTimeframe {
                    trigger: id(),
                    timeframe: timeframe.clone(),
                });
            }
        }
    }

    Ok(())
}

struct TriggerSpec {
    trigger_type: &'static str,
    name: &'static str,
    description: &'static str,
    priority: Priority,
    conditions: Vec<Condition>,
    any_conditions: Vec<Condition>,
    actions: Vec<PlaybookAction>,
    segments: &'static [Segment],
    service_types: &'static [ServiceType],
}

impl From<TriggerSpec> for PlaybookTrigger {
    fn from(spec: TriggerSpec) -> Self {
        PlaybookTrigger {
            trigger_type: spec.trigger_type.to_string(),
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            priority: spec.priority,
            conditions: spec.conditions,
            any_conditions: spec.any_conditions,
            actions: spec.actions,
            applicable_segments: spec.segments.to_vec(),
            applicable_service_types: spec.service_types.to_vec(),
        }
    }
}

fn action(kind: ActionKind, description: &str) -> PlaybookAction {
    PlaybookAction {
        kind,
        description: description.to_string(),
        assignee_role: None,
        template: None,
    }
}

fn assigned(kind: ActionKind, description: &str, role: &str) -> PlaybookAction {
    PlaybookAction {
        assignee_role: Some(role.to_string()),
        ..action(kind, description)
    }
}

fn email(description: &str, template: &str) -> PlaybookAction {
    PlaybookAction {
        template: Some(template.to_string()),
        ..action(ActionKind::Email, description)
    }
}

const ALL_SEGMENTS: &[Segment] = &[
    Segment::Free,
    Segment::Smb,
    Segment::MidMarket,
    Segment::Enterprise,
];
const PAID_SEGMENTS: &[Segment] = &[Segment::Smb, Segment::MidMarket, Segment::Enterprise];
const ALL_SERVICES: &[ServiceType] = &[ServiceType::BlackCar, ServiceType::Shuttle];

fn standard_triggers() -> Vec<PlaybookTrigger> {
    use ActionKind::{Alert, Escalate, Slack, Task};
    use Operator::{ChangedTo, Contains, Equals, Gte, Lt, Lte};

    let specs = vec![
        TriggerSpec {
            trigger_type: "health_critical",
            name: "Critical Health Alert",
            description: "Account health has dropped into the red zone.",
            priority: Priority::Critical,
            conditions: Vec::new(),
            any_conditions: vec![
                Condition::new("health_score", Equals, "red"),
                Condition::new("numeric_health_score", Lt, 30_i64),
            ],
            actions: vec![
                assigned(Alert, "Immediate CSM notification", "csm"),
                assigned(Task, "Schedule executive check-in call within 48 hours", "csm"),
                action(Slack, "Post account summary to #cs-escalations"),
            ],
            segments: ALL_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "churn_risk",
            name: "Churn Risk Detected",
            description: "Three or more active risk signals are open on the account.",
            priority: Priority::Critical,
            conditions: vec![Condition::new("risk_signal_count", Gte, 3_i64)],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Escalate, "Escalate to CS leadership", "cs_manager"),
                assigned(Task, "Build churn save plan", "csm"),
                email("Send executive outreach", "churn_save_outreach"),
            ],
            segments: ALL_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "enterprise_renewal_at_risk",
            name: "Enterprise Renewal at Risk",
            description: "Enterprise renewal is inside 90 days while health is below 60.",
            priority: Priority::Critical,
            conditions: vec![
                Condition::new("days_to_renewal", Lte, 90_i64).within("90d"),
                Condition::new("days_to_renewal", Gte, 0_i64),
                Condition::new("numeric_health_score", Lt, 60_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(
                    Escalate,
                    "Loop in account executive for renewal save",
                    "account_executive",
                ),
                assigned(Task, "Draft renewal risk mitigation plan", "csm"),
            ],
            segments: &[Segment::Enterprise],
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "payment_failed",
            name: "Payment Failure",
            description: "The most recent invoice could not be collected.",
            priority: Priority::High,
            conditions: vec![Condition::new("payment_health", Equals, "failed")],
            any_conditions: Vec::new(),
            actions: vec![
                email("Send payment update reminder", "payment_failed_reminder"),
                assigned(Task, "Confirm billing contact and card on file", "csm"),
                assigned(Alert, "Notify billing team", "billing"),
            ],
            segments: PAID_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "onboarding_stalled",
            name: "Onboarding Stalled",
            description: "No trips booked and no login for a week.",
            priority: Priority::High,
            conditions: vec![
                Condition::new("total_trips", Equals, 0_i64),
                Condition::new("days_since_last_login", Gte, 7_i64).within("7d"),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Schedule onboarding session", "onboarding_specialist"),
                email("Send getting-started guide", "onboarding_nudge"),
            ],
            segments: ALL_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "usage_decline",
            name: "Usage Decline",
            description: "An established account booked fewer than five trips this month.",
            priority: Priority::High,
            conditions: vec![
                Condition::new("trips_last_30_days", Lt, 5_i64).within("30d"),
                Condition::new("total_trips", Gte, 20_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Review booking activity with customer", "csm"),
                action(Alert, "Flag usage decline to CSM"),
            ],
            segments: PAID_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "support_ticket_spike",
            name: "Support Ticket Spike",
            description: "Five or more support tickets are open at once.",
            priority: Priority::High,
            conditions: vec![Condition::new("open_support_tickets", Gte, 5_i64)],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Alert, "Notify support lead of ticket backlog", "support_lead"),
                assigned(Task, "Review open tickets with customer", "csm"),
            ],
            segments: PAID_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "free_onboarding_stalled",
            name: "Free Plan Activation Stalled",
            description: "Free account idle for two weeks with fewer than three trips.",
            priority: Priority::Medium,
            conditions: vec![
                Condition::new("days_since_last_login", Gte, 14_i64).within("14d"),
                Condition::new("total_trips", Lt, 3_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                email("Send free-plan activation sequence", "free_activation_sequence"),
                assigned(Task, "Qualify free account for upgrade outreach", "sales"),
            ],
            segments: &[Segment::Free],
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "login_inactivity",
            name: "Login Inactivity",
            description: "Nobody on the account has logged in for 30 days.",
            priority: Priority::Medium,
            conditions: vec![Condition::new("days_since_last_login", Gte, 30_i64).within("30d")],
            any_conditions: Vec::new(),
            actions: vec![
                email("Send re-engagement email", "re_engagement"),
                assigned(Task, "Call primary operator contact", "csm"),
            ],
            segments: PAID_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "renewal_upcoming",
            name: "Renewal Approaching",
            description: "Contract renews within 60 days.",
            priority: Priority::Medium,
            conditions: vec![
                Condition::new("days_to_renewal", Lte, 60_i64).within("60d"),
                Condition::new("days_to_renewal", Gte, 0_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Prepare renewal business review", "csm"),
                email("Send renewal reminder", "renewal_reminder"),
            ],
            segments: &[Segment::MidMarket, Segment::Enterprise],
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "health_declining",
            name: "Health Score Declining",
            description: "Account health moved into the yellow zone.",
            priority: Priority::Medium,
            conditions: vec![Condition::new("health_score", ChangedTo, "yellow")],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Investigate health drop drivers", "csm"),
                action(Slack, "Share health change in account channel"),
            ],
            segments: PAID_SEGMENTS,
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "shuttle_low_utilization",
            name: "Shuttle Low Utilization",
            description: "Shuttle operator booked fewer than ten seats this month.",
            priority: Priority::Medium,
            conditions: vec![
                Condition::new("trips_last_30_days", Lt, 10_i64).within("30d"),
                Condition::new("total_trips", Gte, 10_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Review shuttle route schedule with operator", "csm"),
                email("Send shuttle best-practices guide", "shuttle_best_practices"),
            ],
            segments: PAID_SEGMENTS,
            service_types: &[ServiceType::Shuttle],
        },
        TriggerSpec {
            trigger_type: "expansion_opportunity",
            name: "Expansion Opportunity",
            description: "Healthy account booking at a pace that justifies a plan upgrade.",
            priority: Priority::Low,
            conditions: vec![
                Condition::new("trips_last_30_days", Gte, 100_i64).within("30d"),
                Condition::new("health_score", Equals, "green"),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                assigned(Task, "Pitch plan upgrade", "account_executive"),
                email("Send upgrade offer", "upgrade_offer"),
            ],
            segments: &[Segment::Smb, Segment::MidMarket],
            service_types: ALL_SERVICES,
        },
        TriggerSpec {
            trigger_type: "trial_conversion",
            name: "Trial Conversion Window",
            description: "Trial account is actively booking and ready for a conversion offer.",
            priority: Priority::Low,
            conditions: vec![
                Condition::new("current_plan", Contains, "trial"),
                Condition::new("total_trips", Gte, 5_i64),
            ],
            any_conditions: Vec::new(),
            actions: vec![
                email("Send trial conversion offer", "trial_conversion"),
                assigned(Task, "Book conversion call", "sales"),
            ],
            segments: &[Segment::Free],
            service_types: ALL_SERVICES,
        },
    ];

    specs.into_iter().map(PlaybookTrigger::from).collect()
}
