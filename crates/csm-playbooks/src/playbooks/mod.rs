//! Customer segmentation and playbook trigger evaluation.
//!
//! Customers are classified into segments by plan code or MRR, evaluated against a catalog of
//! declarative triggers, and the fired triggers are flattened into prioritized, deduplicated CSM
//! actions. Everything here is pure apart from the suppression ledger, which remembers when a
//! trigger last fired for a customer so scheduled refreshes do not repeat the same playbook.

pub mod actions;
pub mod condition;
pub mod domain;
pub mod engine;
pub mod registry;
pub mod router;
pub mod segment;
pub mod service;
pub mod suppression;

#[cfg(test)]
mod tests;

pub use actions::{aggregate_actions, get_playbook_actions, PlaybookActions};
pub use condition::{
    evaluate_condition, parse_timeframe_days, Condition, ConditionValue, FieldValue, Operator,
    SnapshotField,
};
pub use domain::{
    ActionKind, CustomerId, CustomerSnapshot, HealthScore, PaymentHealth, PlaybookAction,
    PlaybookTrigger, Priority, Segment, ServiceType,
};
pub use engine::{evaluate_playbook_triggers, trigger_fires, TriggerEngine};
pub use registry::{PlaybookRegistry, RegistryError};
pub use router::{playbook_router, ClassifyRequest, ClassifyResponse, EvaluateRequest};
pub use segment::{
    classify_segment_by_plan_or_mrr, classify_service_type, MID_MARKET_MAX_MRR, SMB_MAX_MRR,
};
pub use service::{
    PlaybookPreview, PlaybookRun, PlaybookService, PlaybookServiceError, TriggerSummary,
};
pub use suppression::{
    InMemoryTriggerLedger, LedgerError, SuppressionOutcome, SuppressionPolicy, TriggerLedger,
    TriggerSuppressor,
};
