use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::playbooks::domain::{
    ActionKind, CustomerId, CustomerSnapshot, HealthScore, PaymentHealth, PlaybookAction,
    PlaybookTrigger, Priority, Segment, ServiceType,
};
use crate::playbooks::registry::PlaybookRegistry;
use crate::playbooks::service::PlaybookService;
use crate::playbooks::suppression::{
    InMemoryTriggerLedger, LedgerError, SuppressionPolicy, TriggerLedger,
};
use crate::playbooks::{Condition, Operator};

pub(super) fn customer() -> CustomerId {
    CustomerId("cust-0042".to_string())
}

pub(super) fn evaluated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Established, healthy SMB operator that matches nothing in the standard catalog.
pub(super) fn healthy_snapshot() -> CustomerSnapshot {
    CustomerSnapshot {
        segment: Segment::Smb,
        service_type: ServiceType::BlackCar,
        health_score: HealthScore::Green,
        numeric_health_score: Some(82.0),
        total_trips: 340,
        trips_last_30_days: 41,
        days_since_last_login: 1,
        payment_health: PaymentHealth::Good,
        risk_signal_count: 0,
        days_to_renewal: Some(200),
        open_support_tickets: 1,
        current_plan: Some("standard-monthly".to_string()),
        mrr: Some(349.0),
    }
}

pub(super) fn red_health_snapshot() -> CustomerSnapshot {
    CustomerSnapshot {
        health_score: HealthScore::Red,
        numeric_health_score: Some(20.0),
        segment: Segment::Smb,
        service_type: ServiceType::BlackCar,
        risk_signal_count: 1,
        ..CustomerSnapshot::default()
    }
}

pub(super) fn churn_risk_snapshot() -> CustomerSnapshot {
    CustomerSnapshot {
        risk_signal_count: 4,
        segment: Segment::Enterprise,
        service_type: ServiceType::BlackCar,
        ..CustomerSnapshot::default()
    }
}

pub(super) fn stalled_free_snapshot() -> CustomerSnapshot {
    CustomerSnapshot {
        segment: Segment::Free,
        total_trips: 0,
        days_since_last_login: 20,
        service_type: ServiceType::BlackCar,
        ..CustomerSnapshot::default()
    }
}

pub(super) fn trigger(trigger_type: &str, priority: Priority) -> PlaybookTrigger {
    PlaybookTrigger {
        trigger_type: trigger_type.to_string(),
        name: format!("Fixture {trigger_type}"),
        description: "fixture trigger".to_string(),
        priority,
        conditions: vec![Condition::new("total_trips", Operator::Gte, 0_i64)],
        any_conditions: Vec::new(),
        actions: vec![PlaybookAction {
            kind: ActionKind::Task,
            description: "Follow up".to_string(),
            assignee_role: None,
            template: None,
        }],
        applicable_segments: Segment::ordered().to_vec(),
        applicable_service_types: ServiceType::ordered().to_vec(),
    }
}

pub(super) fn standard_registry() -> Arc<PlaybookRegistry> {
    Arc::new(PlaybookRegistry::standard())
}

pub(super) fn build_service(
    policy: SuppressionPolicy,
) -> (
    PlaybookService<InMemoryTriggerLedger>,
    Arc<InMemoryTriggerLedger>,
) {
    let ledger = Arc::new(InMemoryTriggerLedger::default());
    let service = PlaybookService::new(standard_registry(), ledger.clone(), policy);
    (service, ledger)
}

pub(super) fn trigger_types(triggers: &[&PlaybookTrigger]) -> Vec<String> {
    triggers
        .iter()
        .map(|trigger| trigger.trigger_type.clone())
        .collect()
}

pub(super) struct UnavailableLedger;

impl TriggerLedger for UnavailableLedger {
    fn last_fired(
        &self,
        _customer: &CustomerId,
        _trigger_type: &str,
    ) -> Result<Option<DateTime<Utc>>, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    fn record_fired(
        &self,
        _customer: &CustomerId,
        _trigger_type: &str,
        _fired_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    fn clear_fired(&self, _customer: &CustomerId, _trigger_type: &str) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }
}

/// In-memory ledger whose `fail_on`-th write (1-based) errors once; later writes succeed.
pub(super) struct FlakyLedger {
    inner: InMemoryTriggerLedger,
    writes: AtomicUsize,
    fail_on: usize,
}

impl FlakyLedger {
    pub(super) fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: InMemoryTriggerLedger::default(),
            writes: AtomicUsize::new(0),
            fail_on,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.inner.len()
    }
}

impl TriggerLedger for FlakyLedger {
    fn last_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
    ) -> Result<Option<DateTime<Utc>>, LedgerError> {
        self.inner.last_fired(customer, trigger_type)
    }

    fn record_fired(
        &self,
        customer: &CustomerId,
        trigger_type: &str,
        fired_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let write = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if write == self.fail_on {
            return Err(LedgerError::Unavailable("write timed out".to_string()));
        }
        self.inner.record_fired(customer, trigger_type, fired_at)
    }

    fn clear_fired(&self, customer: &CustomerId, trigger_type: &str) -> Result<(), LedgerError> {
        self.inner.clear_fired(customer, trigger_type)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
