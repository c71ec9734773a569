use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::playbooks::domain::{ActionKind, HealthScore, PaymentHealth, Priority, Segment};
use crate::playbooks::service::{PlaybookService, PlaybookServiceError};
use crate::playbooks::suppression::{LedgerError, SuppressionPolicy};
use crate::playbooks::CustomerSnapshot;

#[test]
fn run_reports_fired_triggers_and_actions() {
    let (service, ledger) = build_service(SuppressionPolicy::Window(Duration::hours(24)));

    let run = service
        .run(&customer(), &churn_risk_snapshot(), None, evaluated_at())
        .expect("run succeeds");

    assert_eq!(run.customer_id, customer());
    assert_eq!(run.segment, Segment::Enterprise);
    assert_eq!(run.evaluated_at, evaluated_at());
    assert_eq!(run.triggered.len(), 1);
    assert_eq!(run.triggered[0].trigger_type, "churn_risk");
    assert_eq!(run.triggered[0].priority, Priority::Critical);
    assert!(run.triggered[0]
        .action_kinds
        .contains(&ActionKind::Escalate));
    assert!(run.suppressed.is_empty());
    assert_eq!(run.actions.critical_actions.len(), 3);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn repeated_run_inside_window_suppresses_actions() {
    let (service, _) = build_service(SuppressionPolicy::Window(Duration::hours(24)));
    let snapshot = churn_risk_snapshot();

    service
        .run(&customer(), &snapshot, None, evaluated_at())
        .expect("first run");
    let second = service
        .run(
            &customer(),
            &snapshot,
            None,
            evaluated_at() + Duration::hours(6),
        )
        .expect("second run");

    assert!(second.triggered.is_empty());
    assert_eq!(second.suppressed, vec!["churn_risk"]);
    assert!(second.actions.is_empty());
}

#[test]
fn new_trigger_still_fires_while_older_one_is_suppressed() {
    let (service, _) = build_service(SuppressionPolicy::Window(Duration::hours(24)));
    let first = churn_risk_snapshot();
    let worse = CustomerSnapshot {
        health_score: HealthScore::Red,
        ..first.clone()
    };

    service
        .run(&customer(), &first, None, evaluated_at())
        .expect("first run");
    let second = service
        .run(
            &customer(),
            &worse,
            Some(&first),
            evaluated_at() + Duration::hours(2),
        )
        .expect("second run");

    let fired: Vec<&str> = second
        .triggered
        .iter()
        .map(|summary| summary.trigger_type.as_str())
        .collect();
    assert_eq!(fired, vec!["health_critical"]);
    assert_eq!(second.suppressed, vec!["churn_risk"]);
    assert!(second
        .actions
        .critical_actions
        .iter()
        .all(|label| label.starts_with("[Critical Health Alert]")));
}

#[test]
fn preview_does_not_touch_the_ledger() {
    let (service, ledger) = build_service(SuppressionPolicy::Window(Duration::hours(24)));

    let preview = service.preview(&stalled_free_snapshot());

    assert_eq!(preview.triggers.len(), 2);
    assert_eq!(preview.triggers[0].trigger_type, "onboarding_stalled");
    assert!(preview
        .actions
        .tasks
        .contains(&"[Onboarding Stalled] Schedule onboarding session".to_string()));
    assert!(ledger.is_empty());
}

#[test]
fn run_propagates_ledger_errors() {
    let service = PlaybookService::new(
        standard_registry(),
        Arc::new(UnavailableLedger),
        SuppressionPolicy::Window(Duration::hours(24)),
    );

    match service.run(&customer(), &churn_risk_snapshot(), None, evaluated_at()) {
        Err(PlaybookServiceError::Ledger(LedgerError::Unavailable(_))) => {}
        other => panic!("expected ledger error, got {other:?}"),
    }
}

#[test]
fn healthy_customer_produces_empty_run() {
    let (service, ledger) = build_service(SuppressionPolicy::Disabled);

    let run = service
        .run(&customer(), &healthy_snapshot(), None, evaluated_at())
        .expect("run succeeds");

    assert!(run.triggered.is_empty());
    assert!(run.actions.is_empty());
    assert!(ledger.is_empty());
}

#[test]
fn failed_ledger_write_does_not_suppress_the_retry() {
    let ledger = Arc::new(FlakyLedger::failing_on(2));
    let service = PlaybookService::new(
        standard_registry(),
        ledger.clone(),
        SuppressionPolicy::Window(Duration::hours(24)),
    );
    let snapshot = CustomerSnapshot {
        health_score: HealthScore::Red,
        payment_health: PaymentHealth::Failed,
        ..churn_risk_snapshot()
    };

    match service.run(&customer(), &snapshot, None, evaluated_at()) {
        Err(PlaybookServiceError::Ledger(LedgerError::Unavailable(_))) => {}
        other => panic!("expected ledger error, got {other:?}"),
    }
    assert_eq!(ledger.len(), 0);

    let retry = service
        .run(
            &customer(),
            &snapshot,
            None,
            evaluated_at() + Duration::minutes(5),
        )
        .expect("retry succeeds");
    let fired: Vec<&str> = retry
        .triggered
        .iter()
        .map(|summary| summary.trigger_type.as_str())
        .collect();
    assert_eq!(fired, vec!["health_critical", "churn_risk", "payment_failed"]);
    assert!(retry.suppressed.is_empty());
    assert_eq!(ledger.len(), 3);
}
