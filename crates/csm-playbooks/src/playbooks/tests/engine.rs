use super::common::*;
use std::sync::Arc;

use crate::playbooks::domain::{HealthScore, PaymentHealth, Priority, Segment, ServiceType};
use crate::playbooks::engine::{evaluate_playbook_triggers, TriggerEngine};
use crate::playbooks::registry::PlaybookRegistry;
use crate::playbooks::{get_playbook_actions, ActionKind, Condition, CustomerSnapshot, Operator};

#[test]
fn healthy_account_matches_nothing() {
    let engine = TriggerEngine::new(standard_registry());
    assert!(engine.evaluate(&healthy_snapshot()).is_empty());
}

#[test]
fn red_health_fires_critical_health_alert() {
    let engine = TriggerEngine::new(standard_registry());
    let matched = engine.evaluate(&red_health_snapshot());

    assert_eq!(trigger_types(&matched), vec!["health_critical"]);
    let actions = get_playbook_actions(&matched);
    assert!(actions
        .critical_actions
        .contains(&"[Critical Health Alert] Immediate CSM notification".to_string()));
}

#[test]
fn low_numeric_score_alone_fires_health_alert() {
    let engine = TriggerEngine::new(standard_registry());
    let snapshot = CustomerSnapshot {
        health_score: HealthScore::Yellow,
        numeric_health_score: Some(29.0),
        ..healthy_snapshot()
    };

    let matched = engine.evaluate(&snapshot);

    assert!(matched
        .iter()
        .any(|trigger| trigger.trigger_type == "health_critical"));
}

#[test]
fn risk_signals_fire_churn_risk_with_escalation() {
    let engine = TriggerEngine::new(standard_registry());
    let matched = engine.evaluate(&churn_risk_snapshot());

    let churn = matched
        .iter()
        .find(|trigger| trigger.trigger_type == "churn_risk")
        .expect("churn risk fires");
    assert_eq!(churn.priority, Priority::Critical);
    assert!(churn
        .actions
        .iter()
        .any(|action| action.kind == ActionKind::Escalate));

    let actions = get_playbook_actions(&matched);
    assert!(actions
        .critical_actions
        .contains(&"[Churn Risk Detected] Escalate to CS leadership".to_string()));
}

#[test]
fn churn_risk_fires_alongside_segment_specific_triggers() {
    let engine = TriggerEngine::new(standard_registry());
    let snapshot = CustomerSnapshot {
        risk_signal_count: 3,
        days_to_renewal: Some(40),
        numeric_health_score: Some(45.0),
        health_score: HealthScore::Yellow,
        ..churn_risk_snapshot()
    };

    let types = trigger_types(&engine.evaluate(&snapshot));

    assert_eq!(
        types,
        vec!["churn_risk", "enterprise_renewal_at_risk", "renewal_upcoming", "health_declining"]
    );
}

#[test]
fn stalled_free_account_fires_generic_and_free_variants() {
    let engine = TriggerEngine::new(standard_registry());
    let types = trigger_types(&engine.evaluate(&stalled_free_snapshot()));

    assert_eq!(types, vec!["onboarding_stalled", "free_onboarding_stalled"]);
}

#[test]
fn free_variant_requires_two_weeks_of_inactivity() {
    let engine = TriggerEngine::new(standard_registry());
    let snapshot = CustomerSnapshot {
        days_since_last_login: 10,
        ..stalled_free_snapshot()
    };

    let types = trigger_types(&engine.evaluate(&snapshot));

    assert_eq!(types, vec!["onboarding_stalled"]);
}

#[test]
fn never_returns_triggers_outside_snapshot_segment() {
    let engine = TriggerEngine::new(standard_registry());
    let stressed = CustomerSnapshot {
        health_score: HealthScore::Red,
        numeric_health_score: Some(5.0),
        total_trips: 30,
        trips_last_30_days: 0,
        days_since_last_login: 45,
        payment_health: PaymentHealth::Failed,
        risk_signal_count: 6,
        days_to_renewal: Some(10),
        open_support_tickets: 9,
        current_plan: Some("free-trial".to_string()),
        ..CustomerSnapshot::default()
    };

    for segment in Segment::ordered() {
        for service_type in ServiceType::ordered() {
            let snapshot = CustomerSnapshot {
                segment,
                service_type,
                ..stressed.clone()
            };
            for trigger in engine.evaluate(&snapshot) {
                assert!(
                    trigger.applicable_segments.contains(&segment),
                    "{} fired for {:?}",
                    trigger.trigger_type,
                    segment
                );
                assert!(trigger.applicable_service_types.contains(&service_type));
            }
        }
    }
}

#[test]
fn unknown_segment_or_service_type_matches_nothing() {
    let engine = TriggerEngine::new(standard_registry());
    let unknown_segment = CustomerSnapshot {
        segment: Segment::Unknown,
        ..red_health_snapshot()
    };
    let unknown_service = CustomerSnapshot {
        service_type: ServiceType::Unknown,
        ..red_health_snapshot()
    };

    assert!(engine.evaluate(&unknown_segment).is_empty());
    assert!(engine.evaluate(&unknown_service).is_empty());
}

#[test]
fn results_are_sorted_by_priority_with_stable_ties() {
    let registry = PlaybookRegistry::new(vec![
        trigger("low_first", Priority::Low),
        trigger("critical_late", Priority::Critical),
        trigger("medium", Priority::Medium),
        trigger("low_second", Priority::Low),
        trigger("critical_later", Priority::Critical),
    ])
    .expect("fixture registry valid");
    let engine = TriggerEngine::new(Arc::new(registry));

    let types = trigger_types(&engine.evaluate(&healthy_snapshot()));

    assert_eq!(
        types,
        vec![
            "critical_late",
            "critical_later",
            "medium",
            "low_first",
            "low_second"
        ]
    );
}

#[test]
fn shuttle_only_trigger_ignores_black_car_operators() {
    let engine = TriggerEngine::new(standard_registry());
    let quiet_month = CustomerSnapshot {
        trips_last_30_days: 6,
        ..healthy_snapshot()
    };

    let black_car = trigger_types(&engine.evaluate(&quiet_month));
    let shuttle = trigger_types(&engine.evaluate(&CustomerSnapshot {
        service_type: ServiceType::Shuttle,
        ..quiet_month.clone()
    }));

    assert!(black_car.is_empty());
    assert_eq!(shuttle, vec!["shuttle_low_utilization"]);
}

#[test]
fn health_declining_needs_a_transition_when_previous_snapshot_known() {
    let engine = TriggerEngine::new(standard_registry());
    let current = CustomerSnapshot {
        health_score: HealthScore::Yellow,
        numeric_health_score: Some(65.0),
        ..healthy_snapshot()
    };
    let already_yellow = current.clone();
    let was_green = healthy_snapshot();

    let steady = trigger_types(&engine.evaluate_with_previous(&current, Some(&already_yellow)));
    let dropped = trigger_types(&engine.evaluate_with_previous(&current, Some(&was_green)));

    assert!(steady.is_empty());
    assert_eq!(dropped, vec!["health_declining"]);
}

#[test]
fn free_function_returns_owned_sorted_matches() {
    let registry = PlaybookRegistry::standard();
    let snapshot = CustomerSnapshot {
        risk_signal_count: 5,
        ..stalled_free_snapshot()
    };

    let matched = evaluate_playbook_triggers(&registry, &snapshot);

    let priorities: Vec<Priority> = matched.iter().map(|trigger| trigger.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(matched[0].trigger_type, "churn_risk");
}

#[test]
fn fixture_registry_uses_declared_conditions_only() {
    let mut custom = trigger("plan_contains_pro", Priority::High);
    custom.conditions = vec![Condition::new("current_plan", Operator::Contains, "PRO")];
    let engine = TriggerEngine::new(Arc::new(
        PlaybookRegistry::new(vec![custom]).expect("fixture registry valid"),
    ));

    let pro = CustomerSnapshot {
        current_plan: Some("pro-annual".to_string()),
        ..healthy_snapshot()
    };

    assert_eq!(trigger_types(&engine.evaluate(&pro)), vec!["plan_contains_pro"]);
    assert!(engine.evaluate(&healthy_snapshot()).is_empty());
}

#[test]
fn fractional_numeric_score_from_json_fires_health_alert() {
    let engine = TriggerEngine::new(standard_registry());
    let snapshot: CustomerSnapshot = serde_json::from_str(
        r#"{ "segment": "smb", "health_score": "yellow", "numeric_health_score": 29.5 }"#,
    )
    .expect("fractional scores deserialize");

    assert_eq!(snapshot.numeric_health_score, Some(29.5));
    let fired = trigger_types(&engine.evaluate(&snapshot));
    assert!(fired.iter().any(|trigger_type| trigger_type == "health_critical"));

    let borderline = CustomerSnapshot {
        numeric_health_score: Some(30.0),
        ..snapshot
    };
    let fired = trigger_types(&engine.evaluate(&borderline));
    assert!(!fired.iter().any(|trigger_type| trigger_type == "health_critical"));
}
