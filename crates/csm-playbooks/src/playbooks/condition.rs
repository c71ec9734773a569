//! Declarative trigger conditions and the generic evaluator that interprets them.
//!
//! A condition names a snapshot field, an [`Operator`], and a comparison value. Field names
//! resolve through [`SnapshotField`], so catalog entries never need bespoke evaluation code.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::CustomerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Lt,
    Gt,
    Lte,
    Gte,
    Contains,
    ChangedTo,
}

impl Operator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Contains => "contains",
            Self::ChangedTo => "changed to",
        }
    }

    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Lte | Self::Gte)
    }
}

/// Comparison operand as written in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
}

impl ConditionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One clause of a trigger rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: impl Into<ConditionValue>) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.into(),
            timeframe: None,
        }
    }

    pub fn within(mut self, timeframe: &str) -> Self {
        self.timeframe = Some(timeframe.to_string());
        self
    }

    /// Lookback window in days, when a timeframe is declared and well formed.
    pub fn timeframe_days(&self) -> Option<u32> {
        self.timeframe.as_deref().and_then(parse_timeframe_days)
    }

    pub fn describe(&self) -> String {
        let base = format!("{} {} {}", self.field, self.operator.symbol(), self.value);
        match &self.timeframe {
            Some(timeframe) => format!("{base} (within {timeframe})"),
            None => base,
        }
    }
}

/// Snapshot attributes addressable from catalog conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotField {
    Segment,
    ServiceType,
    HealthScore,
    NumericHealthScore,
    TotalTrips,
    TripsLast30Days,
    DaysSinceLastLogin,
    PaymentHealth,
    RiskSignalCount,
    DaysToRenewal,
    OpenSupportTickets,
    CurrentPlan,
    Mrr,
}

impl SnapshotField {
    pub const fn all() -> [Self; 13] {
        [
            Self::Segment,
            Self::ServiceType,
            Self::HealthScore,
            Self::NumericHealthScore,
            Self::TotalTrips,
            Self::TripsLast30Days,
            Self::DaysSinceLastLogin,
            Self::PaymentHealth,
            Self::RiskSignalCount,
            Self::DaysToRenewal,
            Self::OpenSupportTickets,
            Self::CurrentPlan,
            Self::Mrr,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::ServiceType => "service_type",
            Self::HealthScore => "health_score",
            Self::NumericHealthScore => "numeric_health_score",
            Self::TotalTrips => "total_trips",
            Self::TripsLast30Days => "trips_last_30_days",
            Self::DaysSinceLastLogin => "days_since_last_login",
            Self::PaymentHealth => "payment_health",
            Self::RiskSignalCount => "risk_signal_count",
            Self::DaysToRenewal => "days_to_renewal",
            Self::OpenSupportTickets => "open_support_tickets",
            Self::CurrentPlan => "current_plan",
            Self::Mrr => "mrr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::NumericHealthScore
                | Self::TotalTrips
                | Self::TripsLast30Days
                | Self::DaysSinceLastLogin
                | Self::RiskSignalCount
                | Self::DaysToRenewal
                | Self::OpenSupportTickets
                | Self::Mrr
        )
    }

    pub fn read(self, snapshot: &CustomerSnapshot) -> FieldValue<'_> {
        match self {
            Self::Segment => FieldValue::Text(snapshot.segment.as_str()),
            Self::ServiceType => FieldValue::Text(snapshot.service_type.as_str()),
            Self::HealthScore => FieldValue::Text(snapshot.health_score.as_str()),
            Self::NumericHealthScore => snapshot
                .numeric_health_score
                .filter(|score| score.is_finite())
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Missing),
            Self::TotalTrips => FieldValue::Number(f64::from(snapshot.total_trips)),
            Self::TripsLast30Days => FieldValue::Number(f64::from(snapshot.trips_last_30_days)),
            Self::DaysSinceLastLogin => {
                FieldValue::Number(f64::from(snapshot.days_since_last_login))
            }
            Self::PaymentHealth => FieldValue::Text(snapshot.payment_health.as_str()),
            Self::RiskSignalCount => FieldValue::Number(f64::from(snapshot.risk_signal_count)),
            Self::DaysToRenewal => snapshot
                .days_to_renewal
                .map(|days| FieldValue::Number(days as f64))
                .unwrap_or(FieldValue::Missing),
            Self::OpenSupportTickets => {
                FieldValue::Number(f64::from(snapshot.open_support_tickets))
            }
            Self::CurrentPlan => snapshot
                .current_plan
                .as_deref()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Missing),
            Self::Mrr => snapshot
                .mrr
                .filter(|mrr| mrr.is_finite())
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Missing),
        }
    }
}

/// Value of a snapshot attribute, borrowed for the duration of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl FieldValue<'_> {
    fn equals(&self, expected: &ConditionValue) -> bool {
        match (self, expected) {
            (FieldValue::Number(actual), ConditionValue::Number(expected)) => actual == expected,
            (FieldValue::Text(actual), ConditionValue::Text(expected)) => {
                actual.trim().eq_ignore_ascii_case(expected.trim())
            }
            _ => false,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Evaluates a condition against the current snapshot, consulting the previous one for
/// `changed_to`. Unknown fields and missing values never match.
pub fn evaluate_condition(
    condition: &Condition,
    snapshot: &CustomerSnapshot,
    previous: Option<&CustomerSnapshot>,
) -> bool {
    let Some(field) = SnapshotField::from_name(&condition.field) else {
        return false;
    };
    let actual = field.read(snapshot);
    let expected = &condition.value;

    match condition.operator {
        Operator::Equals => actual.equals(expected),
        Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
            let (Some(actual), Some(expected)) = (actual.number(), expected.as_number()) else {
                return false;
            };
            match condition.operator {
                Operator::Lt => actual < expected,
                Operator::Gt => actual > expected,
                Operator::Lte => actual <= expected,
                _ => actual >= expected,
            }
        }
        Operator::Contains => match (actual, expected.as_text()) {
            (FieldValue::Text(actual), Some(needle)) => actual
                .to_ascii_lowercase()
                .contains(&needle.trim().to_ascii_lowercase()),
            _ => false,
        },
        Operator::ChangedTo => {
            if !actual.equals(expected) {
                return false;
            }
            match previous {
                Some(previous) => !field.read(previous).equals(expected),
                None => true,
            }
        }
    }
}

/// Parses `"30d"`, `"2w"`, `"7 days"` or a bare day count.
pub fn parse_timeframe_days(raw: &str) -> Option<u32> {
    let raw = raw.trim().to_ascii_lowercase();
    let split = raw
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(split);
    let amount: u32 = amount.parse().ok()?;

    let multiplier = match unit.trim() {
        "" | "d" | "day" | "days" => 1,
        "w" | "wk" | "week" | "weeks" => 7,
        "m" | "mo" | "month" | "months" => 30,
        "y" | "yr" | "year" | "years" => 365,
        _ => return None,
    };
    amount.checked_mul(multiplier)
}
