use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for customer accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer tier driving playbook applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Segment {
    Free,
    Smb,
    MidMarket,
    Enterprise,
    Unknown,
}

impl Segment {
    pub const fn ordered() -> [Self; 4] {
        [Self::Free, Self::Smb, Self::MidMarket, Self::Enterprise]
    }

    pub const fn paid() -> [Self; 3] {
        [Self::Smb, Self::MidMarket, Self::Enterprise]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Smb => "smb",
            Self::MidMarket => "mid_market",
            Self::Enterprise => "enterprise",
            Self::Unknown => "unknown",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Smb => "SMB",
            Self::MidMarket => "Mid-Market",
            Self::Enterprise => "Enterprise",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "free" => Self::Free,
            "smb" => Self::Smb,
            "mid_market" | "midmarket" => Self::MidMarket,
            "enterprise" => Self::Enterprise,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Booking model of the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ServiceType {
    /// Whole-vehicle bookings.
    BlackCar,
    /// Per-seat bookings.
    Shuttle,
    Unknown,
}

impl ServiceType {
    pub const fn ordered() -> [Self; 2] {
        [Self::BlackCar, Self::Shuttle]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlackCar => "black_car",
            Self::Shuttle => "shuttle",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "black_car" | "blackcar" => Self::BlackCar,
            "shuttle" => Self::Shuttle,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Categorical health bucket computed by the health-scoring collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum HealthScore {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl HealthScore {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "red" => Self::Red,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for HealthScore {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Billing standing reported by the payments integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PaymentHealth {
    Good,
    AtRisk,
    Failed,
    Unknown,
}

impl PaymentHealth {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::AtRisk => "at_risk",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "good" | "healthy" | "current" => Self::Good,
            "at_risk" | "atrisk" | "past_due" => Self::AtRisk,
            "failed" | "failing" | "delinquent" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for PaymentHealth {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Trigger urgency. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Point-in-time metric bundle a trigger is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerSnapshot {
    pub segment: Segment,
    pub service_type: ServiceType,
    pub health_score: HealthScore,
    pub numeric_health_score: Option<f64>,
    pub total_trips: u32,
    pub trips_last_30_days: u32,
    pub days_since_last_login: u32,
    pub payment_health: PaymentHealth,
    pub risk_signal_count: u32,
    /// Negative once the renewal date has passed.
    pub days_to_renewal: Option<i64>,
    pub open_support_tickets: u32,
    pub current_plan: Option<String>,
    pub mrr: Option<f64>,
}

impl Default for CustomerSnapshot {
    fn default() -> Self {
        Self {
            segment: Segment::Unknown,
            service_type: ServiceType::BlackCar,
            health_score: HealthScore::Unknown,
            numeric_health_score: None,
            total_trips: 0,
            trips_last_30_days: 0,
            days_since_last_login: 0,
            payment_health: PaymentHealth::Unknown,
            risk_signal_count: 0,
            days_to_renewal: None,
            open_support_tickets: 0,
            current_plan: None,
            mrr: None,
        }
    }
}

/// What a fired trigger asks the CSM team or automation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Alert,
    Task,
    Email,
    Slack,
    Escalate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookAction {
    pub kind: ActionKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Named rule that fires when its conditions hold for a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookTrigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub name: String,
    pub description: String,
    pub priority: Priority,
    /// Every entry must hold.
    #[serde(default)]
    pub conditions: Vec<super::Condition>,
    /// When non-empty, at least one entry must hold as well.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_conditions: Vec<super::Condition>,
    pub actions: Vec<PlaybookAction>,
    pub applicable_segments: Vec<Segment>,
    pub applicable_service_types: Vec<ServiceType>,
}

impl PlaybookTrigger {
    pub fn applies_to(&self, snapshot: &CustomerSnapshot) -> bool {
        self.applicable_segments.contains(&snapshot.segment)
            && self
                .applicable_service_types
                .contains(&snapshot.service_type)
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}
