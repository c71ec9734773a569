use super::domain::{Segment, ServiceType};

/// Annual revenue ceiling for the SMB band, expressed monthly.
pub const SMB_MAX_MRR: f64 = 6_000.0 / 12.0;
/// Annual revenue ceiling for the mid-market band, expressed monthly.
pub const MID_MARKET_MAX_MRR: f64 = 30_000.0 / 12.0;

const EXACT_PLAN_CODES: &[(&str, Segment)] = &[
    ("standard-monthly", Segment::Smb),
    ("standard-annual", Segment::Smb),
    ("starter-monthly", Segment::Smb),
    ("pro-monthly", Segment::MidMarket),
    ("pro-annual", Segment::MidMarket),
    ("vip-monthly", Segment::Enterprise),
    ("vip-annual", Segment::Enterprise),
    ("free", Segment::Free),
    ("free-trial", Segment::Free),
];

// Checked in order; the first family whose keyword appears in the plan code wins.
const PLAN_FAMILIES: &[(&[&str], Segment)] = &[
    (&["vip", "elite"], Segment::Enterprise),
    (&["pro"], Segment::MidMarket),
    (&["standard", "starter"], Segment::Smb),
    (&["free", "trial"], Segment::Free),
];

/// Maps a plan code, falling back to MRR bands, onto a segment. Never fails.
pub fn classify_segment_by_plan_or_mrr(plan: Option<&str>, mrr: Option<f64>) -> Segment {
    plan.and_then(classify_plan)
        .unwrap_or_else(|| classify_mrr(mrr))
}

fn classify_plan(plan: &str) -> Option<Segment> {
    let plan = plan.trim().to_ascii_lowercase();
    if plan.is_empty() {
        return None;
    }

    if let Some((_, segment)) = EXACT_PLAN_CODES.iter().find(|(code, _)| *code == plan) {
        return Some(*segment);
    }

    PLAN_FAMILIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| plan.contains(keyword)))
        .map(|(_, segment)| *segment)
}

fn classify_mrr(mrr: Option<f64>) -> Segment {
    match mrr {
        Some(mrr) if mrr.is_nan() || mrr <= 0.0 => Segment::Free,
        Some(mrr) if mrr <= SMB_MAX_MRR => Segment::Smb,
        Some(mrr) if mrr <= MID_MARKET_MAX_MRR => Segment::MidMarket,
        Some(_) => Segment::Enterprise,
        None => Segment::Free,
    }
}

/// Maps the operator type recorded in the CRM onto a service type.
///
/// Blank values default to black car; anything unrecognized becomes
/// [`ServiceType::Unknown`] and matches no trigger.
pub fn classify_service_type(raw: Option<&str>) -> ServiceType {
    let Some(raw) = raw.map(|value| value.trim().to_ascii_lowercase()) else {
        return ServiceType::BlackCar;
    };
    if raw.is_empty() {
        return ServiceType::BlackCar;
    }

    if raw.contains("shuttle") {
        ServiceType::Shuttle
    } else if ["black_car", "black car", "blackcar", "black-car", "limo", "chauffeur"]
        .iter()
        .any(|keyword| raw.contains(keyword))
    {
        ServiceType::BlackCar
    } else {
        ServiceType::Unknown
    }
}
