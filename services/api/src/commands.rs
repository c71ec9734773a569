use crate::infra::{load_registry, parse_timestamp, read_snapshot};
use chrono::{DateTime, Utc};
use clap::Args;
use csm_playbooks::config::AppConfig;
use csm_playbooks::error::AppError;
use csm_playbooks::playbooks::{
    classify_segment_by_plan_or_mrr, classify_service_type, CustomerId, InMemoryTriggerLedger,
    PlaybookActions, PlaybookRun, PlaybookService, PlaybookTrigger, Segment,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Billing plan code (e.g. growth-annual)
    #[arg(long)]
    pub(crate) plan: Option<String>,
    /// Monthly recurring revenue in USD
    #[arg(long)]
    pub(crate) mrr: Option<f64>,
    /// Operator type as recorded in the CRM
    #[arg(long)]
    pub(crate) service_type: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Path to a JSON customer snapshot
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Optional JSON snapshot from the previous refresh
    #[arg(long)]
    pub(crate) previous: Option<PathBuf>,
    /// Customer identifier reported in the run
    #[arg(long, default_value = "cli")]
    pub(crate) customer_id: String,
    /// Evaluation time (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Print the raw JSON run instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Only list triggers applicable to this segment
    #[arg(long)]
    pub(crate) segment: Option<String>,
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let segment = classify_segment_by_plan_or_mrr(args.plan.as_deref(), args.mrr);
    let service_type = classify_service_type(args.service_type.as_deref());

    println!("Segment: {} ({})", segment.label(), segment.as_str());
    println!("Service type: {}", service_type.as_str());
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        snapshot,
        previous,
        customer_id,
        at,
        json,
    } = args;

    let config = AppConfig::load()?;
    let registry = load_registry(&config.playbooks)?;
    let current = read_snapshot(&snapshot)?;
    let previous = previous.as_deref().map(read_snapshot).transpose()?;

    let service = PlaybookService::new(
        registry,
        Arc::new(InMemoryTriggerLedger::default()),
        config.playbooks.suppression_policy(),
    );
    let run = service.run(
        &CustomerId(customer_id),
        &current,
        previous.as_ref(),
        at.unwrap_or_else(Utc::now),
    )?;

    if json {
        println!("{}", render_json(&run)?);
    } else {
        print!("{}", format_run(&run));
    }
    Ok(())
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = load_registry(&config.playbooks)?;

    let triggers: Vec<&PlaybookTrigger> = match args.segment.as_deref() {
        Some(raw) => {
            let segment = Segment::parse(raw);
            if segment == Segment::Unknown {
                println!("Unknown segment '{raw}'; no triggers apply");
                return Ok(());
            }
            registry.for_segment(segment)
        }
        None => registry.triggers().iter().collect(),
    };

    print!("{}", format_catalog(&triggers));
    Ok(())
}

fn render_json(run: &PlaybookRun) -> Result<String, AppError> {
    serde_json::to_string_pretty(run).map_err(AppError::Output)
}

fn format_run(run: &PlaybookRun) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Playbook run for {} at {} ({} / {})",
        run.customer_id,
        run.evaluated_at.to_rfc3339(),
        run.segment.label(),
        run.service_type.as_str()
    );

    if run.triggered.is_empty() {
        let _ = writeln!(out, "No triggers fired");
    } else {
        let _ = writeln!(out, "Triggered:");
        for summary in &run.triggered {
            let _ = writeln!(
                out,
                "  - [{}] {} ({})",
                summary.priority.label(),
                summary.name,
                summary.trigger_type
            );
        }
    }
    if !run.suppressed.is_empty() {
        let _ = writeln!(out, "Suppressed: {}", run.suppressed.join(", "));
    }

    format_actions(&mut out, &run.actions);
    out
}

fn format_actions(out: &mut String, actions: &PlaybookActions) {
    for (title, bucket) in [
        ("Critical actions", &actions.critical_actions),
        ("Tasks", &actions.tasks),
        ("Automated actions", &actions.automated_actions),
    ] {
        if bucket.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}:");
        for label in bucket {
            let _ = writeln!(out, "  - {label}");
        }
    }
}

fn format_catalog(triggers: &[&PlaybookTrigger]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} playbook triggers", triggers.len());
    for trigger in triggers {
        let segments: Vec<&str> = trigger
            .applicable_segments
            .iter()
            .map(|segment| segment.as_str())
            .collect();
        let _ = writeln!(
            out,
            "- [{}] {} ({}) segments: {}",
            trigger.priority.label(),
            trigger.name,
            trigger.trigger_type,
            segments.join(", ")
        );
        for condition in &trigger.conditions {
            let _ = writeln!(out, "    all: {}", condition.describe());
        }
        for condition in &trigger.any_conditions {
            let _ = writeln!(out, "    any: {}", condition.describe());
        }
    }
    out
}
