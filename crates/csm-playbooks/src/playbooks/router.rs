use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{CustomerId, CustomerSnapshot, PlaybookTrigger, Segment, ServiceType};
use super::segment::{classify_segment_by_plan_or_mrr, classify_service_type};
use super::service::{PlaybookService, PlaybookServiceError};
use super::suppression::TriggerLedger;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub mrr: Option<f64>,
    #[serde(default)]
    pub service_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifyResponse {
    pub segment: Segment,
    pub service_type: ServiceType,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub customer_id: CustomerId,
    pub snapshot: CustomerSnapshot,
    #[serde(default)]
    pub previous: Option<CustomerSnapshot>,
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Router builder exposing classification and trigger evaluation endpoints.
pub fn playbook_router<L>(service: Arc<PlaybookService<L>>) -> Router
where
    L: TriggerLedger + 'static,
{
    Router::new()
        .route("/api/v1/segments/classify", post(classify_handler))
        .route("/api/v1/playbooks/triggers", get(catalog_handler::<L>))
        .route("/api/v1/playbooks/preview", post(preview_handler::<L>))
        .route("/api/v1/playbooks/evaluate", post(evaluate_handler::<L>))
        .with_state(service)
}

pub(crate) async fn classify_handler(Json(request): Json<ClassifyRequest>) -> Response {
    let response = ClassifyResponse {
        segment: classify_segment_by_plan_or_mrr(request.plan.as_deref(), request.mrr),
        service_type: classify_service_type(request.service_type.as_deref()),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub(crate) async fn catalog_handler<L>(State(service): State<Arc<PlaybookService<L>>>) -> Response
where
    L: TriggerLedger + 'static,
{
    let triggers: &[PlaybookTrigger] = service.registry().triggers();
    (StatusCode::OK, Json(json!({ "triggers": triggers }))).into_response()
}

pub(crate) async fn preview_handler<L>(
    State(service): State<Arc<PlaybookService<L>>>,
    Json(snapshot): Json<CustomerSnapshot>,
) -> Response
where
    L: TriggerLedger + 'static,
{
    let preview = service.preview(&snapshot);
    (StatusCode::OK, Json(preview)).into_response()
}

pub(crate) async fn evaluate_handler<L>(
    State(service): State<Arc<PlaybookService<L>>>,
    Json(request): Json<EvaluateRequest>,
) -> Response
where
    L: TriggerLedger + 'static,
{
    let EvaluateRequest {
        customer_id,
        snapshot,
        previous,
        evaluated_at,
    } = request;
    let now = evaluated_at.unwrap_or_else(Utc::now);

    match service.run(&customer_id, &snapshot, previous.as_ref(), now) {
        Ok(run) => (StatusCode::OK, Json(run)).into_response(),
        Err(PlaybookServiceError::Ledger(error)) => {
            let payload = json!({
                "customer_id": customer_id.0,
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}
