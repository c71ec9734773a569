use crate::cli::ServeArgs;
use crate::infra::{load_registry, AppState};
use crate::routes::with_playbook_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use csm_playbooks::config::AppConfig;
use csm_playbooks::error::AppError;
use csm_playbooks::playbooks::{InMemoryTriggerLedger, PlaybookService};
use csm_playbooks::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = load_registry(&config.playbooks)?;
    let policy = config.playbooks.suppression_policy();
    info!(triggers = registry.len(), ?policy, "playbook catalog ready");

    let ledger = Arc::new(InMemoryTriggerLedger::default());
    let playbook_service = Arc::new(PlaybookService::new(registry, ledger, policy));

    let app = with_playbook_routes(playbook_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "customer success playbook service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
