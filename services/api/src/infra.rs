use chrono::{DateTime, Utc};
use csm_playbooks::config::PlaybookConfig;
use csm_playbooks::error::AppError;
use csm_playbooks::playbooks::{CustomerSnapshot, PlaybookRegistry, RegistryError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the catalog from `PLAYBOOK_REGISTRY_PATH` when set, otherwise the built-in one.
pub(crate) fn load_registry(
    config: &PlaybookConfig,
) -> Result<Arc<PlaybookRegistry>, RegistryError> {
    let registry = match &config.registry_path {
        Some(path) => {
            let registry = PlaybookRegistry::from_path(path)?;
            info!(path = %path.display(), triggers = registry.len(), "loaded playbook catalog");
            registry
        }
        None => PlaybookRegistry::standard(),
    };
    Ok(Arc::new(registry))
}

pub(crate) fn read_snapshot(path: &Path) -> Result<CustomerSnapshot, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
