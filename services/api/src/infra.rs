use metrics_exporter_prometheus::PrometheusHandle;
use paygrid::config::EstimationConfig;
use paygrid::estimation::SalaryQueries;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the configured scorers and loads the trained model up front so
/// artifact problems show up in the startup logs.
pub(crate) fn build_queries(config: &EstimationConfig) -> Arc<SalaryQueries> {
    let queries = SalaryQueries::from_config(config);

    match queries.model_provider().map(|provider| provider.get()) {
        Some(Ok(model)) => info!(
            model = %model.name,
            artifact_dir = %config.model_dir.display(),
            "trained model ready"
        ),
        Some(Err(err)) => warn!(
            error = %err,
            "trained model not loaded, requests without use_mock will fail until it is"
        ),
        None => info!("scoring with the heuristic estimator"),
    }

    Arc::new(queries)
}
