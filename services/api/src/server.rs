use crate::cli::ServeArgs;
use crate::infra::{build_queries, AppState};
use crate::routes::with_salary_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use paygrid::config::AppConfig;
use paygrid::error::AppError;
use paygrid::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let queries = build_queries(&config.estimation);
    let default_top_n = queries.limits().default_top_n;
    let max_combinations = queries.limits().max_combinations;

    let app = with_salary_routes(queries)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        scorer = ?config.estimation.scorer,
        default_top_n,
        max_combinations,
        "salary estimation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
