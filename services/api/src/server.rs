use crate::cli::ServeArgs;
use crate::infra::{build_lookup, AppState, InMemoryEvaluationRepository};
use crate::routes::with_evaluation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use licita_ai::config::AppConfig;
use licita_ai::error::AppError;
use licita_ai::telemetry;
use licita_ai::workflows::tender::{BidEvaluationService, EvaluationConfig};
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

    let lookup = build_lookup(&config.engine)?;
    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let service = Arc::new(BidEvaluationService::new(
        repository,
        lookup,
        EvaluationConfig::from_engine(&config.engine),
    ));

    let app = with_evaluation_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        registry_url = config.engine.registry_url.as_deref().unwrap_or("-"),
        "bid evaluation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
