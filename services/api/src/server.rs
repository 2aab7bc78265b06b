use crate::cli::ServeArgs;
use crate::infra::{build_evaluator, AppState, InMemoryDocumentStore, InMemoryLoanRepository};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_intake::config::AppConfig;
use loan_intake::error::AppError;
use loan_intake::lending::applications::LoanApplicationService;
use loan_intake::lending::TemplateNarrator;
use loan_intake::telemetry;
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

    let evaluator = build_evaluator(&config.lending)?;
    let repository = Arc::new(InMemoryLoanRepository::default());
    let storage = Arc::new(InMemoryDocumentStore::new(
        config.lending.storage_bucket.clone(),
    ));
    let loan_service = Arc::new(
        LoanApplicationService::new(repository, storage, Arc::new(TemplateNarrator), evaluator)
            .with_narratives(config.lending.narratives_enabled),
    );

    let app = with_service_routes(loan_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        bucket = %config.lending.storage_bucket,
        narratives = config.lending.narratives_enabled,
        "loan intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
