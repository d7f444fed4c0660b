use crate::cli::ServeArgs;
use crate::infra::{demo_loan, AppState, InMemoryAlertPublisher, InMemoryLoanStore};
use crate::routes::with_document_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dscr_docs::config::AppConfig;
use dscr_docs::error::AppError;
use dscr_docs::telemetry;
use dscr_docs::workflows::documents::{LoanDocumentService, StoreError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = Arc::new(config.catalog.build()?);
    info!(
        source = config
            .catalog
            .path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in".to_string()),
        funders = catalog.funders().len(),
        base_requirements = catalog.base().len(),
        "requirement catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryLoanStore::default());
    if let Err(err) = seed_demo_loan(&store) {
        warn!(error = %err, "demo loan could not be seeded");
    }
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let document_service = Arc::new(LoanDocumentService::new(catalog, store, alerts));

    let app = with_document_routes(document_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "document tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn seed_demo_loan(store: &InMemoryLoanStore) -> Result<(), StoreError> {
    let loan = demo_loan();
    info!(loan_id = %loan.loan_id, funder = %loan.funder, "seeding demo loan");
    store.seed(loan)
}
