use crate::infra::{infer_mime, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use dscr_docs::error::AppError;
use dscr_docs::workflows::documents::{
    compute_completeness, document_router, CompletenessReport, CompletenessSummary,
    DocumentRecord, LoanDocumentService, LoanDocumentStore, PackageAlertPublisher,
    RequirementCatalog,
};
use dscr_docs::workflows::manifest::DocumentManifestImporter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

/// Ad-hoc completeness check for a document set that is not stored anywhere.
#[derive(Debug, Deserialize)]
pub(crate) struct CompletenessReportRequest {
    #[serde(default)]
    pub(crate) funder: String,
    #[serde(default)]
    pub(crate) documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub(crate) manifest_csv: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletenessReportResponse {
    pub(crate) funder: String,
    pub(crate) known_funder: bool,
    pub(crate) data_source: DocumentSource,
    pub(crate) summary: CompletenessSummary,
    pub(crate) report: CompletenessReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DocumentSource {
    Manifest,
    Request,
}

pub(crate) fn with_document_routes<S, A>(service: Arc<LoanDocumentService<S, A>>) -> axum::Router
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    let catalog = service.shared_catalog();
    document_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/completeness/report",
            axum::routing::post(completeness_report_endpoint),
        )
        .layer(Extension(catalog))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn completeness_report_endpoint(
    Extension(catalog): Extension<Arc<RequirementCatalog>>,
    Json(payload): Json<CompletenessReportRequest>,
) -> Result<Json<CompletenessReportResponse>, AppError> {
    let CompletenessReportRequest {
        funder,
        documents,
        manifest_csv,
    } = payload;

    let (documents, data_source) = match manifest_csv {
        Some(csv) => {
            let reader = Cursor::new(csv.into_bytes());
            let documents = DocumentManifestImporter::from_reader(reader)?;
            (documents, DocumentSource::Manifest)
        }
        None => (documents, DocumentSource::Request),
    };
    let documents: Vec<DocumentRecord> = documents
        .into_iter()
        .map(|mut document| {
            if document.mime_type.is_none() {
                document.mime_type = infer_mime(&document.name);
            }
            document
        })
        .collect();

    let requirements = catalog.resolve(&funder);
    let report = compute_completeness(&requirements, &documents);

    Ok(Json(CompletenessReportResponse {
        known_funder: catalog.is_known_funder(&funder),
        funder,
        data_source,
        summary: report.summary(),
        report,
    }))
}
