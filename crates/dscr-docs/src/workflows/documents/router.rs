use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::completeness::{CompletenessReport, CompletenessSummary};
use super::disposition::Disposition;
use super::domain::{DocumentId, DocumentRecord, FileMeta};
use super::repository::{LoanDocumentStore, PackageAlertPublisher, StoreError};
use super::service::{LoanDocumentService, LoanDocumentServiceError};

/// Body accepted when a processor files an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub disposition: Disposition,
    pub file: FileMeta,
}

#[derive(Debug, Serialize)]
pub struct CompletenessResponse {
    pub loan_id: String,
    pub summary: CompletenessSummary,
    pub report: CompletenessReport,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub loan_id: String,
    pub document: DocumentRecord,
    pub summary: CompletenessSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_failure: Option<String>,
}

/// Router builder exposing requirement lookups and package tracking.
pub fn document_router<S, A>(service: Arc<LoanDocumentService<S, A>>) -> Router
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/funders", get(funders_handler::<S, A>))
        .route(
            "/api/v1/funders/:funder/requirements",
            get(requirements_handler::<S, A>),
        )
        .route(
            "/api/v1/loans/:loan_id/completeness",
            get(completeness_handler::<S, A>),
        )
        .route(
            "/api/v1/loans/:loan_id/documents",
            post(upload_handler::<S, A>),
        )
        .route(
            "/api/v1/loans/:loan_id/documents/:document_id",
            delete(remove_handler::<S, A>),
        )
        .with_state(service)
}

pub(crate) async fn funders_handler<S, A>(
    State(service): State<Arc<LoanDocumentService<S, A>>>,
) -> Response
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    let funders = service.catalog().funders();
    (StatusCode::OK, axum::Json(json!({ "funders": funders }))).into_response()
}

pub(crate) async fn requirements_handler<S, A>(
    State(service): State<Arc<LoanDocumentService<S, A>>>,
    Path(funder): Path<String>,
) -> Response
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    let known = service.catalog().is_known_funder(&funder);
    let requirements = service.requirements(&funder);
    let payload = json!({
        "funder": funder,
        "known_funder": known,
        "requirements": requirements,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn completeness_handler<S, A>(
    State(service): State<Arc<LoanDocumentService<S, A>>>,
    Path(loan_id): Path<String>,
) -> Response
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    match service.completeness(&loan_id) {
        Ok(report) => {
            let body = CompletenessResponse {
                loan_id,
                summary: report.summary(),
                report,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upload_handler<S, A>(
    State(service): State<Arc<LoanDocumentService<S, A>>>,
    Path(loan_id): Path<String>,
    axum::Json(request): axum::Json<UploadRequest>,
) -> Response
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    match service.upload(&loan_id, &request.disposition, &request.file) {
        Ok(outcome) => {
            let body = UploadResponse {
                loan_id,
                document: outcome.document,
                summary: outcome.report.summary(),
                alert_failure: outcome.alert_failure,
            };
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_handler<S, A>(
    State(service): State<Arc<LoanDocumentService<S, A>>>,
    Path((loan_id, document_id)): Path<(String, String)>,
) -> Response
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    match service.remove_document(&loan_id, &DocumentId(document_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: LoanDocumentServiceError) -> Response {
    match error {
        LoanDocumentServiceError::Disposition(error) => {
            let payload = json!({
                "error": error.to_string(),
                "code": error.code(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LoanDocumentServiceError::Store(
            StoreError::LoanNotFound(_) | StoreError::DocumentNotFound(_),
        ) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
