use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::RequirementCatalog;
use super::completeness::{compute_completeness, CompletenessReport};
use super::disposition::{resolve_disposition, Disposition, DispositionError, DocumentMutation};
use super::domain::{DocumentId, DocumentRecord, FileMeta, RequirementDefinition};
use super::repository::{
    AlertError, LoanDocumentStore, LoanFile, PackageAlert, PackageAlertPublisher, StoreError,
};

/// Service composing the requirement catalog, document store, and alert hook.
///
/// Every call reads the loan fresh from the store; no completeness state is
/// kept between calls.
pub struct LoanDocumentService<S, A> {
    catalog: Arc<RequirementCatalog>,
    store: Arc<S>,
    alerts: Arc<A>,
}

/// Result of an accepted upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub document: DocumentRecord,
    pub mutation: DocumentMutation,
    pub report: CompletenessReport,
    /// Set when the mutation was saved but the completion alert could not be sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_failure: Option<String>,
}

impl<S, A> LoanDocumentService<S, A>
where
    S: LoanDocumentStore + 'static,
    A: PackageAlertPublisher + 'static,
{
    pub fn new(catalog: Arc<RequirementCatalog>, store: Arc<S>, alerts: Arc<A>) -> Self {
        Self {
            catalog,
            store,
            alerts,
        }
    }

    pub fn catalog(&self) -> &RequirementCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<RequirementCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn requirements(&self, funder: &str) -> Vec<RequirementDefinition> {
        self.catalog.resolve(funder)
    }

    pub fn completeness(
        &self,
        loan_id: &str,
    ) -> Result<CompletenessReport, LoanDocumentServiceError> {
        let loan = self.load(loan_id)?;
        Ok(self.report_for(&loan))
    }

    /// Validate a disposition against the current package and persist it.
    pub fn upload(
        &self,
        loan_id: &str,
        choice: &Disposition,
        file: &FileMeta,
    ) -> Result<UploadOutcome, LoanDocumentServiceError> {
        let loan = self.load(loan_id)?;
        let before = self.report_for(&loan);

        let mutation = resolve_disposition(choice, file, &before.missing, &loan.documents)
            .map_err(|error| {
                warn!(loan_id, code = error.code(), %error, "upload disposition rejected");
                error
            })?;

        let document = self
            .store
            .apply(loan_id, &mutation)
            .map_err(|error| match error {
                StoreError::DocumentNotFound(id) => {
                    warn!(loan_id, document_id = %id, "replace target vanished before apply");
                    LoanDocumentServiceError::Disposition(DispositionError::DocumentNotFound(id))
                }
                other => other.into(),
            })?;
        info!(
            loan_id,
            document_id = %document.id.0,
            category = %document.category,
            "document mutation applied"
        );

        // The mutation is saved from here on; later failures only degrade the response.
        let after = match self.load(loan_id) {
            Ok(current) => self.report_for(&current),
            Err(error) => {
                warn!(loan_id, %error, "reload after upload failed, using merged snapshot");
                let mut documents = loan.documents.clone();
                documents.retain(|existing| existing.id != document.id);
                documents.push(document.clone());
                let requirements = self.catalog.resolve(&loan.funder);
                compute_completeness(&requirements, &documents)
            }
        };

        let mut alert_failure = None;
        if !before.is_complete() && after.is_complete() {
            if let Err(error) = self.publish_complete(&loan, &after) {
                warn!(loan_id, %error, "package completion alert failed");
                alert_failure = Some(error.to_string());
            }
        }

        Ok(UploadOutcome {
            document,
            mutation,
            report: after,
            alert_failure,
        })
    }

    pub fn remove_document(
        &self,
        loan_id: &str,
        document_id: &DocumentId,
    ) -> Result<CompletenessReport, LoanDocumentServiceError> {
        self.store.remove(loan_id, document_id)?;
        info!(loan_id, document_id = %document_id.0, "document removed");
        self.completeness(loan_id)
    }

    fn load(&self, loan_id: &str) -> Result<LoanFile, LoanDocumentServiceError> {
        self.store
            .fetch(loan_id)?
            .ok_or_else(|| StoreError::LoanNotFound(loan_id.to_string()).into())
    }

    fn report_for(&self, loan: &LoanFile) -> CompletenessReport {
        let requirements = self.catalog.resolve(&loan.funder);
        compute_completeness(&requirements, &loan.documents)
    }

    fn publish_complete(
        &self,
        loan: &LoanFile,
        report: &CompletenessReport,
    ) -> Result<(), AlertError> {
        let mut details = BTreeMap::new();
        details.insert("funder".to_string(), loan.funder.clone());
        details.insert(
            "satisfied".to_string(),
            report.satisfied.len().to_string(),
        );
        self.alerts.publish(PackageAlert {
            template: "package_complete".to_string(),
            loan_id: loan.loan_id.clone(),
            details,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoanDocumentServiceError {
    #[error(transparent)]
    Disposition(#[from] DispositionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
