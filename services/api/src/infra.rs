use chrono::Utc;
use dscr_docs::workflows::documents::{
    AlertError, DispositionError, DocumentId, DocumentMutation, DocumentRecord, FileMeta,
    LoanDocumentStore, LoanFile, PackageAlert, PackageAlertPublisher, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const DEMO_LOAN_ID: &str = "demo-loan";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLoanStore {
    loans: Arc<Mutex<HashMap<String, LoanFile>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryLoanStore {
    pub(crate) fn seed(&self, loan: LoanFile) -> Result<(), StoreError> {
        self.lock()?.insert(loan.loan_id.clone(), loan);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, LoanFile>>, StoreError> {
        self.loans
            .lock()
            .map_err(|_| StoreError::Unavailable("loan store mutex poisoned".to_string()))
    }
}

impl LoanDocumentStore for InMemoryLoanStore {
    fn fetch(&self, loan_id: &str) -> Result<Option<LoanFile>, StoreError> {
        Ok(self.lock()?.get(loan_id).cloned())
    }

    fn apply(
        &self,
        loan_id: &str,
        mutation: &DocumentMutation,
    ) -> Result<DocumentRecord, StoreError> {
        let mut guard = self.lock()?;
        let loan = guard
            .get_mut(loan_id)
            .ok_or_else(|| StoreError::LoanNotFound(loan_id.to_string()))?;
        let next = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        with_inferred_mime(mutation)
            .apply_to(
                &mut loan.documents,
                DocumentId(format!("doc-{next:04}")),
                Utc::now(),
            )
            .map_err(|error| match error {
                DispositionError::DocumentNotFound(id) => StoreError::DocumentNotFound(id),
                other => StoreError::Unavailable(other.to_string()),
            })
    }

    fn remove(&self, loan_id: &str, document_id: &DocumentId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let loan = guard
            .get_mut(loan_id)
            .ok_or_else(|| StoreError::LoanNotFound(loan_id.to_string()))?;
        let before = loan.documents.len();
        loan.documents.retain(|document| &document.id != document_id);
        if loan.documents.len() == before {
            return Err(StoreError::DocumentNotFound(document_id.0.clone()));
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<PackageAlert>>>,
}

impl PackageAlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: PackageAlert) -> Result<(), AlertError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert mutex poisoned".to_string()))?;
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<PackageAlert> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Guess a content type from the filename extension.
pub(crate) fn infer_mime(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string)
}

/// Fill in a missing `mime_type` before the record is stored.
pub(crate) fn with_inferred_mime(mutation: &DocumentMutation) -> DocumentMutation {
    let mut mutation = mutation.clone();
    let file: &mut FileMeta = match &mut mutation {
        DocumentMutation::Create { file, .. } | DocumentMutation::Replace { file, .. } => file,
    };
    if file.mime_type.is_none() {
        file.mime_type = infer_mime(&file.name);
    }
    mutation
}

/// Partially filled Kiavi package served by `serve` so the endpoints have data.
pub(crate) fn demo_loan() -> LoanFile {
    let documents = [
        ("seed-01", "drivers_license", "Borrower License.pdf", 182_044),
        ("seed-02", "articles_org", "Articles of Organization.pdf", 96_310),
        ("seed-03", "bank_statements", "Statements Q1.pdf", 1_204_992),
        ("seed-04", "Lease Addendum", "Unit 2 Addendum.docx", 41_503),
    ]
    .into_iter()
    .map(|(id, category, name, size)| DocumentRecord {
        id: DocumentId(id.to_string()),
        category: category.to_string(),
        name: name.to_string(),
        size,
        mime_type: infer_mime(name),
        uploaded_at: None,
    })
    .collect();

    LoanFile {
        loan_id: DEMO_LOAN_ID.to_string(),
        funder: "kiavi".to_string(),
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_common_document_types() {
        assert_eq!(infer_mime("appraisal.pdf").as_deref(), Some("application/pdf"));
        assert_eq!(infer_mime("photo.JPG").as_deref(), Some("image/jpeg"));
        assert_eq!(infer_mime("no-extension"), None);
    }

    #[test]
    fn store_fills_missing_mime_type_and_assigns_ids() {
        let store = InMemoryLoanStore::default();
        store.seed(demo_loan()).expect("seeded");

        let mutation = DocumentMutation::Create {
            category: "appraisal".to_string(),
            requirement_id: Some("appraisal".to_string()),
            file: FileMeta {
                name: "Appraisal.pdf".to_string(),
                size: 2048,
                mime_type: None,
            },
        };
        let record = store.apply(DEMO_LOAN_ID, &mutation).expect("applied");

        assert_eq!(record.id, DocumentId("doc-0001".to_string()));
        assert_eq!(record.mime_type.as_deref(), Some("application/pdf"));
        let loan = store.fetch(DEMO_LOAN_ID).expect("fetch").expect("loan");
        assert_eq!(loan.documents.len(), 5);
    }

    #[test]
    fn store_reports_missing_loans_and_documents() {
        let store = InMemoryLoanStore::default();
        store.seed(demo_loan()).expect("seeded");

        assert!(matches!(
            store.remove("other", &DocumentId("doc-0001".to_string())),
            Err(StoreError::LoanNotFound(_))
        ));
        assert!(matches!(
            store.remove(DEMO_LOAN_ID, &DocumentId("doc-9999".to_string())),
            Err(StoreError::DocumentNotFound(_))
        ));
    }
}
