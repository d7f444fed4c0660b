use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::documents::disposition::{DispositionError, DocumentMutation};
use crate::workflows::documents::domain::{DocumentId, DocumentRecord, FileMeta};
use crate::workflows::documents::repository::{
    AlertError, LoanDocumentStore, LoanFile, PackageAlert, PackageAlertPublisher, StoreError,
};
use crate::workflows::documents::{LoanDocumentService, RequirementCatalog};

pub(super) fn document(id: &str, category: &str) -> DocumentRecord {
    DocumentRecord {
        id: DocumentId(id.to_string()),
        category: category.to_string(),
        name: format!("{category}.pdf"),
        size: 1024,
        mime_type: Some("application/pdf".to_string()),
        uploaded_at: None,
    }
}

pub(super) fn file(name: &str, size: u64) -> FileMeta {
    FileMeta {
        name: name.to_string(),
        size,
        mime_type: Some("application/pdf".to_string()),
    }
}

/// Every base requirement except the optional ones, keyed by requirement id.
pub(super) fn required_base_documents() -> Vec<DocumentRecord> {
    RequirementCatalog::standard()
        .base()
        .iter()
        .filter(|requirement| requirement.required)
        .enumerate()
        .map(|(index, requirement)| document(&format!("doc-{index}"), &requirement.id))
        .collect()
}

pub(super) fn loan(loan_id: &str, funder: &str, documents: Vec<DocumentRecord>) -> LoanFile {
    LoanFile {
        loan_id: loan_id.to_string(),
        funder: funder.to_string(),
        documents,
    }
}

pub(super) fn build_service(
    loans: Vec<LoanFile>,
) -> (
    LoanDocumentService<MemoryStore, MemoryAlerts>,
    Arc<MemoryStore>,
    Arc<MemoryAlerts>,
) {
    let store = Arc::new(MemoryStore::with_loans(loans));
    let alerts = Arc::new(MemoryAlerts::default());
    let service = LoanDocumentService::new(
        Arc::new(RequirementCatalog::standard()),
        store.clone(),
        alerts.clone(),
    );
    (service, store, alerts)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    loans: Mutex<HashMap<String, LoanFile>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub(super) fn with_loans(loans: Vec<LoanFile>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.loans.lock().expect("store mutex poisoned");
            for loan in loans {
                guard.insert(loan.loan_id.clone(), loan);
            }
        }
        store
    }

    pub(super) fn documents(&self, loan_id: &str) -> Vec<DocumentRecord> {
        self.loans
            .lock()
            .expect("store mutex poisoned")
            .get(loan_id)
            .map(|loan| loan.documents.clone())
            .unwrap_or_default()
    }

    /// Simulates a concurrent writer touching the same loan.
    pub(super) fn push_document(&self, loan_id: &str, record: DocumentRecord) {
        let mut guard = self.loans.lock().expect("store mutex poisoned");
        if let Some(loan) = guard.get_mut(loan_id) {
            loan.documents.push(record);
        }
    }
}

impl LoanDocumentStore for MemoryStore {
    fn fetch(&self, loan_id: &str) -> Result<Option<LoanFile>, StoreError> {
        let guard = self.loans.lock().expect("store mutex poisoned");
        Ok(guard.get(loan_id).cloned())
    }

    fn apply(
        &self,
        loan_id: &str,
        mutation: &DocumentMutation,
    ) -> Result<DocumentRecord, StoreError> {
        let mut guard = self.loans.lock().expect("store mutex poisoned");
        let loan = guard
            .get_mut(loan_id)
            .ok_or_else(|| StoreError::LoanNotFound(loan_id.to_string()))?;
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        mutation
            .apply_to(
                &mut loan.documents,
                DocumentId(format!("upload-{id}")),
                Utc::now(),
            )
            .map_err(|error| match error {
                DispositionError::DocumentNotFound(id) => StoreError::DocumentNotFound(id),
                other => StoreError::Unavailable(other.to_string()),
            })
    }

    fn remove(&self, loan_id: &str, document_id: &DocumentId) -> Result<(), StoreError> {
        let mut guard = self.loans.lock().expect("store mutex poisoned");
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
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<PackageAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<PackageAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl PackageAlertPublisher for MemoryAlerts {
    fn publish(&self, alert: PackageAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl LoanDocumentStore for UnavailableStore {
    fn fetch(&self, _loan_id: &str) -> Result<Option<LoanFile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn apply(
        &self,
        _loan_id: &str,
        _mutation: &DocumentMutation,
    ) -> Result<DocumentRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _loan_id: &str, _document_id: &DocumentId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FailingAlerts;

impl PackageAlertPublisher for FailingAlerts {
    fn publish(&self, _alert: PackageAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("down".to_string()))
    }
}

pub(super) fn build_service_with_failing_alerts(
    loans: Vec<LoanFile>,
) -> (LoanDocumentService<MemoryStore, FailingAlerts>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_loans(loans));
    let service = LoanDocumentService::new(
        Arc::new(RequirementCatalog::standard()),
        store.clone(),
        Arc::new(FailingAlerts),
    );
    (service, store)
}

/// Serves a fixed loan but loses every document before a mutation lands.
pub(super) struct VanishingDocumentStore {
    pub(super) loan: LoanFile,
}

impl LoanDocumentStore for VanishingDocumentStore {
    fn fetch(&self, loan_id: &str) -> Result<Option<LoanFile>, StoreError> {
        Ok((loan_id == self.loan.loan_id).then(|| self.loan.clone()))
    }

    fn apply(
        &self,
        _loan_id: &str,
        mutation: &DocumentMutation,
    ) -> Result<DocumentRecord, StoreError> {
        match mutation {
            DocumentMutation::Replace { document_id, .. } => {
                Err(StoreError::DocumentNotFound(document_id.0.clone()))
            }
            DocumentMutation::Create { .. } => {
                Err(StoreError::Unavailable("read only".to_string()))
            }
        }
    }

    fn remove(&self, _loan_id: &str, document_id: &DocumentId) -> Result<(), StoreError> {
        Err(StoreError::DocumentNotFound(document_id.0.clone()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
