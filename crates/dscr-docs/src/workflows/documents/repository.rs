use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::disposition::DocumentMutation;
use super::domain::{DocumentId, DocumentRecord};

/// Loan-owned view of the document package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFile {
    pub loan_id: String,
    pub funder: String,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

/// Storage abstraction for loan documents; persistence and file bytes live behind it.
pub trait LoanDocumentStore: Send + Sync {
    fn fetch(&self, loan_id: &str) -> Result<Option<LoanFile>, StoreError>;
    fn apply(&self, loan_id: &str, mutation: &DocumentMutation)
        -> Result<DocumentRecord, StoreError>;
    fn remove(&self, loan_id: &str, document_id: &DocumentId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("loan '{0}' not found")]
    LoanNotFound(String),
    #[error("document '{0}' not found")]
    DocumentNotFound(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired when a package changes state (e-mail, CRM, drive sync).
pub trait PackageAlertPublisher: Send + Sync {
    fn publish(&self, alert: PackageAlert) -> Result<(), AlertError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAlert {
    pub template: String,
    pub loan_id: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
