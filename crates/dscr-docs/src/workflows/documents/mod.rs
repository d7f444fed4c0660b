//! DSCR loan document package: funder requirement catalog, completeness
//! tracking, and upload disposition rules.
//!
//! Everything below `service` is pure: the catalog is immutable, and the
//! completeness report and disposition mutation are recomputed from the
//! caller's inputs on every call.

pub mod catalog;
pub mod completeness;
pub mod disposition;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use catalog::{compose, CatalogError, RequirementCatalog};
pub use completeness::{
    compute_completeness, CategoryProgress, CategoryProgressEntry, CompletenessReport,
    CompletenessSummary, ExtraDocumentView, MissingRequirementView,
};
pub use disposition::{resolve_disposition, Disposition, DispositionError, DocumentMutation};
pub use domain::{DocumentId, DocumentRecord, FileMeta, RequirementCategory, RequirementDefinition};
pub use repository::{
    AlertError, LoanDocumentStore, LoanFile, PackageAlert, PackageAlertPublisher, StoreError,
};
pub use router::{document_router, CompletenessResponse, UploadRequest, UploadResponse};
pub use service::{LoanDocumentService, LoanDocumentServiceError, UploadOutcome};
pub use wizard::{UploadStep, UploadWizard, WizardError};
