use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DocumentId, DocumentRecord, FileMeta, RequirementDefinition};

/// Processor-chosen classification for a freshly uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// Fulfil a requirement that is currently missing.
    Missing { requirement_id: String },
    /// Replace the file behind an existing document, keeping its category.
    Existing { document_id: DocumentId },
    /// File under a processor-supplied category unrelated to any requirement.
    New { category: String },
}

/// Mutation the document store should apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DocumentMutation {
    Create {
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requirement_id: Option<String>,
        file: FileMeta,
    },
    Replace {
        document_id: DocumentId,
        category: String,
        file: FileMeta,
    },
}

/// Rejections for a disposition chosen against stale or invalid input.
///
/// All of them send the processor back to the categorization step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispositionError {
    #[error("requirement '{0}' is not currently missing")]
    InvalidRequirement(String),
    #[error("document '{0}' no longer exists")]
    DocumentNotFound(String),
    #[error("a category name is required")]
    EmptyCategory,
    #[error("the uploaded file is empty")]
    EmptyUpload,
}

impl Serialize for DispositionError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl DispositionError {
    pub const fn code(&self) -> &'static str {
        match self {
            DispositionError::InvalidRequirement(_) => "invalid_requirement",
            DispositionError::DocumentNotFound(_) => "document_not_found",
            DispositionError::EmptyCategory => "empty_category",
            DispositionError::EmptyUpload => "empty_upload",
        }
    }
}

/// Validate a disposition against the current missing set and collection.
pub fn resolve_disposition(
    choice: &Disposition,
    file: &FileMeta,
    missing: &[RequirementDefinition],
    documents: &[DocumentRecord],
) -> Result<DocumentMutation, DispositionError> {
    if file.is_empty() {
        return Err(DispositionError::EmptyUpload);
    }

    match choice {
        Disposition::Missing { requirement_id } => {
            if !missing
                .iter()
                .any(|requirement| &requirement.id == requirement_id)
            {
                return Err(DispositionError::InvalidRequirement(requirement_id.clone()));
            }

            Ok(DocumentMutation::Create {
                category: requirement_id.clone(),
                requirement_id: Some(requirement_id.clone()),
                file: file.clone(),
            })
        }
        Disposition::Existing { document_id } => {
            let existing = documents
                .iter()
                .find(|document| &document.id == document_id)
                .ok_or_else(|| DispositionError::DocumentNotFound(document_id.0.clone()))?;

            Ok(DocumentMutation::Replace {
                document_id: existing.id.clone(),
                category: existing.category.clone(),
                file: file.clone(),
            })
        }
        Disposition::New { category } => {
            let trimmed = category.trim();
            if trimmed.is_empty() {
                return Err(DispositionError::EmptyCategory);
            }

            Ok(DocumentMutation::Create {
                category: trimmed.to_string(),
                requirement_id: None,
                file: file.clone(),
            })
        }
    }
}

impl DocumentMutation {
    pub fn category(&self) -> &str {
        match self {
            DocumentMutation::Create { category, .. }
            | DocumentMutation::Replace { category, .. } => category,
        }
    }

    pub fn file(&self) -> &FileMeta {
        match self {
            DocumentMutation::Create { file, .. } | DocumentMutation::Replace { file, .. } => file,
        }
    }

    /// Apply the mutation to an in-memory collection.
    ///
    /// `new_id` is only used for creations. Returns the created or updated
    /// record, or `DocumentNotFound` when a replaced document vanished.
    pub fn apply_to(
        &self,
        documents: &mut Vec<DocumentRecord>,
        new_id: DocumentId,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DocumentRecord, DispositionError> {
        match self {
            DocumentMutation::Create { category, file, .. } => {
                let record = DocumentRecord {
                    id: new_id,
                    category: category.clone(),
                    name: file.name.clone(),
                    size: file.size,
                    mime_type: file.mime_type.clone(),
                    uploaded_at: Some(uploaded_at),
                };
                documents.push(record.clone());
                Ok(record)
            }
            DocumentMutation::Replace {
                document_id, file, ..
            } => {
                let record = documents
                    .iter_mut()
                    .find(|document| &document.id == document_id)
                    .ok_or_else(|| DispositionError::DocumentNotFound(document_id.0.clone()))?;

                record.name = file.name.clone();
                record.size = file.size;
                record.mime_type = file.mime_type.clone();
                record.uploaded_at = Some(uploaded_at);
                Ok(record.clone())
            }
        }
    }
}
