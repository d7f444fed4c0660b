mod normalizer;
mod parser;

use crate::workflows::documents::{DocumentId, DocumentRecord};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ManifestImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingDocumentId { line: usize },
    DuplicateDocumentId { line: usize, document_id: String },
}

impl std::fmt::Display for ManifestImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestImportError::Io(err) => write!(f, "failed to read document manifest: {}", err),
            ManifestImportError::Csv(err) => write!(f, "invalid document manifest CSV: {}", err),
            ManifestImportError::MissingDocumentId { line } => {
                write!(f, "document manifest line {} has no document id", line)
            }
            ManifestImportError::DuplicateDocumentId { line, document_id } => write!(
                f,
                "document manifest line {} repeats document id {}",
                line, document_id
            ),
        }
    }
}

impl std::error::Error for ManifestImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestImportError::Io(err) => Some(err),
            ManifestImportError::Csv(err) => Some(err),
            ManifestImportError::MissingDocumentId { .. }
            | ManifestImportError::DuplicateDocumentId { .. } => None,
        }
    }
}

impl From<std::io::Error> for ManifestImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ManifestImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads a loan's document collection from a CSV export
/// (`Document ID, Category, Name, Size[, Mime Type]`).
pub struct DocumentManifestImporter;

impl DocumentManifestImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentRecord>, ManifestImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<DocumentRecord>, ManifestImportError> {
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for row in parser::parse_rows(reader)? {
            if row.document_id.is_empty() {
                return Err(ManifestImportError::MissingDocumentId { line: row.line });
            }
            if !seen.insert(row.document_id.clone()) {
                return Err(ManifestImportError::DuplicateDocumentId {
                    line: row.line,
                    document_id: row.document_id,
                });
            }

            documents.push(DocumentRecord {
                id: DocumentId(row.document_id),
                category: row.category,
                name: row.name,
                size: row.size,
                mime_type: row.mime_type,
                uploaded_at: None,
            });
        }

        Ok(documents)
    }
}
