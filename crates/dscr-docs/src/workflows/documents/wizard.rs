use serde::Serialize;

use super::disposition::{resolve_disposition, Disposition, DispositionError, DocumentMutation};
use super::domain::{DocumentRecord, FileMeta, RequirementDefinition};

/// Steps of the upload flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum UploadStep {
    SelectingFile {
        #[serde(skip_serializing_if = "Option::is_none")]
        last_error: Option<DispositionError>,
    },
    Categorizing {
        file: FileMeta,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_error: Option<DispositionError>,
    },
    Submitting {
        file: FileMeta,
        mutation: DocumentMutation,
    },
    Done {
        document: DocumentRecord,
    },
    Failed {
        file: FileMeta,
        reason: String,
    },
}

impl UploadStep {
    pub const fn label(&self) -> &'static str {
        match self {
            UploadStep::SelectingFile { .. } => "selecting_file",
            UploadStep::Categorizing { .. } => "categorizing",
            UploadStep::Submitting { .. } => "submitting",
            UploadStep::Done { .. } => "done",
            UploadStep::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    #[error(transparent)]
    Disposition(#[from] DispositionError),
}

/// Select → categorize → submit flow for a single upload.
///
/// Dispositions are validated on the categorizing → submitting edge. A failed
/// submission returns to categorizing only through an explicit `retry`.
#[derive(Debug, Clone)]
pub struct UploadWizard {
    step: UploadStep,
}

impl Default for UploadWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWizard {
    pub fn new() -> Self {
        Self {
            step: UploadStep::SelectingFile { last_error: None },
        }
    }

    pub fn step(&self) -> &UploadStep {
        &self.step
    }

    pub fn is_done(&self) -> bool {
        matches!(self.step, UploadStep::Done { .. })
    }

    pub fn select_file(&mut self, file: FileMeta) -> Result<(), WizardError> {
        match &self.step {
            UploadStep::SelectingFile { .. } => {
                if file.is_empty() {
                    self.step = UploadStep::SelectingFile {
                        last_error: Some(DispositionError::EmptyUpload),
                    };
                    return Err(DispositionError::EmptyUpload.into());
                }
                self.step = UploadStep::Categorizing {
                    file,
                    last_error: None,
                };
                Ok(())
            }
            other => Err(invalid(other, "select a file")),
        }
    }

    /// Validate the chosen disposition and move to submitting.
    ///
    /// On rejection the wizard stays in categorizing with the error recorded.
    pub fn submit(
        &mut self,
        choice: &Disposition,
        missing: &[RequirementDefinition],
        documents: &[DocumentRecord],
    ) -> Result<DocumentMutation, WizardError> {
        let file = match &self.step {
            UploadStep::Categorizing { file, .. } => file.clone(),
            other => return Err(invalid(other, "submit")),
        };

        match resolve_disposition(choice, &file, missing, documents) {
            Ok(mutation) => {
                self.step = UploadStep::Submitting {
                    file,
                    mutation: mutation.clone(),
                };
                Ok(mutation)
            }
            Err(error) => {
                self.step = UploadStep::Categorizing {
                    file,
                    last_error: Some(error.clone()),
                };
                Err(error.into())
            }
        }
    }

    pub fn complete(&mut self, document: DocumentRecord) -> Result<(), WizardError> {
        match &self.step {
            UploadStep::Submitting { .. } => {
                self.step = UploadStep::Done { document };
                Ok(())
            }
            other => Err(invalid(other, "complete")),
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), WizardError> {
        match &self.step {
            UploadStep::Submitting { file, .. } => {
                let file = file.clone();
                self.step = UploadStep::Failed {
                    file,
                    reason: reason.into(),
                };
                Ok(())
            }
            other => Err(invalid(other, "fail")),
        }
    }

    pub fn retry(&mut self) -> Result<(), WizardError> {
        match &self.step {
            UploadStep::Failed { file, .. } => {
                let file = file.clone();
                self.step = UploadStep::Categorizing {
                    file,
                    last_error: None,
                };
                Ok(())
            }
            other => Err(invalid(other, "retry")),
        }
    }
}

fn invalid(from: &UploadStep, action: &'static str) -> WizardError {
    WizardError::InvalidTransition {
        from: from.label(),
        action,
    }
}
