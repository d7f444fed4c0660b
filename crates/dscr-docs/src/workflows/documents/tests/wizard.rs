use super::common::*;

use crate::workflows::documents::catalog::RequirementCatalog;
use crate::workflows::documents::completeness::compute_completeness;
use crate::workflows::documents::disposition::{Disposition, DispositionError, DocumentMutation};
use crate::workflows::documents::domain::DocumentId;
use crate::workflows::documents::wizard::{UploadStep, UploadWizard, WizardError};

#[test]
fn walks_from_file_selection_to_done() {
    let requirements = RequirementCatalog::standard().resolve("kiavi");
    let documents = vec![document("doc-1", "drivers_license")];
    let missing = compute_completeness(&requirements, &documents).missing;

    let mut wizard = UploadWizard::new();
    assert_eq!(wizard.step().label(), "selecting_file");

    wizard
        .select_file(file("appraisal.pdf", 4096))
        .expect("file accepted");
    assert_eq!(wizard.step().label(), "categorizing");

    let mutation = wizard
        .submit(
            &Disposition::Missing {
                requirement_id: "appraisal".to_string(),
            },
            &missing,
            &documents,
        )
        .expect("appraisal is missing");
    assert_eq!(mutation.category(), "appraisal");
    assert!(matches!(
        wizard.step(),
        UploadStep::Submitting { mutation: pending, .. } if pending == &mutation
    ));

    let mut stored = documents.clone();
    let record = mutation
        .apply_to(
            &mut stored,
            DocumentId("doc-2".to_string()),
            chrono::Utc::now(),
        )
        .expect("create applies");
    wizard.complete(record.clone()).expect("completes");

    assert!(wizard.is_done());
    assert_eq!(wizard.step(), &UploadStep::Done { document: record });
}

#[test]
fn empty_files_never_leave_file_selection() {
    let mut wizard = UploadWizard::default();

    let err = wizard
        .select_file(file("blank.pdf", 0))
        .expect_err("empty file");

    assert_eq!(err, WizardError::Disposition(DispositionError::EmptyUpload));
    assert_eq!(
        wizard.step(),
        &UploadStep::SelectingFile {
            last_error: Some(DispositionError::EmptyUpload)
        }
    );

    wizard
        .select_file(file("statements.pdf", 10))
        .expect("non-empty file accepted");
    assert_eq!(wizard.step().label(), "categorizing");
}

#[test]
fn rejected_disposition_stays_in_categorizing_with_error() {
    let mut wizard = UploadWizard::new();
    wizard
        .select_file(file("lease.pdf", 512))
        .expect("file accepted");

    let err = wizard
        .submit(
            &Disposition::New {
                category: "   ".to_string(),
            },
            &[],
            &[],
        )
        .expect_err("blank category");
    assert_eq!(err, WizardError::Disposition(DispositionError::EmptyCategory));
    assert_eq!(
        wizard.step(),
        &UploadStep::Categorizing {
            file: file("lease.pdf", 512),
            last_error: Some(DispositionError::EmptyCategory),
        }
    );

    let mutation = wizard
        .submit(
            &Disposition::New {
                category: "Lease".to_string(),
            },
            &[],
            &[],
        )
        .expect("valid category on second attempt");
    assert!(matches!(mutation, DocumentMutation::Create { .. }));
    assert_eq!(wizard.step().label(), "submitting");
}

#[test]
fn stale_existing_choice_is_rejected() {
    let mut wizard = UploadWizard::new();
    wizard
        .select_file(file("statements.pdf", 128))
        .expect("file accepted");

    let err = wizard
        .submit(
            &Disposition::Existing {
                document_id: DocumentId("doc-9".to_string()),
            },
            &[],
            &[document("doc-1", "bank_statements")],
        )
        .expect_err("document is gone");

    assert_eq!(
        err,
        WizardError::Disposition(DispositionError::DocumentNotFound("doc-9".to_string()))
    );
    assert_eq!(wizard.step().label(), "categorizing");
}

#[test]
fn failed_submission_returns_to_categorizing_on_retry() {
    let mut wizard = UploadWizard::new();
    wizard
        .select_file(file("lease.pdf", 512))
        .expect("file accepted");
    wizard
        .submit(
            &Disposition::New {
                category: "Lease".to_string(),
            },
            &[],
            &[],
        )
        .expect("valid");

    wizard.fail("storage timeout").expect("fails from submitting");
    assert_eq!(
        wizard.step(),
        &UploadStep::Failed {
            file: file("lease.pdf", 512),
            reason: "storage timeout".to_string(),
        }
    );

    wizard.retry().expect("retry from failed");
    assert_eq!(
        wizard.step(),
        &UploadStep::Categorizing {
            file: file("lease.pdf", 512),
            last_error: None,
        }
    );
}

#[test]
fn out_of_order_actions_are_rejected() {
    let mut wizard = UploadWizard::new();

    assert_eq!(
        wizard.submit(
            &Disposition::New {
                category: "Lease".to_string()
            },
            &[],
            &[]
        ),
        Err(WizardError::InvalidTransition {
            from: "selecting_file",
            action: "submit",
        })
    );
    assert!(matches!(
        wizard.complete(document("doc-1", "appraisal")),
        Err(WizardError::InvalidTransition { action: "complete", .. })
    ));
    assert!(matches!(
        wizard.retry(),
        Err(WizardError::InvalidTransition { action: "retry", .. })
    ));

    wizard
        .select_file(file("lease.pdf", 512))
        .expect("file accepted");
    let err = wizard
        .select_file(file("other.pdf", 512))
        .expect_err("already categorizing");
    assert_eq!(err.to_string(), "cannot select a file while categorizing");
    assert!(matches!(
        wizard.fail("nope"),
        Err(WizardError::InvalidTransition { from: "categorizing", .. })
    ));
}

#[test]
fn steps_serialize_with_a_step_tag() {
    let mut wizard = UploadWizard::new();
    wizard
        .select_file(file("lease.pdf", 512))
        .expect("file accepted");

    let value = serde_json::to_value(wizard.step()).expect("serializes");

    assert_eq!(value["step"], "categorizing");
    assert_eq!(value["file"]["name"], "lease.pdf");
    assert!(value.get("last_error").is_none());
}
