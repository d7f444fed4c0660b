use crate::infra::{demo_loan, InMemoryAlertPublisher, InMemoryLoanStore, DEMO_LOAN_ID};
use clap::Args;
use dscr_docs::config::AppConfig;
use dscr_docs::error::AppError;
use dscr_docs::workflows::documents::{
    compute_completeness, CompletenessReport, Disposition, DocumentId, DocumentRecord, FileMeta,
    LoanDocumentService, LoanDocumentStore, RequirementCatalog, UploadStep, UploadWizard,
};
use dscr_docs::workflows::manifest::DocumentManifestImporter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RequirementsArgs {
    /// Funder key (unknown keys fall back to the base package)
    #[arg(long, default_value = "")]
    pub(crate) funder: String,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Funder key used to resolve requirements
    #[arg(long, default_value = "")]
    pub(crate) funder: String,
    /// CSV export of the loan's documents (Document ID, Category, Name, Size[, Mime Type])
    #[arg(long)]
    pub(crate) documents: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Funder whose package the synthetic loan is filed under
    #[arg(long, default_value = "kiavi")]
    pub(crate) funder: String,
}

fn load_catalog() -> Result<RequirementCatalog, AppError> {
    let config = AppConfig::load()?;
    Ok(config.catalog.build()?)
}

pub(crate) fn run_requirements(args: RequirementsArgs) -> Result<(), AppError> {
    let catalog = load_catalog()?;
    let requirements = catalog.resolve(&args.funder);

    let heading = if catalog.is_known_funder(&args.funder) {
        format!("Requirements for {}", args.funder.trim())
    } else {
        "Requirements (base package)".to_string()
    };
    println!("{heading}");
    for requirement in &requirements {
        println!(
            "- [{}] {} ({}){}{}",
            if requirement.required { "required" } else { "optional" },
            requirement.name,
            requirement.category.label(),
            if requirement.funder_specific {
                " [funder]"
            } else {
                ""
            },
            requirement
                .description
                .as_deref()
                .map(|description| format!(": {description}"))
                .unwrap_or_default()
        );
    }
    println!(
        "{} requirements, {} required",
        requirements.len(),
        requirements.iter().filter(|req| req.required).count()
    );

    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs { funder, documents } = args;

    let catalog = load_catalog()?;
    let documents = match documents {
        Some(path) => DocumentManifestImporter::from_path(path)?,
        None => Vec::new(),
    };

    let requirements = catalog.resolve(&funder);
    let report = compute_completeness(&requirements, &documents);
    render_report(&funder, &report);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = Arc::new(load_catalog()?);
    let store = Arc::new(InMemoryLoanStore::default());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let mut loan = demo_loan();
    loan.funder = args.funder.clone();
    if let Err(err) = store.seed(loan) {
        println!("Demo loan unavailable: {err}");
        return Ok(());
    }
    let service = LoanDocumentService::new(catalog, store.clone(), alerts.clone());

    println!("DSCR document package demo ({})", args.funder);

    let report = match service.completeness(DEMO_LOAN_ID) {
        Ok(report) => report,
        Err(err) => {
            println!("  Completeness unavailable: {err}");
            return Ok(());
        }
    };
    render_report(&args.funder, &report);

    println!("\nUpload wizard walkthrough");
    let mut wizard = UploadWizard::new();
    if let Err(err) = wizard.select_file(synthetic_file("blank.pdf", 0)) {
        println!("- Empty file rejected: {err} (step {})", wizard.step().label());
    }

    if let Some(satisfied) = report.satisfied.iter().next() {
        let mut wizard = UploadWizard::new();
        let outcome = wizard
            .select_file(synthetic_file("duplicate.pdf", 2048))
            .and_then(|_| {
                wizard.submit(
                    &Disposition::Missing {
                        requirement_id: satisfied.clone(),
                    },
                    &report.missing,
                    &[],
                )
            });
        if let Err(err) = outcome {
            println!("- Stale choice for '{satisfied}' rejected: {err}");
        }
        if let UploadStep::Categorizing {
            last_error: Some(error),
            ..
        } = wizard.step()
        {
            println!("  Wizard kept the file for re-categorization ({})", error.code());
        }
    }

    let mut filed = 0usize;
    loop {
        let loan = match store_snapshot(&service, &store) {
            Some(loan) => loan,
            None => return Ok(()),
        };
        let Some(next) = loan.report.required_missing().next().cloned() else {
            break;
        };

        let file = synthetic_file(&format!("{}.pdf", next.id), 4096 + filed as u64 * 512);
        let mut wizard = UploadWizard::new();
        let choice = Disposition::Missing {
            requirement_id: next.id.clone(),
        };
        let staged = wizard
            .select_file(file.clone())
            .and_then(|_| wizard.submit(&choice, &loan.report.missing, &loan.documents));
        if let Err(err) = staged {
            println!("- {} could not be staged: {err}", next.name);
            break;
        }

        match service.upload(DEMO_LOAN_ID, &choice, &file) {
            Ok(outcome) => {
                let document_id = outcome.document.id.0.clone();
                let summary = outcome.report.summary();
                if wizard.complete(outcome.document).is_ok() {
                    filed += 1;
                    println!(
                        "- Filed {} as {} ({} of {} required satisfied)",
                        next.name, document_id, summary.required_satisfied, summary.required_total
                    );
                }
            }
            Err(err) => {
                let _ = wizard.fail(err.to_string());
                println!("- Upload for {} failed: {err}", next.name);
                break;
            }
        }
    }

    let replacement = Disposition::Existing {
        document_id: DocumentId("seed-03".to_string()),
    };
    match service.upload(
        DEMO_LOAN_ID,
        &replacement,
        &synthetic_file("Statements Q2.pdf", 1_310_720),
    ) {
        Ok(outcome) => println!(
            "- Replaced {} with {}",
            outcome.document.id.0, outcome.document.name
        ),
        Err(err) => println!("- Replacement rejected: {err}"),
    }

    println!("\nFinal package");
    if let Ok(report) = service.completeness(DEMO_LOAN_ID) {
        render_report(&args.funder, &report);
    }
    for alert in alerts.events() {
        println!(
            "Alert '{}' for {} ({} requirements satisfied)",
            alert.template,
            alert.loan_id,
            alert
                .details
                .get("satisfied")
                .map(String::as_str)
                .unwrap_or("?")
        );
    }

    Ok(())
}

struct LoanSnapshot {
    documents: Vec<DocumentRecord>,
    report: CompletenessReport,
}

fn store_snapshot(
    service: &LoanDocumentService<InMemoryLoanStore, InMemoryAlertPublisher>,
    store: &InMemoryLoanStore,
) -> Option<LoanSnapshot> {
    let report = service.completeness(DEMO_LOAN_ID).ok()?;
    let loan = store.fetch(DEMO_LOAN_ID).ok()??;
    Some(LoanSnapshot {
        documents: loan.documents,
        report,
    })
}

fn synthetic_file(name: &str, size: u64) -> FileMeta {
    FileMeta {
        name: name.to_string(),
        size,
        mime_type: None,
    }
}

fn render_report(funder: &str, report: &CompletenessReport) {
    let summary = report.summary();
    let funder = if funder.trim().is_empty() {
        "base package"
    } else {
        funder
    };

    println!(
        "Completeness for {funder}: {}/{} required ({:.0}%){}",
        summary.required_satisfied,
        summary.required_total,
        summary.completion_pct * 100.0,
        if summary.complete { " - complete" } else { "" }
    );
    println!("By category:");
    for entry in &summary.category_progress {
        println!(
            "  - {}: {}/{}",
            entry.category_label, entry.satisfied, entry.required
        );
    }

    if !summary.missing.is_empty() {
        println!("Missing:");
        for missing in &summary.missing {
            println!(
                "  - {} ({}{})",
                missing.name,
                if missing.required { "required" } else { "optional" },
                if missing.funder_specific {
                    ", funder-specific"
                } else {
                    ""
                }
            );
        }
    }

    if !summary.extra.is_empty() {
        println!("Other documents:");
        for extra in &summary.extra {
            println!("  - {} [{}] {}", extra.document_id, extra.category, extra.name);
        }
    }
}
