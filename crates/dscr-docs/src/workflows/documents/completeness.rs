use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use super::domain::{DocumentRecord, RequirementCategory, RequirementDefinition};

/// Required-requirement progress for one category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub satisfied_count: usize,
    pub required_count: usize,
}

/// Satisfied / missing / extra breakdown of a loan's documents.
///
/// Derived on demand and never stored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub satisfied: BTreeSet<String>,
    pub missing: Vec<RequirementDefinition>,
    pub extra: Vec<DocumentRecord>,
    pub by_category: BTreeMap<RequirementCategory, CategoryProgress>,
}

/// Reconcile a document collection against a resolved requirement list.
///
/// A document satisfies a requirement when its category equals the
/// requirement id exactly. Documents matching no requirement land in `extra`.
pub fn compute_completeness(
    requirements: &[RequirementDefinition],
    documents: &[DocumentRecord],
) -> CompletenessReport {
    let present: HashSet<&str> = documents.iter().map(|doc| doc.category.as_str()).collect();
    let requirement_ids: HashSet<&str> = requirements.iter().map(|req| req.id.as_str()).collect();

    let mut report = CompletenessReport::default();
    let mut optional_missing = Vec::new();

    for requirement in requirements {
        let satisfied = present.contains(requirement.id.as_str());

        let progress = report.by_category.entry(requirement.category).or_default();
        if requirement.required {
            progress.required_count += 1;
            if satisfied {
                progress.satisfied_count += 1;
            }
        }

        if satisfied {
            report.satisfied.insert(requirement.id.clone());
        } else if requirement.required {
            report.missing.push(requirement.clone());
        } else {
            optional_missing.push(requirement.clone());
        }
    }

    report.missing.extend(optional_missing);
    report.extra = documents
        .iter()
        .filter(|doc| !requirement_ids.contains(doc.category.as_str()))
        .cloned()
        .collect();

    report
}

impl CompletenessReport {
    /// True once no required requirement is missing.
    pub fn is_complete(&self) -> bool {
        self.missing.iter().all(|requirement| !requirement.required)
    }

    pub fn required_missing(&self) -> impl Iterator<Item = &RequirementDefinition> {
        self.missing.iter().filter(|requirement| requirement.required)
    }

    pub fn is_missing(&self, requirement_id: &str) -> bool {
        self.missing
            .iter()
            .any(|requirement| requirement.id == requirement_id)
    }

    pub fn summary(&self) -> CompletenessSummary {
        let category_progress: Vec<CategoryProgressEntry> = RequirementCategory::ordered()
            .into_iter()
            .filter_map(|category| {
                self.by_category
                    .get(&category)
                    .map(|progress| CategoryProgressEntry {
                        category,
                        category_label: category.label(),
                        satisfied: progress.satisfied_count,
                        required: progress.required_count,
                    })
            })
            .collect();

        let required_total: usize = category_progress.iter().map(|entry| entry.required).sum();
        let required_satisfied: usize =
            category_progress.iter().map(|entry| entry.satisfied).sum();
        let completion_pct = if required_total == 0 {
            1.0
        } else {
            required_satisfied as f32 / required_total as f32
        };

        let missing = self
            .missing
            .iter()
            .map(|requirement| MissingRequirementView {
                id: requirement.id.clone(),
                name: requirement.name.clone(),
                required: requirement.required,
                category: requirement.category,
                category_label: requirement.category.label(),
                description: requirement.description.clone(),
                funder_specific: requirement.funder_specific,
            })
            .collect();

        let extra = self
            .extra
            .iter()
            .map(|document| ExtraDocumentView {
                document_id: document.id.0.clone(),
                name: document.name.clone(),
                category: document.category.clone(),
            })
            .collect();

        CompletenessSummary {
            complete: self.is_complete(),
            required_satisfied,
            required_total,
            completion_pct,
            category_progress,
            missing,
            extra,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryProgressEntry {
    pub category: RequirementCategory,
    pub category_label: &'static str,
    pub satisfied: usize,
    pub required: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingRequirementView {
    pub id: String,
    pub name: String,
    pub required: bool,
    pub category: RequirementCategory,
    pub category_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub funder_specific: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtraDocumentView {
    pub document_id: String,
    pub name: String,
    pub category: String,
}

/// Display-ready progress for the package checklist.
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessSummary {
    pub complete: bool,
    pub required_satisfied: usize,
    pub required_total: usize,
    pub completion_pct: f32,
    pub category_progress: Vec<CategoryProgressEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingRequirementView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ExtraDocumentView>,
}
