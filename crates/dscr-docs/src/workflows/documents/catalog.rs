use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use super::domain::{RequirementCategory, RequirementDefinition};

/// Errors raised while loading a catalog from configuration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read requirement catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid requirement catalog document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("requirement '{requirement_id}' uses unknown category '{category}'")]
    UnknownCategory {
        requirement_id: String,
        category: String,
    },
    #[error("requirement at position {position} in '{scope}' has a blank id")]
    BlankId { scope: String, position: usize },
    #[error("requirement id '{id}' appears more than once in '{scope}'")]
    DuplicateId { scope: String, id: String },
    #[error("funder key '{0}' is blank or declared more than once")]
    InvalidFunderKey(String),
}

/// Immutable per-funder requirement tables.
///
/// Built once at startup and shared by reference; every funder list is the
/// base set followed by that funder's additions.
#[derive(Debug, Clone)]
pub struct RequirementCatalog {
    base: Vec<RequirementDefinition>,
    funders: BTreeMap<String, Vec<RequirementDefinition>>,
}

impl RequirementCatalog {
    /// Build a catalog from a base set and raw funder additions.
    pub fn new<K, I>(base: Vec<RequirementDefinition>, additions: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Vec<RequirementDefinition>)>,
    {
        let funders = additions
            .into_iter()
            .map(|(key, extra)| (normalize_funder_key(key.as_ref()), compose(&base, extra)))
            .collect();

        Self { base, funders }
    }

    /// The built-in DSCR catalog.
    pub fn standard() -> Self {
        Self::new(
            base_requirements(),
            [
                ("kiavi", kiavi_additions()),
                ("visio", visio_additions()),
                ("lima_one", lima_one_additions()),
                ("roc_capital", roc_capital_additions()),
            ],
        )
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(file)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;

        let base = convert_definitions("base", document.base)?;
        let mut additions = Vec::with_capacity(document.funders.len());
        let mut seen_keys = HashSet::new();
        for (key, raw) in document.funders {
            let normalized = normalize_funder_key(&key);
            if normalized.is_empty() || !seen_keys.insert(normalized.clone()) {
                return Err(CatalogError::InvalidFunderKey(key));
            }
            additions.push((normalized.clone(), convert_definitions(&normalized, raw)?));
        }

        Ok(Self::new(base, additions))
    }

    /// Effective requirement list for a funder.
    ///
    /// Unknown or blank keys fall back to the base set. The returned vector is
    /// an independent copy.
    pub fn resolve(&self, funder_key: &str) -> Vec<RequirementDefinition> {
        let normalized = normalize_funder_key(funder_key);
        match self.funders.get(&normalized) {
            Some(requirements) => requirements.clone(),
            None => {
                debug!(funder = %normalized, "unknown funder, resolving base requirements");
                self.base.clone()
            }
        }
    }

    pub fn is_known_funder(&self, funder_key: &str) -> bool {
        self.funders.contains_key(&normalize_funder_key(funder_key))
    }

    pub fn funders(&self) -> Vec<&str> {
        self.funders.keys().map(String::as_str).collect()
    }

    pub fn base(&self) -> &[RequirementDefinition] {
        &self.base
    }
}

impl Default for RequirementCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Append funder additions to the base set.
///
/// Additions are marked funder-specific; an addition reusing a base id is
/// dropped so ids stay unique and the base is never shadowed.
pub fn compose(
    base: &[RequirementDefinition],
    additions: Vec<RequirementDefinition>,
) -> Vec<RequirementDefinition> {
    let mut ids: HashSet<String> = base.iter().map(|req| req.id.clone()).collect();
    let mut composed = base.to_vec();

    for mut addition in additions {
        if !ids.insert(addition.id.clone()) {
            warn!(
                requirement = %addition.id,
                "funder addition duplicates an existing id, skipping"
            );
            continue;
        }
        addition.funder_specific = true;
        composed.push(addition);
    }

    composed
}

pub(crate) fn normalize_funder_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    base: Vec<RawRequirement>,
    #[serde(default, deserialize_with = "funder_entries")]
    funders: Vec<(String, Vec<RawRequirement>)>,
}

/// Keeps every `funders` entry in document order, repeated keys included.
fn funder_entries<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<RawRequirement>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FunderEntries;

    impl<'de> Visitor<'de> for FunderEntries {
        type Value = Vec<(String, Vec<RawRequirement>)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of funder keys to requirement lists")
        }

        fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(FunderEntries)
}

#[derive(Debug, Deserialize)]
struct RawRequirement {
    id: String,
    name: String,
    #[serde(default = "default_required")]
    required: bool,
    category: String,
    #[serde(default)]
    description: Option<String>,
}

fn default_required() -> bool {
    true
}

fn convert_definitions(
    scope: &str,
    raw: Vec<RawRequirement>,
) -> Result<Vec<RequirementDefinition>, CatalogError> {
    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(raw.len());

    for (position, requirement) in raw.into_iter().enumerate() {
        let id = requirement.id.trim().to_string();
        if id.is_empty() {
            return Err(CatalogError::BlankId {
                scope: scope.to_string(),
                position,
            });
        }
        if !seen.insert(id.clone()) {
            return Err(CatalogError::DuplicateId {
                scope: scope.to_string(),
                id,
            });
        }

        let category = RequirementCategory::parse(&requirement.category).ok_or_else(|| {
            CatalogError::UnknownCategory {
                requirement_id: id.clone(),
                category: requirement.category.clone(),
            }
        })?;

        definitions.push(RequirementDefinition {
            id,
            name: requirement.name,
            required: requirement.required,
            category,
            description: requirement
                .description
                .filter(|text| !text.trim().is_empty()),
            funder_specific: false,
        });
    }

    Ok(definitions)
}

fn base_requirements() -> Vec<RequirementDefinition> {
    use RequirementCategory::*;

    vec![
        RequirementDefinition::required("drivers_license", "Driver's License", BorrowerEntity)
            .with_description("Government-issued photo ID for every guarantor."),
        RequirementDefinition::required(
            "articles_org",
            "Articles of Organization",
            BorrowerEntity,
        ),
        RequirementDefinition::required(
            "operating_agreement",
            "Operating Agreement",
            BorrowerEntity,
        ),
        RequirementDefinition::required(
            "good_standing",
            "Certificate of Good Standing",
            BorrowerEntity,
        )
        .with_description("Issued by the state of formation within the last 90 days."),
        RequirementDefinition::required("ein_letter", "EIN Letter", BorrowerEntity),
        RequirementDefinition::required("bank_statements", "Bank Statements", Financials)
            .with_description("Two most recent months for every account used for reserves."),
        RequirementDefinition::required("voided_check", "Voided Check", Financials),
        RequirementDefinition::required(
            "property_ownership",
            "Proof of Property Ownership",
            Property,
        ),
        RequirementDefinition::required("current_leases", "Current Leases", Property)
            .with_description(
                "Required for occupied units; month-to-month tenants need a rent ledger.",
            ),
        RequirementDefinition::optional("hoa_contact", "HOA Contact", Property)
            .with_description("Condominiums and PUDs only."),
        RequirementDefinition::required("appraisal", "Appraisal", Appraisal),
        RequirementDefinition::required("insurance_policy", "Insurance Policy", Insurance),
        RequirementDefinition::required("insurance_contact", "Insurance Agent Contact", Insurance),
        RequirementDefinition::required("title_contact", "Title Company Contact", Title),
        RequirementDefinition::optional("payoff_letter", "Payoff Letter", Payoff)
            .with_description("Refinances only: payoff statement from the current lender."),
    ]
}

fn kiavi_additions() -> Vec<RequirementDefinition> {
    vec![
        RequirementDefinition::required(
            "kiavi_auth_form",
            "Kiavi Borrower Authorization Form",
            RequirementCategory::LenderSpecific,
        ),
        RequirementDefinition::required(
            "kiavi_disclosure",
            "Kiavi Borrower Disclosure",
            RequirementCategory::LenderSpecific,
        ),
    ]
}

fn visio_additions() -> Vec<RequirementDefinition> {
    vec![
        RequirementDefinition::required(
            "visio_term_sheet",
            "Signed Visio Term Sheet",
            RequirementCategory::LenderSpecific,
        ),
        RequirementDefinition::required(
            "visio_rent_schedule",
            "Appraisal Rent Schedule (Form 1007)",
            RequirementCategory::Appraisal,
        ),
        RequirementDefinition::optional(
            "visio_reo_schedule",
            "Schedule of Real Estate Owned",
            RequirementCategory::Financials,
        )
        .with_description("Requested when the borrower holds more than four financed properties."),
    ]
}

fn lima_one_additions() -> Vec<RequirementDefinition> {
    vec![
        RequirementDefinition::required(
            "lima_one_application",
            "Lima One Loan Application",
            RequirementCategory::LenderSpecific,
        ),
        RequirementDefinition::required(
            "lima_one_credit_auth",
            "Lima One Credit Authorization",
            RequirementCategory::LenderSpecific,
        ),
        RequirementDefinition::optional(
            "lima_one_track_record",
            "Investment Track Record",
            RequirementCategory::Financials,
        ),
    ]
}

fn roc_capital_additions() -> Vec<RequirementDefinition> {
    vec![
        RequirementDefinition::required(
            "roc_background_auth",
            "Background & Credit Authorization",
            RequirementCategory::LenderSpecific,
        ),
        RequirementDefinition::required(
            "roc_entity_certificate",
            "Certificate of Entity Authority",
            RequirementCategory::BorrowerEntity,
        ),
    ]
}
