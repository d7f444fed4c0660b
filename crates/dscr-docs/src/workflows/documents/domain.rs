use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed grouping for every requirement a funder can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    BorrowerEntity,
    Financials,
    Property,
    Appraisal,
    Insurance,
    Title,
    Payoff,
    LenderSpecific,
}

impl RequirementCategory {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::BorrowerEntity,
            Self::Financials,
            Self::Property,
            Self::Appraisal,
            Self::Insurance,
            Self::Title,
            Self::Payoff,
            Self::LenderSpecific,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::BorrowerEntity => "Borrower & Entity",
            Self::Financials => "Financials",
            Self::Property => "Property",
            Self::Appraisal => "Appraisal",
            Self::Insurance => "Insurance",
            Self::Title => "Title",
            Self::Payoff => "Payoff",
            Self::LenderSpecific => "Lender Specific",
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::BorrowerEntity => "borrower_entity",
            Self::Financials => "financials",
            Self::Property => "property",
            Self::Appraisal => "appraisal",
            Self::Insurance => "insurance",
            Self::Title => "title",
            Self::Payoff => "payoff",
            Self::LenderSpecific => "lender_specific",
        }
    }

    /// Parse a snake_case tag, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|category| category.tag() == normalized)
    }
}

/// A single document a funder mandates or optionally accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub id: String,
    pub name: String,
    pub required: bool,
    pub category: RequirementCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub funder_specific: bool,
}

impl RequirementDefinition {
    pub fn required(id: &str, name: &str, category: RequirementCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            required: true,
            category,
            description: None,
            funder_specific: false,
        }
    }

    pub fn optional(id: &str, name: &str, category: RequirementCategory) -> Self {
        Self {
            required: false,
            ..Self::required(id, name, category)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Identifier wrapper for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Metadata for a document already attached to a loan.
///
/// `category` is free text: it usually carries a requirement id, but any
/// processor-chosen label is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Metadata describing a file the processor just uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileMeta {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
