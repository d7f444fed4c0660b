use super::normalizer::normalize_category;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct ManifestRow {
    pub(crate) line: usize,
    pub(crate) document_id: String,
    pub(crate) category: String,
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) mime_type: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ManifestRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = record?;
        rows.push(ManifestRow {
            // header occupies line 1
            line: index + 2,
            document_id: raw.document_id.unwrap_or_default(),
            category: normalize_category(&raw.category),
            name: raw.name,
            size: raw.size.unwrap_or(0),
            mime_type: raw.mime_type,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(
        rename = "Document ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    document_id: Option<String>,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Size", default)]
    size: Option<u64>,
    #[serde(
        rename = "Mime Type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    mime_type: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
