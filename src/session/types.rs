//! Attribute records produced by the session's namespace listing.

use serde::{Deserialize, Serialize};

/// Number of comma-separated fields in a well-formed attribute record.
const RECORD_FIELDS: usize = 4;

/// One member of a namespace, as reported by the generic introspection feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Member name, unique within one listing.
    pub name: String,
    /// Member kind (`function`, `module`, `variable`, ...).
    pub kind: String,
    /// Name of the member's runtime type.
    pub type_name: String,
    /// Short representation of the member's value.
    pub repr: String,
}

impl AttributeDescriptor {
    /// Parses a `"name,kind,type,repr"` record.
    ///
    /// Only the first three commas separate fields, so a repr such as
    /// `(1, 2)` survives intact. Returns `None` for records with fewer than
    /// four fields.
    pub fn parse(record: &str) -> Option<Self> {
        let parts: Vec<&str> = record.splitn(RECORD_FIELDS, ',').collect();
        if parts.len() < RECORD_FIELDS {
            return None;
        }
        Some(Self {
            name: parts[0].to_string(),
            kind: parts[1].to_string(),
            type_name: parts[2].to_string(),
            repr: parts[3].to_string(),
        })
    }
}

/// Parses a listing, silently dropping malformed records.
pub fn parse_listing<I, S>(records: I) -> Vec<AttributeDescriptor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    records
        .into_iter()
        .filter_map(|record| AttributeDescriptor::parse(record.as_ref()))
        .collect()
}
