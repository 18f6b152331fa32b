//! Structured dump written by the companion inspector.
//!
//! The inspector running inside the session writes a JSON object to a known
//! file: one entry per member (`type`, `repr`, `desc`), plus synthetic
//! collection keys listing the items reachable through the container
//! interfaces. The file is supplementary metadata and may be stale, empty,
//! missing or half-written; reading it never fails.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Contents of a freshly reset dump file.
const EMPTY_DUMP: &str = "{}";

/// Synthetic key listing items reachable via `getByName`.
pub const BY_NAME: &str = "getByName";
/// Synthetic key listing items reachable via `getByIndex`.
pub const BY_INDEX: &str = "getByIndex";
/// Synthetic key listing items reachable via `createEnumeration`.
pub const ENUMERATION: &str = "createEnumeration";
/// Synthetic key telling whether the object has a current selection.
pub const CURRENT_SELECTION: &str = "getCurrentSelection";

/// Fields describing a member entry.
const MEMBER_FIELDS: [&str; 3] = ["type", "repr", "desc"];

/// Per-member metadata from the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEntry {
    /// Member name.
    pub name: String,
    /// Type name as the inspector sees it.
    pub type_name: String,
    /// Value representation.
    pub repr: String,
    /// Classification, e.g. `uno method` or `python attribute`.
    pub desc: String,
}

impl DumpEntry {
    fn from_object(name: &str, object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key).map(value_text).unwrap_or_default();
        Self {
            name: name.to_string(),
            type_name: field("type"),
            repr: field("repr"),
            desc: field("desc"),
        }
    }
}

/// Item listings for the container interfaces of the inspected object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionListing {
    /// Names accepted by `getByName`.
    pub by_name: Vec<String>,
    /// Indices accepted by `getByIndex`.
    pub by_index: Vec<String>,
    /// Items produced by `createEnumeration`.
    pub enumeration: Vec<String>,
    /// Whether `getCurrentSelection` yields something.
    pub has_selection: bool,
}

impl CollectionListing {
    /// Returns true when no container interface has anything to offer.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
            && self.by_index.is_empty()
            && self.enumeration.is_empty()
            && !self.has_selection
    }
}

/// The parsed dump: member entries plus collection listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredDump {
    entries: BTreeMap<String, DumpEntry>,
    collections: CollectionListing,
}

impl StructuredDump {
    /// Parses dump text. Anything that is not a JSON object yields an empty
    /// dump.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => Self::from_object(&object),
            Ok(_) => {
                debug!("structured dump is not a JSON object");
                Self::default()
            }
            Err(e) => {
                debug!(error = %e, "structured dump is not valid JSON");
                Self::default()
            }
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let mut dump = Self::default();
        for (key, value) in object {
            let collection_key = match key.as_str() {
                BY_NAME => {
                    dump.collections.by_name = items(value);
                    true
                }
                BY_INDEX => {
                    dump.collections.by_index = items(value);
                    true
                }
                ENUMERATION => {
                    dump.collections.enumeration = items(value);
                    true
                }
                CURRENT_SELECTION => {
                    dump.collections.has_selection = truthy(value);
                    true
                }
                _ => false,
            };
            let Value::Object(fields) = value else {
                continue;
            };
            // Container keys are real members too; they get an entry when
            // the inspector described them.
            if !collection_key || MEMBER_FIELDS.iter().any(|f| fields.contains_key(*f)) {
                dump.entries
                    .insert(key.clone(), DumpEntry::from_object(key, fields));
            }
        }
        dump
    }

    /// Looks up a member entry.
    pub fn entry(&self, name: &str) -> Option<&DumpEntry> {
        self.entries.get(name)
    }

    /// Iterates over member entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &DumpEntry> {
        self.entries.values()
    }

    /// Returns the container item listings.
    pub fn collections(&self) -> &CollectionListing {
        &self.collections
    }

    /// Number of member entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the dump has neither entries nor collections.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.collections.is_empty()
    }
}

impl FromIterator<DumpEntry> for StructuredDump {
    fn from_iter<T: IntoIterator<Item = DumpEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.name.clone(), e)).collect(),
            collections: CollectionListing::default(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn items(value: &Value) -> Vec<String> {
    value
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(value_text).collect())
        .unwrap_or_default()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Reads and resets the dump file at its known location.
#[derive(Debug, Clone)]
pub struct DumpReader {
    path: PathBuf,
}

impl DumpReader {
    /// Creates a reader for the dump file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the latest dump. Missing or malformed files yield an empty dump.
    pub async fn read_latest(&self) -> StructuredDump {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => StructuredDump::parse(&text),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "structured dump unavailable");
                StructuredDump::default()
            }
        }
    }

    /// Truncates the dump file to an empty object.
    /// ## Errors
    pub async fn reset(&self) -> io::Result<()> {
        tokio::fs::write(&self.path, EMPTY_DUMP).await
    }

    /// Creates an empty dump file if none exists yet.
    /// ## Errors
    pub async fn ensure_exists(&self) -> io::Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "getText": {"type": "uno method", "repr": "( )", "desc": "uno method"},
        "Count": {"type": "long", "repr": 3, "desc": "uno property"},
        "__class__": {"type": "type", "repr": "<class 'pyuno'>", "desc": "python attribute"},
        "getByName": {"items": ["Sheet1", "Sheet2"]},
        "getByIndex": {"items": [0, 1]},
        "createEnumeration": {"items": []},
        "getCurrentSelection": true
    }"#;

    #[test]
    fn test_parse_entries_and_collections() {
        let dump = StructuredDump::parse(SAMPLE);
        assert_eq!(dump.len(), 3);

        let entry = dump.entry("getText").unwrap();
        assert_eq!(entry.desc, "uno method");
        assert_eq!(entry.repr, "( )");
        // Non-string values keep their JSON text.
        assert_eq!(dump.entry("Count").unwrap().repr, "3");

        let collections = dump.collections();
        assert_eq!(collections.by_name, vec!["Sheet1", "Sheet2"]);
        assert_eq!(collections.by_index, vec!["0", "1"]);
        assert!(collections.enumeration.is_empty());
        assert!(collections.has_selection);
        assert!(dump.entry("getByName").is_none());
    }

    #[test]
    fn test_container_member_keeps_entry_and_items() {
        let dump = StructuredDump::parse(
            r#"{"getByName": {"type": "any", "repr": "( [in] string aName )", "desc": "uno method", "items": ["Sheet1"]},
                "getByIndex": {"type": "any", "repr": "( [in] long Index )", "desc": "uno method"}}"#,
        );

        let entry = dump.entry("getByName").unwrap();
        assert_eq!(entry.desc, "uno method");
        assert_eq!(entry.repr, "( [in] string aName )");
        assert_eq!(dump.collections().by_name, vec!["Sheet1"]);

        assert_eq!(dump.entry("getByIndex").unwrap().type_name, "any");
        assert!(dump.collections().by_index.is_empty());
        assert_eq!(dump.len(), 2);
    }

    #[test]
    fn test_malformed_dump_is_empty() {
        assert!(StructuredDump::parse("").is_empty());
        assert!(StructuredDump::parse("{\"half\": ").is_empty());
        assert!(StructuredDump::parse("[1, 2]").is_empty());
        assert!(StructuredDump::parse("{}").is_empty());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let dump = StructuredDump::parse(r#"{"x": {"type": "int"}}"#);
        let entry = dump.entry("x").unwrap();
        assert_eq!(entry.type_name, "int");
        assert_eq!(entry.desc, "");
    }

    #[tokio::test]
    async fn test_reader_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let reader = DumpReader::new(dir.path().join("result.txt"));
        assert!(reader.read_latest().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_and_ensure_exists() {
        let dir = tempfile::tempdir().unwrap();
        let reader = DumpReader::new(dir.path().join("result.txt"));

        reader.ensure_exists().await.unwrap();
        assert_eq!(std::fs::read_to_string(reader.path()).unwrap(), "{}");

        std::fs::write(reader.path(), SAMPLE).unwrap();
        reader.ensure_exists().await.unwrap();
        assert_eq!(reader.read_latest().await.len(), 3);

        reader.reset().await.unwrap();
        assert!(reader.read_latest().await.is_empty());
    }
}
