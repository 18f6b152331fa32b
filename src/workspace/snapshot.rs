//! Consolidated namespace snapshots.
//!
//! A snapshot joins the generic attribute listing of one path with the
//! inspector's structured dump for the same path. Snapshots are immutable;
//! every navigation produces a new one.

use serde::Serialize;

use crate::error::WorkspaceError;
use crate::session::types::AttributeDescriptor;

use super::dump::{CollectionListing, DumpEntry, StructuredDump};

/// Repr marker for UNO objects.
pub const UNO_OBJECT_REPR: &str = "pyuno object";

/// Member that carries the inspected object's implementation name.
const IMPLEMENTATION_NAME: &str = "ImplementationName";

/// Hidden-kind entry that also hides `_`-prefixed members.
const PRIVATE_KIND: &str = "private";

/// Repr the inspector reports for a method taking no arguments.
const NO_ARGUMENTS: &str = "( )";

/// Everything known about one namespace path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceSnapshot {
    path: String,
    generation: u64,
    attributes: Vec<AttributeDescriptor>,
    dump: StructuredDump,
}

impl NamespaceSnapshot {
    /// Assembles a snapshot from the listing and the dump of one navigation.
    pub fn new(
        path: impl Into<String>,
        generation: u64,
        attributes: Vec<AttributeDescriptor>,
        dump: StructuredDump,
    ) -> Self {
        Self {
            path: path.into(),
            generation,
            attributes,
            dump,
        }
    }

    /// An empty snapshot, as published when there is no session.
    pub fn empty(path: impl Into<String>, generation: u64) -> Self {
        Self::new(path, generation, Vec::new(), StructuredDump::default())
    }

    /// The namespace path this snapshot describes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The navigation generation that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The generic attribute listing.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// The inspector's structured dump.
    pub fn dump(&self) -> &StructuredDump {
        &self.dump
    }

    /// Looks up the dump entry for a member.
    pub fn dump_entry(&self, name: &str) -> Option<&DumpEntry> {
        self.dump.entry(name)
    }

    /// Container item listings of the inspected object.
    pub fn collections(&self) -> &CollectionListing {
        self.dump.collections()
    }

    /// Returns the merged view of every member that passes `filter`.
    pub fn members(&self, filter: &MemberFilter) -> Vec<MemberView> {
        self.attributes
            .iter()
            .filter(|attr| filter.accepts(attr))
            .map(|attr| MemberView::merge(attr, self.dump.entry(&attr.name)))
            .collect()
    }

    /// Returns the merged view of one member, ignoring filters.
    pub fn member(&self, name: &str) -> Option<MemberView> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| MemberView::merge(attr, self.dump.entry(name)))
    }

    /// The inspected object's implementation name, when it exposes one.
    pub fn implementation_name(&self) -> Option<String> {
        self.member(IMPLEMENTATION_NAME).map(|m| m.repr)
    }

    /// Returns true when the snapshot has no members at all.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Which members to hide from listings.
#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    hidden_kinds: Vec<String>,
}

impl MemberFilter {
    /// Hides members whose kind is listed; `private` also hides `_` names.
    pub fn new(hidden_kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hidden_kinds: hidden_kinds.into_iter().map(Into::into).collect(),
        }
    }

    fn accepts(&self, attr: &AttributeDescriptor) -> bool {
        if self.hidden_kinds.iter().any(|k| *k == attr.kind) {
            return false;
        }
        !(attr.name.starts_with('_') && self.hidden_kinds.iter().any(|k| k == PRIVATE_KIND))
    }
}

/// A member as presented: type and repr preferring the inspector's view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    /// Member name.
    pub name: String,
    /// Member kind from the generic listing.
    pub kind: String,
    /// Type name, from the dump when available.
    pub type_name: String,
    /// Repr, from the dump when available, with UNO object reprs collapsed.
    pub repr: String,
}

impl MemberView {
    fn merge(attr: &AttributeDescriptor, entry: Option<&DumpEntry>) -> Self {
        let (type_name, repr) = match entry {
            Some(entry) => (entry.type_name.clone(), entry.repr.clone()),
            None => (attr.type_name.clone(), attr.repr.clone()),
        };
        let repr = if repr.starts_with("pyuno object (") {
            UNO_OBJECT_REPR.to_string()
        } else {
            repr
        };
        Self {
            name: attr.name.clone(),
            kind: attr.kind.clone(),
            type_name,
            repr,
        }
    }

    /// Computes the path component that opens this member.
    ///
    /// Methods (lowercase names) are called: `( )` means no arguments,
    /// a longer parenthesized repr lists required arguments. A struct's raw
    /// `value` cannot be opened further. Returns `Ok(None)` when there is
    /// nothing to open.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::MissingArguments`] when the method needs
    /// arguments and `arguments` is empty or absent.
    pub fn access_component(&self, arguments: Option<&str>) -> Result<Option<String>, WorkspaceError> {
        let callable = self.name.chars().next().is_some_and(char::is_lowercase);
        if !callable {
            return Ok(Some(self.name.clone()));
        }
        if self.name == "value" && matches!(self.type_name.as_str(), "pyuno.struct" | "struct") {
            return Ok(None);
        }
        if self.repr == NO_ARGUMENTS {
            return Ok(Some(format!("{}()", self.name)));
        }
        if self.repr.starts_with('(') && self.repr.chars().count() > 3 {
            return match arguments.map(str::trim).filter(|a| !a.is_empty()) {
                Some(args) => Ok(Some(format!("{}({args})", self.name))),
                None => Err(WorkspaceError::MissingArguments {
                    member: self.name.clone(),
                    signature: self.repr.clone(),
                }),
            };
        }
        Ok(Some(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::parse_listing;

    fn sample() -> NamespaceSnapshot {
        let attributes = parse_listing([
            "getText,function,pyuno,( )",
            "getByName,function,pyuno,(string)",
            "Text,variable,pyuno,pyuno object (com.sun.star.text.XText)0x7f",
            "ImplementationName,variable,str,SwXTextDocument",
            "_private,variable,int,1",
            "os,module,module,<module 'os'>",
            "broken",
        ]);
        let dump = StructuredDump::parse(
            r#"{"getText": {"type": "com.sun.star.text.XText", "repr": "( )", "desc": "uno method"}}"#,
        );
        NamespaceSnapshot::new("doc", 3, attributes, dump)
    }

    #[test]
    fn test_members_merge_dump_data() {
        let snapshot = sample();
        let members = snapshot.members(&MemberFilter::default());
        assert_eq!(members.len(), 6);

        let get_text = &members[0];
        assert_eq!(get_text.type_name, "com.sun.star.text.XText");

        let text = snapshot.member("Text").unwrap();
        assert_eq!(text.type_name, "pyuno");
        assert_eq!(text.repr, UNO_OBJECT_REPR);
    }

    #[test]
    fn test_filter_hides_kinds_and_private() {
        let snapshot = sample();
        let filter = MemberFilter::new(["module", "private"]);
        let names: Vec<_> = snapshot.members(&filter).into_iter().map(|m| m.name).collect();
        assert!(!names.contains(&"os".to_string()));
        assert!(!names.contains(&"_private".to_string()));
        assert!(names.contains(&"Text".to_string()));
    }

    #[test]
    fn test_implementation_name() {
        assert_eq!(sample().implementation_name().as_deref(), Some("SwXTextDocument"));
        assert!(NamespaceSnapshot::empty("", 0).implementation_name().is_none());
    }

    #[test]
    fn test_access_component() {
        let snapshot = sample();
        let get_text = snapshot.member("getText").unwrap();
        assert_eq!(get_text.access_component(None).unwrap().as_deref(), Some("getText()"));

        let by_name = snapshot.member("getByName").unwrap();
        assert!(matches!(
            by_name.access_component(None),
            Err(WorkspaceError::MissingArguments { .. })
        ));
        assert_eq!(
            by_name.access_component(Some("\"Sheet1\"")).unwrap().as_deref(),
            Some("getByName(\"Sheet1\")")
        );

        let text = snapshot.member("Text").unwrap();
        assert_eq!(text.access_component(None).unwrap().as_deref(), Some("Text"));

        let value = MemberView {
            name: "value".to_string(),
            kind: "variable".to_string(),
            type_name: "pyuno.struct".to_string(),
            repr: "<struct>".to_string(),
        };
        assert!(value.access_component(None).unwrap().is_none());
    }
}
