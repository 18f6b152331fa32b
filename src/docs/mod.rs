//! Documentation lookup for namespace members.
//!
//! - [`corpus`] - read-only SQLite reference corpus
//! - [`rules`] - ordered applicability rules for corpus rows
//! - [`render`] - keyword emphasis and markup
//! - [`resolver`] - corpus vs. live doc string resolution
//!
//! External search links for a member are built from a [`SearchLink`]
//! template.

pub mod corpus;
pub mod render;
pub mod resolver;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use corpus::{DocumentationRecord, ReferenceCorpus};
pub use render::Markup;
pub use resolver::{DocumentationResolver, Resolution, ResolveRequest};

/// An external search URL: `prefix + name + suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    /// Text before the searched name.
    pub prefix: String,
    /// Text after the searched name.
    #[serde(default)]
    pub suffix: String,
}

impl SearchLink {
    /// Creates a search link template.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// The search URL for `name`.
    pub fn url(&self, name: &str) -> String {
        format!("{}{name}{}", self.prefix, self.suffix)
    }
}
