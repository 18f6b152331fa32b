//! Namespace browsing for a live interpreter session.
//!
//! - [`path`] - dotted/bracketed attribute paths
//! - [`dump`] - the inspector's structured dump file
//! - [`snapshot`] - immutable joined view of one path
//! - [`history`] - visited paths on disk
//! - [`proxy`] - navigation and snapshot publication

pub mod dump;
pub mod history;
pub mod path;
pub mod proxy;
pub mod snapshot;

pub use dump::{DumpReader, StructuredDump};
pub use history::NavigationHistory;
pub use proxy::{InspectorCommand, IntrospectionProxy, PendingSnapshot};
pub use snapshot::{MemberFilter, MemberView, NamespaceSnapshot};
