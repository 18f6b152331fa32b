//! MCP tool parameter definitions.
//!
//! Each tool exposed by [`super::UnoWorkspace`] that takes input has its
//! parameter struct here.
//!
//! # Available Tools
//!
//! - `navigate` - Show the members of a namespace path
//! - `ascend` - Go to the parent path
//! - `open_member` - Descend into a member of the current path
//! - `list_members` - Show the current path again
//! - `describe_member` - Documentation for a member of the current path
//! - `navigation_history` - Previously visited paths
//! - `search_links` - External search URLs for a name

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `navigate` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// Dotted attribute path; empty for the namespace root.
    #[serde(default)]
    #[schemars(
        description = "Dotted attribute path to inspect, e.g. `doc.Text` or `doc.Sheets[0]`. Empty string for the namespace root."
    )]
    pub path: String,
}

/// Parameters for the `open_member` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenMemberParams {
    /// Member of the current path to open.
    #[schemars(description = "Name of a member of the current path, or a subscript like `[0]`")]
    pub member: String,
    /// Call arguments for methods that require them.
    #[schemars(
        description = "Argument source for methods whose signature requires arguments, e.g. `'Sheet1'`"
    )]
    pub arguments: Option<String>,
}

/// Parameters for the `describe_member` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescribeMemberParams {
    /// Member of the current path to document.
    #[schemars(description = "Name of a member of the current path")]
    pub name: String,
}

/// Parameters for the `search_links` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchLinksParams {
    /// Name or dotted path to search for; only the last component is used.
    #[schemars(description = "Member name or dotted path; the last component is searched")]
    pub name: String,
}
