//! MCP server implementation for uno-workspace.
//!
//! This module contains the `UnoWorkspace` struct that implements the MCP
//! server with namespace browsing and documentation tools for a live PyUNO
//! session.

use std::fmt::Write as _;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, ErrorCode, Implementation, ProtocolVersion, ServerCapabilities,
        ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use tracing::debug;

use crate::config::WorkspaceConfig;
use crate::docs::resolver::{DocumentationResolver, Resolution, ResolveRequest};
use crate::docs::SearchLink;
use crate::workspace::history::NavigationHistory;
use crate::workspace::path;
use crate::workspace::proxy::{IntrospectionProxy, PendingSnapshot};
use crate::workspace::snapshot::{MemberFilter, NamespaceSnapshot};

use super::tools::{DescribeMemberParams, NavigateParams, OpenMemberParams, SearchLinksParams};

/// MCP server for browsing a PyUNO session.
#[derive(Clone)]
pub struct UnoWorkspace {
    proxy: IntrospectionProxy,
    resolver: Arc<DocumentationResolver>,
    history: NavigationHistory,
    filter: MemberFilter,
    forum_search: SearchLink,
    snippet_search: SearchLink,
    #[allow(dead_code)]
    tool_router: ToolRouter<UnoWorkspace>,
}

impl UnoWorkspace {
    /// Creates the server around a proxy and a resolver, taking listing
    /// filters, history location and search links from `config`.
    pub fn new(
        proxy: IntrospectionProxy,
        resolver: DocumentationResolver,
        config: &WorkspaceConfig,
    ) -> Self {
        Self {
            proxy,
            resolver: Arc::new(resolver),
            history: NavigationHistory::new(config.history_path(), config.history_limit),
            filter: config.member_filter(),
            forum_search: config.forum_search.clone(),
            snippet_search: config.snippet_search.clone(),
            tool_router: Self::tool_router(),
        }
    }

    /// The proxy behind the navigation tools.
    pub fn proxy(&self) -> &IntrospectionProxy {
        &self.proxy
    }

    async fn settle(&self, pending: PendingSnapshot) -> Result<CallToolResult, McpError> {
        let snapshot = pending.wait().await.ok_or_else(|| {
            McpError::new(ErrorCode::INTERNAL_ERROR, "navigation task failed", None)
        })?;
        Ok(CallToolResult::success(vec![Content::text(format_snapshot(
            &snapshot,
            &self.filter,
        ))]))
    }
}

fn invalid_params(e: impl std::fmt::Display) -> McpError {
    McpError::new(ErrorCode::INVALID_PARAMS, e.to_string(), None)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

/// Escapes table cell text.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Formats a snapshot as a Markdown member table with collection listings.
pub fn format_snapshot(snapshot: &NamespaceSnapshot, filter: &MemberFilter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Path: `{}`", display_path(snapshot.path()));
    if let Some(name) = snapshot.implementation_name() {
        let _ = writeln!(out, "Implementation: {name}");
    }

    let members = snapshot.members(filter);
    if members.is_empty() {
        out.push_str("\nNo members available.\n");
    } else {
        out.push_str("\n| Name | Type | Repr |\n|---|---|---|\n");
        for member in &members {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                cell(&member.name),
                cell(&member.type_name),
                cell(&member.repr)
            );
        }
    }

    let collections = snapshot.collections();
    if !collections.is_empty() {
        out.push_str("\nCollections:\n");
        for (label, items) in [
            ("by name", &collections.by_name),
            ("by index", &collections.by_index),
            ("enumeration", &collections.enumeration),
        ] {
            if !items.is_empty() {
                let _ = writeln!(out, "- {label}: {}", items.join(", "));
            }
        }
        if collections.has_selection {
            out.push_str("- current selection available\n");
        }
    }
    out
}

/// Formats a documentation answer with its applicability counter.
pub fn format_resolution(name: &str, resolution: &Resolution) -> String {
    let mut out = format!("## {name}\n\n");
    if let Some((matched, total)) = resolution.counts() {
        let _ = writeln!(out, "Matched {matched}/{total} reference entries\n");
    }
    match resolution.text() {
        Some(text) => out.push_str(&text),
        None => out.push_str("The session went away before documentation arrived."),
    }
    out
}

/// Tool implementations for `UnoWorkspace`.
#[tool_router]
impl UnoWorkspace {
    /// Show the members of a namespace path.
    #[tool(
        description = "Inspect a path in the live PyUNO session: lists members with type and value, container items and the implementation name."
    )]
    pub async fn navigate(
        &self,
        Parameters(params): Parameters<NavigateParams>,
    ) -> Result<CallToolResult, McpError> {
        let pending = self
            .proxy
            .navigate(params.path.trim())
            .map_err(invalid_params)?;
        self.settle(pending).await
    }

    /// Go to the parent of the current path.
    #[tool(description = "Go up one level from the current path.")]
    pub async fn ascend(&self) -> Result<CallToolResult, McpError> {
        match self.proxy.ascend().map_err(invalid_params)? {
            Some(pending) => self.settle(pending).await,
            None => Ok(CallToolResult::success(vec![Content::text(
                "Already at the namespace root.",
            )])),
        }
    }

    /// Descend into a member of the current path.
    #[tool(
        description = "Open a member of the current path. Methods are called; pass `arguments` for methods that need them."
    )]
    pub async fn open_member(
        &self,
        Parameters(params): Parameters<OpenMemberParams>,
    ) -> Result<CallToolResult, McpError> {
        let member = params.member.trim();
        let component = if member.starts_with('[') {
            Some(member.to_string())
        } else {
            let snapshot = self.proxy.snapshot();
            let view = snapshot.member(member).ok_or_else(|| {
                invalid_params(format!(
                    "`{member}` is not a member of `{}`",
                    display_path(snapshot.path())
                ))
            })?;
            view.access_component(params.arguments.as_deref())
                .map_err(invalid_params)?
        };

        let Some(component) = component else {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "`{member}` is a raw value and cannot be opened."
            ))]));
        };
        debug!(component = %component, "opening member");
        let pending = self
            .proxy
            .append_component(&component)
            .map_err(invalid_params)?;
        self.settle(pending).await
    }

    /// Show the current path again.
    #[tool(description = "List the members of the current path again, refreshing from the session.")]
    pub async fn list_members(&self) -> Result<CallToolResult, McpError> {
        self.settle(self.proxy.refresh()).await
    }

    /// Documentation for a member of the current path.
    #[tool(
        description = "Documentation for a member of the current path, from the UNO API reference or the session's doc string."
    )]
    pub async fn describe_member(
        &self,
        Parameters(params): Parameters<DescribeMemberParams>,
    ) -> Result<CallToolResult, McpError> {
        let snapshot = self.proxy.snapshot();
        let name = params.name.trim();
        let request =
            ResolveRequest::for_member(&snapshot, name).unwrap_or_else(|| ResolveRequest {
                symbol: name.to_string(),
                tree_type: String::new(),
                tree_repr: String::new(),
                owner_path: snapshot.path().to_string(),
            });
        let resolution = self.resolver.resolve(&snapshot, &request).await;
        Ok(CallToolResult::success(vec![Content::text(
            format_resolution(name, &resolution),
        )]))
    }

    /// Previously visited paths.
    #[tool(description = "Paths visited in earlier navigation, oldest first.")]
    pub async fn navigation_history(&self) -> Result<CallToolResult, McpError> {
        let entries = self.history.read().await.map_err(|e| {
            McpError::new(
                ErrorCode::INTERNAL_ERROR,
                format!("failed to read navigation history: {e}"),
                None,
            )
        })?;
        let text = if entries.is_empty() {
            "No navigation history.".to_string()
        } else {
            entries
                .iter()
                .map(|entry| format!("- `{entry}`"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// External search URLs for a name.
    #[tool(description = "Forum and code snippet search URLs for a member name.")]
    pub async fn search_links(
        &self,
        Parameters(params): Parameters<SearchLinksParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = params.name.trim();
        let search = path::last_component(name).unwrap_or_else(|| name.to_string());
        let text = format!(
            "- Forum: {}\n- Snippets: {}",
            self.forum_search.url(&search),
            self.snippet_search.url(&search)
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for UnoWorkspace {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "uno-workspace".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Namespace browser for a live LibreOffice PyUNO session. Navigate object paths, \
                 open members and methods, and read UNO API documentation ranked against the \
                 values actually observed in the session."
                    .into(),
            ),
        }
    }
}
