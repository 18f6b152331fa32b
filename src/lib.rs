//! uno-workspace MCP Server
//!
//! Browses the object namespace of a live PyUNO interpreter session and
//! resolves documentation for its members, served to LLM applications over
//! MCP (Model Context Protocol).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     stdio      ┌─────────────────┐
//! │   LLM Client    │◄──────────────►│   MCP Server    │
//! │                 │    (MCP)       │ (uno-workspace) │
//! └─────────────────┘                └───┬─────────┬───┘
//!                                        │         │
//!                           ┌────────────▼──┐   ┌──▼──────────────┐
//!                           │ Introspection │   │  Documentation  │
//!                           │     proxy     │   │    resolver     │
//!                           └──────┬─────┬──┘   └──┬───────────┬──┘
//!                                  │     │         │           │
//!                       JSON lines │  ┌──▼─────┐   │     ┌─────▼─────┐
//!                                  │  │  dump  │   │     │  SQLite   │
//!                           ┌──────▼──┴────────┴───▼┐    │  corpus   │
//!                           │   Interpreter bridge  │    └───────────┘
//!                           │  (PyUNO session)      │
//!                           └───────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`error`] - Error types for the entire application
//! - [`config`] - Workspace settings and MCP client registration
//! - [`session`] - Gateway to the interpreter session
//! - [`workspace`] - Namespace navigation and snapshots
//! - [`docs`] - Documentation corpus, ranking and rendering
//! - [`mcp`] - MCP server implementation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use uno_workspace::session::client::SessionClient;
//! use uno_workspace::workspace::{DumpReader, IntrospectionProxy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = SessionClient::builder()
//!         .command("python3")
//!         .args(["bridge.py"])
//!         .build()
//!         .await?;
//!
//!     let proxy = IntrospectionProxy::builder(Arc::new(session), DumpReader::new("result.txt")).build();
//!     let snapshot = proxy.navigate("doc.Text")?.wait().await;
//!     Ok(())
//! }
//! ```

// Enforce documentation and other quality attributes
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are too strict
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod docs;
pub mod error;
pub mod mcp;
pub mod session;
pub mod workspace;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
