//! MCP (Model Context Protocol) server module.
//!
//! Exposes namespace browsing and documentation lookup for a live PyUNO
//! session to LLM applications over stdio.
//!
//! - `server`: the [`UnoWorkspace`] handler and response formatting
//! - `tools`: tool parameter definitions
//!
//! # Usage
//!
//! ```ignore
//! use rmcp::{ServiceExt, transport::stdio};
//! use uno_workspace::mcp::UnoWorkspace;
//!
//! let server = UnoWorkspace::new(proxy, resolver, &config);
//! server.serve(stdio()).await?.waiting().await?;
//! ```

pub mod server;
pub mod tools;

pub use server::UnoWorkspace;
