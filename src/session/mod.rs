//! Remote interpreter session module.
//!
//! This module describes how the workspace talks to the running interpreter:
//! a [`SessionGateway`] issues namespace listings, doc string queries and
//! fire-and-forget commands, each answered asynchronously.
//!
//! # Architecture
//!
//! The session module is organized into:
//! - `client`: A gateway backed by a spawned interpreter bridge process
//! - `types`: Attribute records as produced by the namespace listing
//!
//! # Usage
//!
//! ```ignore
//! use uno_workspace::session::client::SessionClient;
//!
//! let client = SessionClient::builder().command("python3").build().await?;
//! let records = client.list_attributes("doc.Text").await?;
//! ```

pub mod client;
pub mod types;

use futures::future::BoxFuture;

use crate::error::SessionError;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Asynchronous access to a remote interpreter session.
///
/// Every operation returns a future that resolves once the session answers.
/// A future resolving to [`SessionError::Cancelled`] or
/// [`SessionError::Unavailable`] means the session is gone; callers treat
/// that as empty data, not as a failure.
pub trait SessionGateway: Send + Sync {
    /// Lists the attributes of the object at `path` as raw
    /// `"name,kind,type,repr"` records. The empty path lists the session's
    /// top-level namespace.
    fn list_attributes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, SessionResult<Vec<String>>>;

    /// Asks the session for the doc string of the object at `path`.
    fn query_doc_string<'a>(&'a self, path: &'a str)
    -> BoxFuture<'a, SessionResult<Option<String>>>;

    /// Injects `source` into the session without waiting for any result.
    ///
    /// The returned future completes once the command has been handed to the
    /// session, not when the session has executed it.
    fn execute<'a>(&'a self, source: &'a str) -> BoxFuture<'a, SessionResult<()>>;
}
