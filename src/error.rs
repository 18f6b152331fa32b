//! Error types for the uno-workspace server.
//!
//! This module defines all error types used throughout the application,
//! organized by subsystem: remote session, reference corpus, and workspace
//! navigation.

use thiserror::Error;

/// Errors related to the remote interpreter session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request was cancelled because the session went away.
    #[error("request cancelled: the session is gone")]
    Cancelled,

    /// No session is attached.
    #[error("no interpreter session is available")]
    Unavailable,

    /// The bridge process failed to start.
    #[error("failed to start interpreter bridge: {0}")]
    SpawnFailed(String),

    /// A request to the session timed out.
    #[error("session request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Failed to send a request to the session.
    #[error("failed to send request to session: {0}")]
    RequestFailed(String),

    /// The session answered with an error.
    #[error("session error: {0}")]
    Remote(String),

    /// The session answered with something we could not understand.
    #[error("malformed session response: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Returns true when the error means "there is no living session"
    /// rather than a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Unavailable)
    }
}

/// Errors related to the documentation reference corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus database could not be opened.
    #[error("failed to open reference corpus '{path}': {source}")]
    Open {
        /// Location of the database file.
        path: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A lookup query failed.
    #[error("reference corpus query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Errors raised synchronously by workspace operations on invalid input.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The navigation path is not a dotted/bracketed attribute path.
    #[error("invalid namespace path: {0:?}")]
    InvalidPath(String),

    /// A path component is empty or unbalanced.
    #[error("invalid path component: {0:?}")]
    InvalidComponent(String),

    /// The member is a method that needs call arguments.
    #[error("member '{member}' requires arguments: {signature}")]
    MissingArguments {
        /// The method name.
        member: String,
        /// The argument signature reported by the session.
        signature: String,
    },
}

/// A unified error type for the entire application.
#[derive(Debug, Error)]
pub enum Error {
    /// Session-related error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Corpus-related error.
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// Workspace-related error.
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for uno-workspace operations.
pub type Result<T> = std::result::Result<T, Error>;
