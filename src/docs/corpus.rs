//! Reference corpus: a read-only SQLite database of UNO API documentation.
//!
//! One table, `UNOtable(name, signature, description, reference)`, with one
//! row per documented overload or variant of a name.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::CorpusError;

/// Prefix shared by accessor methods documented under their getter name.
const GETTER_PREFIX: &str = "get";

/// One documentation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentationRecord {
    /// Declaration text. Line breaks are encoded as `&newline&`.
    pub signature: String,
    /// Free-form description. Line breaks are encoded as `&newline&`.
    pub description: String,
    /// Link to the reference documentation.
    pub reference: String,
}

/// The candidate key paired with `name`: the `get` prefix stripped if
/// present, added otherwise.
pub fn toggle_getter(name: &str) -> String {
    match name.strip_prefix(GETTER_PREFIX) {
        Some(rest) => rest.to_string(),
        None => format!("{GETTER_PREFIX}{name}"),
    }
}

/// Read-only access to the documentation database.
#[derive(Debug, Clone)]
pub struct ReferenceCorpus {
    pool: Arc<SqlitePool>,
}

impl ReferenceCorpus {
    /// Opens the database file at `path` read-only.
    /// ## Errors
    /// Returns [`CorpusError::Open`] when the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, CorpusError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|source| CorpusError::Open {
                path: path.display().to_string(),
                source,
            })?;

        info!(corpus = %path.display(), "reference corpus opened");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Fetches every row documenting `name` or its getter-toggled variant,
    /// in storage order.
    /// ## Errors
    pub async fn lookup(&self, name: &str) -> Result<Vec<DocumentationRecord>, CorpusError> {
        let records = sqlx::query_as::<_, DocumentationRecord>(
            r"
            SELECT
                COALESCE(signature, '') AS signature,
                COALESCE(description, '') AS description,
                COALESCE(reference, '') AS reference
            FROM UNOtable
            WHERE name = ?1 OR name = ?2
            ORDER BY rowid
            ",
        )
        .bind(name)
        .bind(toggle_getter(name))
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(records)
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
