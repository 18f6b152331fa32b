//! Bounded log of visited namespace paths.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Append-only newline-delimited file of distinct visited paths.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    path: PathBuf,
    limit: usize,
}

impl NavigationHistory {
    /// Creates a history stored at `path`, keeping at most `limit` entries.
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit: limit.max(1),
        }
    }

    /// Location of the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all recorded paths, oldest first. A missing file is empty.
    /// ## Errors
    pub async fn read(&self) -> io::Result<Vec<String>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Records `entry` unless it is empty or already present.
    ///
    /// Returns whether the entry was added. When the limit is exceeded the
    /// oldest entries are dropped and the file is rewritten.
    /// ## Errors
    pub async fn record(&self, entry: &str) -> io::Result<bool> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Ok(false);
        }
        let mut entries = self.read().await?;
        if entries.iter().any(|e| e == entry) {
            return Ok(false);
        }

        if entries.len() < self.limit {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(format!("{entry}\n").as_bytes()).await?;
            file.flush().await?;
        } else {
            entries.push(entry.to_string());
            let excess = entries.len() - self.limit;
            self.write_all(&entries[excess..]).await?;
        }
        Ok(true)
    }

    /// Clears the history.
    /// ## Errors
    pub async fn reset(&self) -> io::Result<()> {
        self.write_all(&[]).await
    }

    /// Creates an empty history file if none exists yet.
    /// ## Errors
    pub async fn ensure_exists(&self) -> io::Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.reset().await
    }

    async fn write_all(&self, entries: &[String]) -> io::Result<()> {
        let mut text = String::new();
        for entry in entries {
            text.push_str(entry);
            text.push('\n');
        }
        tokio::fs::write(&self.path, text).await
    }
}
