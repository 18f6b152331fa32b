//! Common test helpers and utilities.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tokio::sync::oneshot;

use uno_workspace::docs::ReferenceCorpus;
use uno_workspace::error::SessionError;
use uno_workspace::session::{SessionGateway, SessionResult};

/// Scripted answer for one session request.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The session answers with a value.
    Answer(T),
    /// The session goes away before answering.
    Cancel,
    /// The session reports an error.
    Fail(String),
}

impl<T> Outcome<T> {
    fn into_result(self) -> SessionResult<T> {
        match self {
            Outcome::Answer(value) => Ok(value),
            Outcome::Cancel => Err(SessionError::Cancelled),
            Outcome::Fail(message) => Err(SessionError::Remote(message)),
        }
    }
}

/// A session gateway answering from scripted tables and counting calls.
///
/// Unscripted listings answer with no records and unscripted doc queries
/// with `None`.
#[derive(Default)]
pub struct FakeGateway {
    listings: Mutex<HashMap<String, Outcome<Vec<String>>>>,
    docs: Mutex<HashMap<String, Outcome<Option<String>>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    dump: Mutex<Option<(PathBuf, String)>>,
    executed: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    doc_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers listings of `path` with `records`.
    pub fn with_listing(self, path: &str, records: &[&str]) -> Self {
        self.script_listing(
            path,
            Outcome::Answer(records.iter().map(ToString::to_string).collect()),
        );
        self
    }

    pub fn script_listing(&self, path: &str, outcome: Outcome<Vec<String>>) {
        self.listings.lock().unwrap().insert(path.to_string(), outcome);
    }

    /// Answers doc string queries for `path` with `doc`.
    pub fn with_doc(self, path: &str, doc: &str) -> Self {
        self.script_doc(path, Outcome::Answer(Some(doc.to_string())));
        self
    }

    pub fn script_doc(&self, path: &str, outcome: Outcome<Option<String>>) {
        self.docs.lock().unwrap().insert(path.to_string(), outcome);
    }

    /// Writes `contents` to `file` whenever a command is executed, as the
    /// inspector does.
    pub fn with_dump(self, file: &Path, contents: &str) -> Self {
        *self.dump.lock().unwrap() = Some((file.to_path_buf(), contents.to_string()));
        self
    }

    /// Holds the next listing of `path` until the returned sender fires or
    /// is dropped.
    pub fn hold_listing(&self, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(path.to_string(), rx);
        tx
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn doc_calls(&self) -> usize {
        self.doc_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl SessionGateway for FakeGateway {
    fn list_attributes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, SessionResult<Vec<String>>> {
        async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().remove(path);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let outcome = self.listings.lock().unwrap().get(path).cloned();
            outcome.map_or_else(|| Ok(Vec::new()), Outcome::into_result)
        }
        .boxed()
    }

    fn query_doc_string<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, SessionResult<Option<String>>> {
        async move {
            self.doc_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.docs.lock().unwrap().get(path).cloned();
            outcome.map_or_else(|| Ok(None), Outcome::into_result)
        }
        .boxed()
    }

    fn execute<'a>(&'a self, source: &'a str) -> BoxFuture<'a, SessionResult<()>> {
        async move {
            self.executed.lock().unwrap().push(source.to_string());
            let dump = self.dump.lock().unwrap().clone();
            if let Some((file, contents)) = dump {
                std::fs::write(file, contents).unwrap();
            }
            Ok(())
        }
        .boxed()
    }
}

/// One corpus row: name, signature, description, reference.
pub type CorpusRow<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Builds a corpus database file with `rows` in a fresh temporary
/// directory and opens it read-only.
pub async fn corpus_with(rows: &[CorpusRow<'_>]) -> (TempDir, ReferenceCorpus) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unoDoc.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE UNOtable (name TEXT, signature TEXT, description TEXT, reference TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    for &(name, signature, description, reference) in rows {
        sqlx::query("INSERT INTO UNOtable (name, signature, description, reference) VALUES (?1, ?2, ?3, ?4)")
            .bind(name)
            .bind(signature)
            .bind(description)
            .bind(reference)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;

    let corpus = ReferenceCorpus::open(&path).await.unwrap();
    (dir, corpus)
}
