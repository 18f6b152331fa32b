//! Session client implementation.
//!
//! This module provides a [`SessionGateway`] that spawns an interpreter
//! bridge process and exchanges line-delimited JSON with it over stdio.
//!
//! Requests carry an `id` and are answered out of order; the client
//! correlates answers to waiting callers by that id. Commands injected with
//! [`SessionGateway::execute`] are sent without an id and never answered.
//!
//! # Example
//!
//! ```ignore
//! use uno_workspace::session::client::SessionClient;
//!
//! let client = SessionClient::builder()
//!     .command("python3")
//!     .args(["-u", "bridge.py"])
//!     .build()
//!     .await?;
//!
//! let doc = client.query_doc_string("str.split").await?;
//! client.shutdown().await?;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

use crate::error::SessionError;

use super::{SessionGateway, SessionResult};

type Reply = Result<Value, String>;
type PendingRequests = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;
type ResponseReceiver = oneshot::Receiver<Reply>;

/// A message sent to the bridge.
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    params: Value,
}

/// A message received from the bridge.
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Configuration for building a session client.
#[derive(Debug, Clone)]
pub struct SessionClientConfig {
    /// Command that starts the interpreter bridge.
    pub command: String,
    /// Arguments to pass to the bridge.
    pub args: Vec<String>,
    /// Working directory for the bridge process.
    pub working_dir: Option<PathBuf>,
    /// Timeout for requests.
    pub request_timeout: Duration,
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: Vec::new(),
            working_dir: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Builder for constructing a session client.
#[derive(Debug, Default)]
pub struct SessionClientBuilder {
    config: SessionClientConfig,
}

impl SessionClientBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bridge command.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.config.command = command.into();
        self
    }

    /// Sets the bridge arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the working directory of the bridge process.
    #[must_use]
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.working_dir = Some(path.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Spawns the bridge process and starts reading its answers.
    /// ## Errors
    /// Returns [`SessionError::SpawnFailed`] when the process cannot be
    /// started or its pipes cannot be captured.
    pub async fn build(self) -> SessionResult<SessionClient> {
        let mut cmd = async_process::Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            SessionError::SpawnFailed(format!("failed to spawn '{}': {}", self.config.command, e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("failed to capture stdout".to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("failed to capture stdin".to_string()))?;

        let pending = PendingRequests::default();
        let closed = Arc::new(AtomicBool::new(false));

        let reader_pending = Arc::clone(&pending);
        let reader_closed = Arc::clone(&closed);
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => dispatch_response(&reader_pending, &line),
                    Err(e) => {
                        warn!(error = %e, "failed to read from interpreter bridge");
                        break;
                    }
                }
            }
            debug!("interpreter bridge closed its output");
            reader_closed.store(true, Ordering::SeqCst);
            // Dropping the senders resolves every waiting request as cancelled.
            reader_pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        });

        Ok(SessionClient {
            config: self.config,
            writer: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(0),
            closed,
            _reader_handle: reader_handle,
            child: Mutex::new(child),
        })
    }
}

/// Routes one line of bridge output to the request waiting for it.
fn dispatch_response(pending: &PendingRequests, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let response: BridgeResponse = match serde_json::from_str(line) {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, line, "ignoring non-protocol bridge output");
            return;
        }
    };

    let waiter = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&response.id);

    match waiter {
        Some(tx) => {
            let reply = match response.error {
                Some(message) => Err(message),
                None => Ok(response.result),
            };
            // The caller may have timed out and gone away.
            let _ = tx.send(reply);
        }
        None => debug!(id = response.id, "response for unknown or expired request"),
    }
}

/// Gateway to an interpreter session running in a bridge process.
pub struct SessionClient {
    /// Configuration used to create this client.
    config: SessionClientConfig,
    /// The bridge's stdin.
    writer: Mutex<async_process::ChildStdin>,
    /// Requests waiting for an answer, by id.
    pending: PendingRequests,
    /// Next request id.
    next_id: AtomicU64,
    /// Set once the bridge's output has closed.
    closed: Arc<AtomicBool>,
    /// Handle to the reader task.
    _reader_handle: tokio::task::JoinHandle<()>,
    /// The bridge process handle (kept alive to prevent kill-on-drop).
    child: Mutex<async_process::Child>,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Creates a new builder for constructing a session client.
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::new()
    }

    /// Returns true while the bridge is still producing output.
    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Kills the bridge process.
    /// ## Errors
    pub async fn shutdown(&self) -> SessionResult<()> {
        self.child
            .lock()
            .await
            .kill()
            .map_err(|e| SessionError::RequestFailed(format!("failed to stop bridge: {e}")))
    }

    async fn send(&self, message: &BridgeRequest<'_>) -> SessionResult<()> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| SessionError::RequestFailed(format!("failed to encode request: {e}")))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SessionError::RequestFailed(format!("{} failed: {e}", message.method)))?;
        writer
            .flush()
            .await
            .map_err(|e| SessionError::RequestFailed(format!("{} failed: {e}", message.method)))
    }

    async fn request(&self, method: &str, params: Value) -> SessionResult<Value> {
        if !self.is_alive() {
            return Err(SessionError::Unavailable);
        }
        let (id, rx) = self.register()?;

        let message = BridgeRequest {
            id: Some(id),
            method,
            params,
        };
        if let Err(e) = self.send(&message).await {
            self.forget(id);
            return Err(e);
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Err(_) => {
                self.forget(id);
                Err(SessionError::Timeout(self.config.request_timeout))
            }
            Ok(Err(_)) => Err(SessionError::Cancelled),
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(SessionError::Remote(message)),
        }
    }

    /// Adds a waiter for the next request id.
    ///
    /// The closed flag is checked under the pending lock: the reader sets it
    /// before clearing the map, so a waiter is either refused here or
    /// dropped by the reader.
    fn register(&self) -> SessionResult<(u64, ResponseReceiver)> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable);
        }
        pending.insert(id, tx);
        Ok((id, rx))
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

impl SessionGateway for SessionClient {
    fn list_attributes<'a>(&'a self, path: &'a str) -> BoxFuture<'a, SessionResult<Vec<String>>> {
        async move {
            let value = self.request("dir2", json!({ "name": path })).await?;
            if value.is_null() {
                return Ok(Vec::new());
            }
            serde_json::from_value(value)
                .map_err(|e| SessionError::Protocol(format!("dir2 result: {e}")))
        }
        .boxed()
    }

    fn query_doc_string<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, SessionResult<Option<String>>> {
        async move {
            match self.request("doc", json!({ "name": path })).await? {
                Value::Null => Ok(None),
                Value::String(doc) => Ok(Some(doc)),
                other => Err(SessionError::Protocol(format!(
                    "doc result is not a string: {other}"
                ))),
            }
        }
        .boxed()
    }

    fn execute<'a>(&'a self, source: &'a str) -> BoxFuture<'a, SessionResult<()>> {
        async move {
            if !self.is_alive() {
                return Err(SessionError::Unavailable);
            }
            let message = BridgeRequest {
                id: None,
                method: "execute",
                params: json!({ "source": source }),
            };
            self.send(&message).await
        }
        .boxed()
    }
}
