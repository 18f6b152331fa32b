//! Introspection proxy.
//!
//! The proxy turns "tell me everything about path P" into two answers that
//! arrive on their own schedule: the session's generic attribute listing and
//! the inspector's structured dump. Once both are in, it publishes one
//! immutable [`NamespaceSnapshot`] on a watch channel.
//!
//! Navigation never blocks the caller. Each request is tagged with a
//! generation number; a response belonging to a superseded request is still
//! assembled for whoever awaits it, but is never published over a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::WorkspaceError;
use crate::session::SessionGateway;
use crate::session::types::parse_listing;

use super::dump::DumpReader;
use super::history::NavigationHistory;
use super::path;
use super::snapshot::NamespaceSnapshot;

/// Placeholder for the inspected path in an inspector command template.
const PATH_PLACEHOLDER: &str = "{path}";

/// Source text that makes the inspector refresh its dump for a path.
#[derive(Debug, Clone)]
pub struct InspectorCommand {
    template: String,
}

impl InspectorCommand {
    /// Creates a command from a template containing `{path}`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Renders the command for `path`.
    pub fn render(&self, path: &str) -> String {
        self.template.replace(PATH_PLACEHOLDER, path)
    }
}

impl Default for InspectorCommand {
    fn default() -> Self {
        Self::new("Inspector().inspect({path})\n")
    }
}

/// The authoritative navigation state.
#[derive(Debug, Default)]
struct ProxyState {
    /// Most recently requested path.
    path: String,
    /// Incremented on every request.
    generation: u64,
}

struct ProxyInner {
    gateway: Arc<dyn SessionGateway>,
    dump: DumpReader,
    inspector: InspectorCommand,
    history: Option<NavigationHistory>,
    history_lock: tokio::sync::Mutex<()>,
    /// Orders dump preparation across in-flight navigations.
    dump_lock: tokio::sync::Mutex<()>,
    state: Mutex<ProxyState>,
    snapshots: watch::Sender<Arc<NamespaceSnapshot>>,
}

impl ProxyInner {
    fn state(&self) -> MutexGuard<'_, ProxyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a request for `path`, returning its generation and whether the
    /// path changed.
    fn begin(&self, path: &str) -> (u64, bool) {
        let mut state = self.state();
        let changed = state.path != path;
        if changed {
            state.path = path.to_string();
        }
        state.generation += 1;
        (state.generation, changed)
    }

    /// Clears stale dump data, or asks the inspector to produce fresh data.
    ///
    /// Skipped once another path has been requested, so the dump only ever
    /// moves towards the current path.
    async fn prepare_dump(&self, path: &str) {
        let _guard = self.dump_lock.lock().await;
        if self.state().path != path {
            debug!(path, "path superseded, leaving the structured dump alone");
            return;
        }

        if path.is_empty() || path::is_raw_value_access(path) {
            if let Err(e) = self.dump.reset().await {
                warn!(dump = %self.dump.path().display(), error = %e, "failed to reset structured dump");
            }
            return;
        }

        let command = self.inspector.render(path);
        match self.gateway.execute(&command).await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => debug!(path, "no session to run the inspector"),
            Err(e) => warn!(path, error = %e, "failed to trigger the inspector"),
        }
    }

    /// Lists `path`, reads the dump and publishes the result.
    async fn collect(&self, path: String, generation: u64) -> Arc<NamespaceSnapshot> {
        let records = match self.gateway.list_attributes(&path).await {
            Ok(records) => records,
            Err(e) if e.is_cancelled() => {
                debug!(path = %path, "namespace listing cancelled, no living session");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path, error = %e, "namespace listing failed");
                Vec::new()
            }
        };
        let dump = self.dump.read_latest().await;

        let snapshot = Arc::new(NamespaceSnapshot::new(
            path,
            generation,
            parse_listing(records),
            dump,
        ));
        self.publish(&snapshot);
        snapshot
    }

    fn publish(&self, snapshot: &Arc<NamespaceSnapshot>) -> bool {
        // Held across the send so a newer request cannot publish in between.
        let state = self.state();
        if state.generation != snapshot.generation() {
            debug!(
                path = snapshot.path(),
                generation = snapshot.generation(),
                current = state.generation,
                "dropping superseded namespace snapshot"
            );
            return false;
        }
        self.snapshots.send_replace(Arc::clone(snapshot));
        true
    }

    async fn record_history(&self, path: &str) {
        let Some(history) = &self.history else {
            return;
        };
        let _guard = self.history_lock.lock().await;
        if let Err(e) = history.record(path).await {
            warn!(history = %history.path().display(), error = %e, "failed to record navigation history");
        }
    }
}

/// A navigation in flight.
#[derive(Debug)]
pub struct PendingSnapshot {
    generation: u64,
    task: JoinHandle<Arc<NamespaceSnapshot>>,
}

impl PendingSnapshot {
    /// Generation assigned to this request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the request's snapshot, whether or not it was published.
    pub async fn wait(self) -> Option<Arc<NamespaceSnapshot>> {
        match self.task.await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(generation = self.generation, error = %e, "navigation task failed");
                None
            }
        }
    }
}

/// Builder for an [`IntrospectionProxy`].
pub struct IntrospectionProxyBuilder {
    gateway: Arc<dyn SessionGateway>,
    dump: DumpReader,
    inspector: InspectorCommand,
    history: Option<NavigationHistory>,
}

impl IntrospectionProxyBuilder {
    /// Sets the inspector refresh command.
    #[must_use]
    pub fn inspector(mut self, command: InspectorCommand) -> Self {
        self.inspector = command;
        self
    }

    /// Records visited paths in `history`.
    #[must_use]
    pub fn history(mut self, history: NavigationHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Builds the proxy, starting at the namespace root with an empty
    /// snapshot.
    pub fn build(self) -> IntrospectionProxy {
        let (snapshots, _) = watch::channel(Arc::new(NamespaceSnapshot::empty("", 0)));
        IntrospectionProxy {
            inner: Arc::new(ProxyInner {
                gateway: self.gateway,
                dump: self.dump,
                inspector: self.inspector,
                history: self.history,
                history_lock: tokio::sync::Mutex::new(()),
                dump_lock: tokio::sync::Mutex::new(()),
                state: Mutex::new(ProxyState::default()),
                snapshots,
            }),
        }
    }
}

/// Navigates a remote session's namespace and publishes snapshots.
///
/// Cloning is cheap; clones share the same state and channel. Navigation
/// methods spawn onto the current Tokio runtime.
#[derive(Clone)]
pub struct IntrospectionProxy {
    inner: Arc<ProxyInner>,
}

impl IntrospectionProxy {
    /// Creates a builder for a proxy talking to `gateway` and reading the
    /// inspector's dump through `dump`.
    pub fn builder(gateway: Arc<dyn SessionGateway>, dump: DumpReader) -> IntrospectionProxyBuilder {
        IntrospectionProxyBuilder {
            gateway,
            dump,
            inspector: InspectorCommand::default(),
            history: None,
        }
    }

    /// The most recently requested path.
    pub fn current_path(&self) -> String {
        self.inner.state().path.clone()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<NamespaceSnapshot> {
        Arc::clone(&self.inner.snapshots.borrow())
    }

    /// Subscribes to "new snapshot available" notifications. The receiver
    /// is only a signal; pull the data with [`Self::snapshot`] or
    /// `borrow()`.
    pub fn subscribe(&self) -> watch::Receiver<Arc<NamespaceSnapshot>> {
        self.inner.snapshots.subscribe()
    }

    /// Requests everything known about `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidPath`] when `path` is neither empty
    /// nor a dotted/bracketed attribute path.
    pub fn navigate(&self, path: impl Into<String>) -> Result<PendingSnapshot, WorkspaceError> {
        let path = path.into();
        path::validate(&path)?;

        let (generation, changed) = self.inner.begin(&path);
        info!(path = %path, generation, "navigating namespace");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            inner.prepare_dump(&path).await;
            let snapshot = inner.collect(path.clone(), generation).await;
            if changed {
                inner.record_history(&path).await;
            }
            snapshot
        });
        Ok(PendingSnapshot { generation, task })
    }

    /// Navigates to the parent path. Does nothing at the root.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::navigate`] errors.
    pub fn ascend(&self) -> Result<Option<PendingSnapshot>, WorkspaceError> {
        match path::parent_path(&self.current_path())? {
            Some(parent) => self.navigate(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Navigates into `part` below the current path.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidComponent`] when `part` is not a
    /// single path component.
    pub fn append_component(&self, part: &str) -> Result<PendingSnapshot, WorkspaceError> {
        let path = path::append_component(&self.current_path(), part)?;
        self.navigate(path)
    }

    /// Lists the current path again without re-triggering the inspector,
    /// e.g. after the session finished a busy period.
    pub fn refresh(&self) -> PendingSnapshot {
        let path = self.current_path();
        let (generation, _) = self.inner.begin(&path);
        debug!(path = %path, generation, "refreshing namespace");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.collect(path, generation).await });
        PendingSnapshot { generation, task }
    }

    /// Publishes an empty snapshot because no session is attached any more.
    pub fn session_lost(&self) -> Arc<NamespaceSnapshot> {
        let path = self.current_path();
        let (generation, _) = self.inner.begin(&path);
        info!(path = %path, "session detached, clearing namespace");

        let snapshot = Arc::new(NamespaceSnapshot::empty(path, generation));
        self.inner.publish(&snapshot);
        snapshot
    }
}
