//! Configuration.
//!
//! [`WorkspaceConfig`] holds the workspace settings, read from an optional
//! JSON file where every field has a default. [`configure`] registers the
//! server in the `.mcp.json` of the current directory for MCP clients.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::docs::SearchLink;
use crate::error::{Error, Result};
use crate::workspace::proxy::InspectorCommand;
use crate::workspace::snapshot::MemberFilter;

/// Name under which the server is registered in `.mcp.json`.
const SERVER_NAME: &str = "uno-workspace";

/// Workspace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding the dump, history and corpus files.
    pub data_dir: PathBuf,
    /// Structured dump written by the inspector.
    pub dump_file: String,
    /// Navigation history.
    pub history_file: String,
    /// Reference corpus database.
    pub corpus_file: String,
    /// Maximum number of history entries kept.
    pub history_limit: usize,
    /// Member kinds hidden from listings. `private` hides `_` names.
    pub hidden_kinds: Vec<String>,
    /// Source run in the session to refresh the dump; `{path}` is replaced
    /// by the inspected path.
    pub inspect_command: String,
    /// Forum search link.
    pub forum_search: SearchLink,
    /// Code snippet search link.
    pub snippet_search: SearchLink,
    /// Timeout for a single session request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            dump_file: "result.txt".to_string(),
            history_file: "ws_history.txt".to_string(),
            corpus_file: "unoDoc.db".to_string(),
            history_limit: 100,
            hidden_kinds: vec!["private".to_string()],
            inspect_command: "Inspector().inspect({path})\n".to_string(),
            forum_search: SearchLink::new(
                "https://forum.openoffice.org/en/forum/search.php?keywords=",
                "&terms=all&sf=all&sr=posts",
            ),
            snippet_search: SearchLink::new(
                "https://forum.openoffice.org/en/forum/search.php?keywords=",
                "&fid[]=21&terms=all&sf=all&sr=topics",
            ),
            request_timeout_secs: 10,
        }
    }
}

impl WorkspaceConfig {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it is not a valid settings object.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!(config = %path.display(), "workspace configuration loaded");
        Ok(config)
    }

    /// Reads settings from `path` when given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load`] errors.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Location of the structured dump.
    pub fn dump_path(&self) -> PathBuf {
        self.data_dir.join(&self.dump_file)
    }

    /// Location of the navigation history.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    /// Location of the reference corpus.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join(&self.corpus_file)
    }

    /// Per-request session timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Listing filter for the configured hidden kinds.
    pub fn member_filter(&self) -> MemberFilter {
        MemberFilter::new(self.hidden_kinds.iter().cloned())
    }

    /// Inspector refresh command.
    pub fn inspector(&self) -> InspectorCommand {
        InspectorCommand::new(self.inspect_command.clone())
    }
}

/// Register uno-workspace in `.mcp.json` in the current directory, creating
/// the file when needed.
///
/// ## Errors
/// Returns an error if:
/// - File I/O fails
/// - Existing .mcp.json contains invalid JSON
/// - uno-workspace is already configured
pub fn configure(data_dir: &Path) -> anyhow::Result<()> {
    let config_file = Path::new(".mcp.json");

    let existing: Value = match fs::read_to_string(config_file) {
        Ok(content) => {
            serde_json::from_str(&content).context("failed to parse .mcp.json - invalid JSON")?
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => json!({}),
        Err(e) => return Err(e).context("failed to read .mcp.json"),
    };

    let mut root = match existing {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut servers = match root.remove("mcpServers") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if servers.contains_key(SERVER_NAME) {
        anyhow::bail!(
            "{SERVER_NAME} is already configured in .mcp.json\n\n\
            To reconfigure, first remove the existing entry, then run:\n  \
            {SERVER_NAME} config"
        );
    }
    servers.insert(
        SERVER_NAME.to_string(),
        json!({
            "command": SERVER_NAME,
            "args": ["--data-dir", data_dir.display().to_string()]
        }),
    );
    root.insert("mcpServers".to_string(), Value::Object(servers));
    let config = Value::Object(root);

    // Write atomically (temp file + rename)
    let temp_file = config_file.with_extension("tmp");
    let json_str = serde_json::to_string_pretty(&config).context("failed to serialize JSON")?;
    fs::write(&temp_file, json_str).context("failed to write temporary config file")?;
    fs::rename(&temp_file, config_file).context("failed to rename temporary config file")?;

    println!("\n{}", "=".repeat(60));
    println!("✓ Registered {SERVER_NAME} in .mcp.json");
    println!("{}", "=".repeat(60));
    println!("\nNext steps:");
    println!("  1. Start LibreOffice with the interpreter bridge listening");
    println!("  2. Restart your MCP client if it's running");
    println!("  3. Try: \"Browse the current document's text\"\n");

    Ok(())
}
