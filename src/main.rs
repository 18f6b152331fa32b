//! uno-workspace MCP Server - Entry Point
//!
//! Sets up logging, parses arguments, opens the reference corpus, attaches
//! to the interpreter bridge and serves the workspace tools over stdio.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use uno_workspace::config::{WorkspaceConfig, configure};
use uno_workspace::docs::{DocumentationResolver, Markup, ReferenceCorpus};
use uno_workspace::mcp::UnoWorkspace;
use uno_workspace::session::SessionGateway;
use uno_workspace::session::client::SessionClient;
use uno_workspace::workspace::{DumpReader, IntrospectionProxy, NavigationHistory};

/// How often the bridge is checked for having gone away.
const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// MCP server for browsing a live PyUNO session.
#[derive(Parser, Debug)]
#[command(name = "uno-workspace")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Command that starts the interpreter bridge.
    #[arg(long, default_value = "python3")]
    session_command: String,

    /// Arguments to pass to the interpreter bridge.
    #[arg(long)]
    session_args: Vec<String>,

    /// Working directory of the interpreter bridge.
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// JSON settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the dump, history and corpus files.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register uno-workspace in `.mcp.json` of the current directory.
    Config,
}

impl Args {
    /// Parses the log level string into a tracing Level.
    fn parse_log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!("invalid log level: {}", other),
        }
    }

    /// Loads settings, letting `--data-dir` override the file.
    fn workspace_config(&self) -> Result<WorkspaceConfig> {
        let mut config = WorkspaceConfig::load_or_default(self.config.as_deref())
            .context("failed to load workspace configuration")?;
        if let Some(data_dir) = &self.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        Ok(config)
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("uno_workspace={level},sqlx=warn")));

    // stdout carries the MCP transport
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

/// Publishes an empty namespace once the bridge stops answering.
fn watch_session(session: Arc<SessionClient>, proxy: IntrospectionProxy) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            if !session.is_alive() {
                proxy.session_lost();
                break;
            }
        }
    });
}

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.workspace_config()?;

    if matches!(args.command, Some(Command::Config)) {
        return configure(&config.data_dir);
    }

    init_tracing(args.parse_log_level()?)?;

    info!(
        data_dir = %config.data_dir.display(),
        session_command = %args.session_command,
        "starting uno-workspace MCP server"
    );

    let dump = DumpReader::new(config.dump_path());
    dump.ensure_exists()
        .await
        .with_context(|| format!("failed to create {}", config.dump_path().display()))?;
    let history = NavigationHistory::new(config.history_path(), config.history_limit);
    history
        .ensure_exists()
        .await
        .with_context(|| format!("failed to create {}", config.history_path().display()))?;

    let corpus = Arc::new(
        ReferenceCorpus::open(&config.corpus_path())
            .await
            .context("failed to open reference corpus")?,
    );

    let mut builder = SessionClient::builder()
        .command(&args.session_command)
        .args(args.session_args.iter().cloned())
        .request_timeout(config.request_timeout());
    if let Some(dir) = &args.working_dir {
        builder = builder.working_dir(dir);
    }
    let session = Arc::new(
        builder
            .build()
            .await
            .context("failed to start interpreter bridge")?,
    );
    info!("interpreter bridge started");

    let gateway: Arc<dyn SessionGateway> = session.clone();
    let proxy = IntrospectionProxy::builder(Arc::clone(&gateway), dump)
        .inspector(config.inspector())
        .history(history)
        .build();
    let resolver =
        DocumentationResolver::new(Arc::clone(&corpus), gateway).with_markup(Markup::Markdown);

    // Initial root listing, published in the background.
    drop(proxy.navigate("")?);
    watch_session(Arc::clone(&session), proxy.clone());

    let server = UnoWorkspace::new(proxy, resolver, &config);

    info!("starting MCP server with stdio transport");
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;

    info!("MCP server started, waiting for messages");
    service.waiting().await?;

    if let Err(e) = session.shutdown().await {
        warn!(error = %e, "failed to stop interpreter bridge");
    }
    corpus.close().await;

    info!("MCP server shut down gracefully");

    Ok(())
}
