// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! calltrace main entry point - CLI for calling tools and reading the call log.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::{debug, info, info_span};

use calltrace::config::{self, CliOptions, ServerConfig, StoreKind};
use calltrace::log_store::{duration_to_ms, open_store, LogRecord, LogStatus, SharedLogStore};
use calltrace::telemetry::{
    init_telemetry, CorrelationId, TelemetryConfig, Verbosity, GLOBAL_METRICS,
};
use calltrace::tools::ToolRegistry;
use calltrace::types::CallContext;

/// calltrace version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of rows for `logs recent`.
const DEFAULT_RECENT_LIMIT: usize = 20;

/// calltrace - correlated call logging for tool servers.
#[derive(Parser)]
#[command(name = "calltrace")]
#[command(author, version, about = "Call tools and inspect their correlated log", long_about = None)]
struct Cli {
    /// Configuration file (skips workspace discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log database file
    #[arg(long, global = true, env = "CALLTRACE_DB")]
    db: Option<PathBuf>,

    /// Log store backend
    #[arg(long, global = true)]
    store: Option<StoreArg>,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Store backends selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreArg {
    /// SQLite database file
    Sqlite,
    /// In-process store, discarded on exit
    Memory,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Sqlite => StoreKind::Sqlite,
            StoreArg::Memory => StoreKind::Memory,
        }
    }
}

/// Subcommands for calltrace.
#[derive(Subcommand)]
enum Commands {
    /// List available tools
    Tools {
        /// Print definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call a tool through the instrumented registry
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Correlation identifier (generated when omitted)
        #[arg(long)]
        correlation_id: Option<String>,

        /// Print the metrics report to stderr after the call
        #[arg(long)]
        metrics: bool,
    },

    /// Query the call log
    Logs {
        /// Print records as JSON
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        action: LogsAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show version information
    Version,
}

/// Logs subcommand actions.
#[derive(Subcommand)]
enum LogsAction {
    /// Records with exactly this correlation identifier
    Id { id: String },
    /// Records whose correlation identifier starts with a prefix
    Prefix { prefix: String },
    /// The most recent record for a tool
    Latest { tool: String },
    /// The most recent records for a tool, newest first
    Recent {
        tool: String,
        #[arg(short = 'n', long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_flags(cli.verbose, cli.debug);
    let log_level = match verbosity {
        Verbosity::Debug => Some("trace".to_string()),
        Verbosity::Verbose => Some("debug".to_string()),
        Verbosity::Normal => None,
    };
    let cli_options = CliOptions {
        log_level,
        store: cli.store.map(StoreKind::from),
        database: cli.db,
    };

    let config = match &cli.config {
        Some(path) => config::load_config_from(path, cli_options)?,
        None => config::load_config(&std::env::current_dir()?, cli_options)?,
    };

    let telemetry = TelemetryConfig::for_cli(&config.log_level, verbosity)
        .with_ansi(std::io::stderr().is_terminal());
    let _guard = init_telemetry(&telemetry)?;

    handle_command(cli.command, &config).await
}

/// Open the store and registry inside a span tagged with a startup identifier.
fn bootstrap(config: &ServerConfig) -> anyhow::Result<(SharedLogStore, ToolRegistry)> {
    let startup_id = CorrelationId::startup();
    let span = info_span!("bootstrap", correlation_id = %startup_id);
    let _enter = span.enter();

    let store = open_store(config)?;
    let registry = ToolRegistry::instrumented(store.clone());
    info!(
        store = ?config.store,
        tools = registry.len(),
        "Server bootstrapped"
    );

    Ok((store, registry))
}

async fn handle_command(command: Commands, config: &ServerConfig) -> anyhow::Result<()> {
    match command {
        Commands::Tools { json } => {
            let registry = ToolRegistry::with_defaults();
            if json {
                println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
            } else {
                for def in registry.definitions() {
                    println!("{} - {}", def.name.bright_white().bold(), def.description);
                }
            }
        }
        Commands::Call {
            tool,
            args,
            correlation_id,
            metrics,
        } => {
            let input: serde_json::Value = serde_json::from_str(&args)?;
            let (_store, registry) = bootstrap(config)?;
            call_tool(&registry, &tool, input, correlation_id, metrics).await?;
        }
        Commands::Logs { json, action } => {
            let (store, _) = bootstrap(config)?;
            let records = match action {
                LogsAction::Id { id } => store.query_by_correlation_id(&id).await?,
                LogsAction::Prefix { prefix } => store.query_by_correlation_prefix(&prefix).await?,
                LogsAction::Latest { tool } => {
                    store.query_latest_by_tool(&tool).await?.into_iter().collect()
                }
                LogsAction::Recent { tool, limit } => {
                    store.query_recent_by_tool(&tool, limit).await?
                }
            };
            print_records(&records, json)?;
        }
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("{}", serde_json::to_string_pretty(config)?);
                println!("{} {}", "database:".dimmed(), config.database_path().display());
            }
        },
        Commands::Version => {
            println!("calltrace {VERSION}");
        }
    }
    Ok(())
}

async fn call_tool(
    registry: &ToolRegistry,
    tool: &str,
    input: serde_json::Value,
    correlation_id: Option<String>,
    show_metrics: bool,
) -> anyhow::Result<()> {
    let ctx = match correlation_id {
        Some(id) => CallContext::with_correlation_id(id),
        None => CallContext::new(),
    };
    let (_, _, lost_before) = GLOBAL_METRICS.record_counts();

    let result = registry.dispatch(tool, &ctx, input).await?;
    debug!(
        tool,
        duration_ms = duration_to_ms(result.duration),
        "Call finished"
    );

    if result.is_error {
        eprintln!("{} {}", "error:".red().bold(), result.output.content());
    } else {
        println!("{}", result.output.content());
    }

    let (_, _, lost_after) = GLOBAL_METRICS.record_counts();
    if lost_after > lost_before {
        eprintln!("{}", "warning: call record was not persisted".yellow());
    } else {
        eprintln!(
            "{} {}",
            "correlation_id:".dimmed(),
            result.correlation_id.as_str().cyan()
        );
    }

    let report = GLOBAL_METRICS.snapshot().format_report();
    if show_metrics {
        eprint!("{report}");
    } else {
        debug!("{report}");
    }

    if result.is_error {
        bail!("tool {tool} failed");
    }
    Ok(())
}

fn print_records(records: &[LogRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No records found".dimmed());
        return Ok(());
    }

    for record in records {
        let status = match record.status {
            LogStatus::Success => record.status.as_str().green(),
            LogStatus::Error => record.status.as_str().red(),
        };
        println!(
            "{}  {}  {}  {}  {}ms{}",
            calltrace::log_store::format_timestamp(&record.started_at).dimmed(),
            record.correlation_id.as_str().cyan(),
            record.tool_name.bright_white(),
            status,
            record.duration_ms,
            record
                .error_detail
                .as_deref()
                .map(|detail| format!("  {detail}"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}
