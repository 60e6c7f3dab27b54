//! CLI entry point for cfgo-watch.
//!
//! This binary watches every Go module in a workspace and regenerates Go
//! sources from JSON configuration files as they change.
//!
//! # Usage
//!
//! ```bash
//! cfgo-watch [OPTIONS] [COMMAND]
//!
//! # Watch the current directory (default command)
//! cfgo-watch
//!
//! # Watch another workspace with a custom generator binary
//! cfgo-watch --path ~/src/services --generator /opt/bin/cfgo watch
//!
//! # List discovered modules
//! cfgo-watch scan --format json
//!
//! # Regenerate one file and exit
//! cfgo-watch generate services/billing/config/settings.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use cw_core::{ChangeEvent, Config, ConfigError, ModuleRoot};
use cw_generator::{ConsoleSink, Dispatcher, TokioRunner};
use cw_scanner::DiscoveryReport;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Regenerates Go sources whenever a module's JSON configuration changes.
///
/// Every directory containing a `go.mod` is a module. Files written to a
/// module's `config/*.json` are passed to `cfgo`, which writes
/// `config/generated/*.go`.
#[derive(Parser)]
#[command(name = "cfgo-watch", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute (defaults to `watch`).
    #[command(subcommand)]
    command: Option<Commands>,

    /// Workspace root to scan and watch.
    ///
    /// Defaults to the current directory.
    #[arg(short, long, global = true, env = "CFGO_WATCH_PATH")]
    path: Option<Utf8PathBuf>,

    /// JSON configuration file.
    ///
    /// Values from the file are overridden by command-line options.
    #[arg(short, long, global = true, env = "CFGO_WATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Generator program to run (defaults to `cfgo`).
    #[arg(short, long, global = true, env = "CFGO_WATCH_GENERATOR")]
    generator: Option<String>,

    /// Coalesce change notifications within this many milliseconds.
    ///
    /// 0 (the default) runs the generator once per notification.
    #[arg(long, global = true, env = "CFGO_WATCH_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Watch the workspace and regenerate on every configuration change.
    Watch,

    /// Discover modules once and list them.
    Scan {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ScanFormat::Text)]
        format: ScanFormat,
    },

    /// Run the generator for a single configuration file and exit.
    Generate {
        /// Configuration file, e.g. `svc/config/settings.json`.
        file: Utf8PathBuf,
    },
}

/// Scan output format.
#[derive(Clone, Copy, ValueEnum)]
enum ScanFormat {
    /// Human-readable list.
    Text,
    /// JSON array.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// The `notify` and `ignore` crates are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,ignore=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds a [`Config`] from defaults, the optional config file and CLI arguments.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or the result is invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .wrap_err_with(|| format!("Failed to load configuration from {path}"))?,
        None => Config::default(),
    };

    if let Some(path) = &cli.path {
        config.discovery.workspace_root.clone_from(path);
    }
    if let Some(generator) = &cli.generator {
        config.generator.command.clone_from(generator);
    }
    if let Some(debounce_ms) = cli.debounce_ms {
        config.watch.debounce_ms = debounce_ms;
    }

    let root = &config.discovery.workspace_root;
    if !root.exists() {
        return Err(ConfigError::MissingDirectory(root.clone()).into());
    }
    if !root.is_dir() {
        return Err(ConfigError::invalid_path(root.clone(), "not a directory").into());
    }

    config.validate()?;
    Ok(config)
}

/// Returns the module root owning a configuration file.
///
/// The file must sit directly inside the module's configuration directory.
fn module_root_for(file: &Utf8Path, config: &Config) -> color_eyre::Result<ModuleRoot> {
    let config_dir = file
        .parent()
        .filter(|dir| dir.file_name() == Some(config.layout.config_dir.as_str()))
        .ok_or_else(|| {
            eyre!(
                "{file} is not inside a `{}` directory",
                config.layout.config_dir
            )
        })?;

    let root = config_dir
        .parent()
        .ok_or_else(|| eyre!("{config_dir} has no parent module directory"))?;

    if !root.join(&config.discovery.manifest_name).is_file() {
        tracing::warn!(root = %root, "No {} next to the configuration directory", config.discovery.manifest_name);
    }

    Ok(ModuleRoot::new(root))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the daemon until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the daemon cannot start.
async fn run_watch(config: Config) -> color_eyre::Result<()> {
    info!(
        root = %config.discovery.workspace_root,
        generator = %config.generator.command,
        "Starting cfgo-watch"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_token.cancel();
    });

    cw_daemon::run(config, shutdown)
        .await
        .map_err(|e| eyre!("Daemon error: {}", e))
}

/// Resolves when the process is asked to stop.
async fn wait_for_shutdown_signal() {
    // Handle SIGTERM for graceful shutdown on Unix
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "Cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl-C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C, shutting down");
    }
}

/// Runs a one-shot discovery and prints the modules found.
///
/// # Errors
///
/// Returns an error if the workspace cannot be walked or output fails.
fn run_scan(config: &Config, format: ScanFormat) -> color_eyre::Result<()> {
    let report = cw_scanner::discover_all(&config.discovery)?;

    let content = match format {
        ScanFormat::Text => render_text(&report, config),
        ScanFormat::Json => render_json(&report, config)?,
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{content}")?;

    if !report.errors.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle)?;
        writeln!(handle, "Skipped entries ({}):", report.errors.len())?;
        for error in &report.errors {
            writeln!(handle, "  {error}")?;
        }
    }

    Ok(())
}

/// Runs the generator once for `file`.
///
/// # Errors
///
/// Returns an error if the file is not inside a module's configuration
/// directory or the generator fails.
async fn run_generate(config: Config, file: &Utf8Path) -> color_eyre::Result<()> {
    let file = file
        .canonicalize_utf8()
        .wrap_err_with(|| format!("Cannot resolve {file}"))?;
    let root = module_root_for(&file, &config)?;

    let dispatcher = Dispatcher::new(
        config.generator,
        config.layout,
        Arc::new(TokioRunner),
        Arc::new(ConsoleSink),
    );

    dispatcher
        .on_change(ChangeEvent::new(root, file))
        .await
        .map(|_| ())
        .wrap_err("Generation failed")
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// One row of `scan` output.
#[derive(serde::Serialize)]
struct ModuleRow {
    root: ModuleRoot,
    config_dir: Utf8PathBuf,
    watched: bool,
}

fn module_rows(report: &DiscoveryReport, config: &Config) -> Vec<ModuleRow> {
    report
        .roots
        .iter()
        .map(|root| {
            let config_dir = root.config_dir(&config.layout);
            ModuleRow {
                root: root.clone(),
                watched: config_dir.is_dir(),
                config_dir,
            }
        })
        .collect()
}

/// Renders the scan report as a human-readable list.
fn render_text(report: &DiscoveryReport, config: &Config) -> String {
    use std::fmt::Write;

    let rows = module_rows(report, config);
    let watched = rows.iter().filter(|row| row.watched).count();

    let mut output = String::new();
    let _ = writeln!(output, "Modules ({}, {watched} watchable):", rows.len());
    for row in &rows {
        let marker = if row.watched {
            "watch"
        } else {
            "no config dir"
        };
        let _ = writeln!(output, "  {}  [{marker}]", row.root);
    }
    output
}

/// Renders the scan report as JSON.
fn render_json(report: &DiscoveryReport, config: &Config) -> color_eyre::Result<String> {
    let rows = module_rows(report, config);
    let mut json = serde_json::to_string_pretty(&rows)
        .map_err(|e| eyre!("Failed to serialize JSON: {}", e))?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Merge configuration sources
    let config = build_config(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        None | Some(Commands::Watch) => run_watch(config).await,
        Some(Commands::Scan { format }) => run_scan(&config, *format),
        Some(Commands::Generate { file }) => run_generate(config, file).await,
    }
}
