//! impex - command-line front end for the import orchestration core
//!
//! ```bash
//! impex list [--json]
//! impex import OpmlFeeds --path feeds.opml --option folder=News --output items.jsonl
//! ```
//!
//! Imported entries are written as JSON lines (stdout unless `--output`);
//! progress and logs go to stderr. Ctrl+C requests cancellation, a second
//! Ctrl+C abandons the run.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use impex_common::config::{load_config, resolve_config_path};
use impex_common::{ExchangeEvent, OperationResult};
use impex_import::config::{resolve_options, resolve_source_path};
use impex_import::{
    ImportCommand, ImportError, ImportSession, ImportSink, ImporterRegistry, JsonLinesSink,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code for a run the user cancelled (128 + SIGINT)
const EXIT_CANCELLED: u8 = 130;

/// Command-line arguments for impex
#[derive(Parser, Debug)]
#[command(name = "impex")]
#[command(about = "Import bookmarks, notes, feeds, search engines and sessions")]
#[command(version)]
struct Cli {
    /// Config file (overrides IMPEX_CONFIG and the platform default)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered import formats
    List {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one import
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Format identifier (see `impex list`)
    format: String,

    /// Source file (defaults to the importer's suggested path)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Importer option, repeatable
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Write imported entries to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Give up after SECS seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(
        config = ?resolve_config_path(cli.config.as_deref()),
        "Configuration loaded"
    );

    let registry = ImporterRegistry::with_builtin_importers();

    match cli.command {
        Command::List { json } => list_formats(&registry, json),
        Command::Import(args) => import(&registry, &config, args).await,
    }
}

fn list_formats(registry: &ImporterRegistry, json: bool) -> Result<ExitCode> {
    let descriptors = registry.descriptors();

    if json {
        let descriptors: Vec<_> = descriptors.into_iter().map(|(_, d)| d).collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(ExitCode::SUCCESS);
    }

    for (identifier, descriptor) in descriptors {
        println!("{:<20} {}", identifier, descriptor.title);
        println!("{:<20} path:    {}", "", descriptor.suggested_path.display());
        let filters: Vec<String> = descriptor.file_filters.iter().map(ToString::to_string).collect();
        println!("{:<20} filters: {}", "", filters.join(";; "));
        if descriptor.has_options {
            println!("{:<20} options: yes", "");
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn import(
    registry: &ImporterRegistry,
    config: &impex_common::config::TomlConfig,
    args: ImportArgs,
) -> Result<ExitCode> {
    let importer = match registry.resolve(&args.format) {
        Ok(importer) => importer,
        Err(ImportError::UnknownFormat(format)) => {
            let valid: Vec<&str> = registry.identifiers().collect();
            anyhow::bail!(
                "unknown import format '{}' (valid formats: {})",
                format,
                valid.join(", ")
            );
        }
        Err(e) => return Err(e.into()),
    };

    let descriptor = importer.descriptor();
    let source_path = resolve_source_path(args.path.as_deref(), config, &descriptor);
    let options = resolve_options(
        importer.default_options(),
        config,
        &descriptor.identifier,
        &args.options,
    )?;

    let sink: Arc<dyn ImportSink> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Arc::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Arc::new(JsonLinesSink::stdout()),
    };

    let mut session = ImportSession::new(importer).with_sink(sink);
    let mut events = session.subscribe()?;

    info!(
        session_id = %session.id(),
        format = %descriptor.identifier,
        path = %source_path.display(),
        "Starting import"
    );
    session.start(ImportCommand::new(source_path).with_options(options))?;

    let deadline = async {
        match args.timeout {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut last_percent: Option<Option<u64>> = None;
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                render(&event, &mut last_percent);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                if cancel_requested {
                    warn!(session_id = %session.id(), "Second interrupt, abandoning import");
                    return Ok(ExitCode::from(EXIT_CANCELLED));
                }
                cancel_requested = true;
                if session.can_cancel() == Some(false) {
                    eprintln!("Cancellation requested; this import finishes its current step first");
                } else {
                    eprintln!("Cancelling...");
                }
                session.cancel()?;
            }
            _ = &mut deadline => {
                warn!(session_id = %session.id(), timeout_secs = ?args.timeout, "Import timed out");
                session.cancel()?;
                anyhow::bail!("import did not finish within {} seconds", args.timeout.unwrap_or_default());
            }
        }
    }

    let result = session.wait().await?;
    match result {
        OperationResult::Successful => {
            eprintln!("{}", result);
            Ok(ExitCode::SUCCESS)
        }
        OperationResult::Cancelled => {
            eprintln!("{}", result);
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        OperationResult::Failed => {
            match session.failure_summary() {
                Some(summary) => eprintln!("{} {}", result, summary),
                None => eprintln!("{}", result),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print a progress line whenever the whole-percent value changes
fn render(event: &ExchangeEvent, last_percent: &mut Option<Option<u64>>) {
    match event {
        ExchangeEvent::Started { exchange_type, total } => {
            if *total > 0 {
                eprintln!("Importing {} ({} entries)", exchange_type, total);
            } else {
                eprintln!("Importing {}", exchange_type);
            }
        }
        ExchangeEvent::Progress { .. } => {
            let snapshot = event.snapshot();
            let percent = snapshot.fraction().map(|f| (f * 100.0).floor() as u64);
            if *last_percent != Some(percent) {
                eprintln!("  {}", snapshot.display());
                *last_percent = Some(percent);
            }
        }
        ExchangeEvent::Finished { .. } => {}
    }
}
