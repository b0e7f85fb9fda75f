//! Inspect what a loader configuration resolves to
//!
//! Builds a delegating loader (rooted at an empty bootstrap loader) from a
//! config file and/or command-line flags, runs one lookup and prints the
//! result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use unit_loader::utils::init_logging_from_config;
use unit_loader::{
    BootstrapLoader, DelegatingLoader, EmbeddedArchiveExtractor, LoaderConfig, LoggingConfig,
    ResourceLocator, ResourcePath, UnitLoader, UnitName,
};

#[derive(Parser, Debug)]
#[command(name = "unit-loader", version, about = "Resolve units and resources from archive lists")]
struct Args {
    /// Loader config file (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Archive list, overrides the config file
    #[arg(short, long)]
    archives: Option<String>,

    /// Parent-first prefix (repeatable), appended to the config file's list
    #[arg(short = 'p', long = "parent-first")]
    parent_first: Vec<String>,

    /// Log filter (RUST_LOG still takes precedence)
    #[arg(long)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a unit by dotted name
    Load { unit: String },
    /// First match for a resource path
    Resource { path: String },
    /// All matches for a resource path
    Resources { path: String },
    /// List the resolved archive sources
    Sources,
}

fn locator_json(locator: &ResourceLocator) -> serde_json::Value {
    json!({
        "locator": locator.to_string(),
        "archive": locator.archive().map(|p| p.display().to_string()),
    })
}

fn build_config(args: &Args) -> anyhow::Result<LoaderConfig> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => LoaderConfig::default(),
    };
    if let Some(archives) = &args.archives {
        config.archive_path = archives.clone();
    }
    config.parent_first.extend(args.parent_first.iter().cloned());
    if args.log.is_some() {
        let logging = config.logging.get_or_insert_with(LoggingConfig::default);
        logging.filter = args.log.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = build_config(&args)?;
    init_logging_from_config(config.logging.as_ref());

    let containers = EmbeddedArchiveExtractor::from_config(&config);
    let loader = DelegatingLoader::new(&config, Arc::new(BootstrapLoader::new()), &containers)?;

    let (output, code) = match &args.command {
        Command::Load { unit } => match loader.load_unit(&UnitName::new(unit.as_str())?) {
            Ok(unit) => (
                json!({
                    "unit": unit.name,
                    "size": unit.len(),
                    "origin": unit.origin,
                }),
                ExitCode::SUCCESS,
            ),
            Err(e) if e.is_not_found() => (json!({ "error": e.to_string() }), ExitCode::FAILURE),
            Err(e) => return Err(e.into()),
        },
        Command::Resource { path } => {
            let found = loader.find_resource(&ResourcePath::new(path))?;
            (
                json!({ "path": path, "match": found.as_ref().map(locator_json) }),
                ExitCode::SUCCESS,
            )
        }
        Command::Resources { path } => {
            let found = loader.find_all_resources(&ResourcePath::new(path))?;
            let matches: Vec<_> = found.iter().map(locator_json).collect();
            (json!({ "path": path, "matches": matches }), ExitCode::SUCCESS)
        }
        Command::Sources => {
            let sources: Vec<_> = loader
                .archive_sources()
                .iter()
                .map(|s| {
                    json!({
                        "origin": s.origin().raw(),
                        "archive": s.archive().display().to_string(),
                        "entries": s.entry_count(),
                    })
                })
                .collect();
            (json!({ "sources": sources }), ExitCode::SUCCESS)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
