//! HintGuard CLI - validate workflow inputs against assertion hints

use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hintguard::config::{HintGuardConfig, OutputFormat};
use hintguard::convert::CwlTypeConverter;
use hintguard::error::{FixSuggestion, HintGuardError};
use hintguard::hint::HintRegistry;
use hintguard::runtime::{Orchestrator, WorkflowReport};
use hintguard::{load_document, load_inputs, report};

/// Exit code when any assertion failed or could not be checked
const EXIT_INVALID: i32 = 1;
/// Exit code for load and configuration errors
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "hintguard")]
#[command(about = "HintGuard - validate workflow inputs against assertion hints")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/hintguard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate inputs against every assertion hint of a workflow document
    Check {
        /// Path to the CWL document (single process or $graph)
        workflow: PathBuf,

        /// Path to the inputs YAML/JSON mapping
        #[arg(short, long)]
        inputs: PathBuf,

        /// Report format (overrides config and HINTGUARD_FORMAT)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print the resolved assertion hints without validating
    Hints {
        /// Path to the CWL document
        workflow: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: DeclarationFormat,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file (to --config, or the user config path)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration (file + environment)
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeclarationFormat {
    Yaml,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // init creates the file every other command loads
    if let Commands::Config {
        action: ConfigAction::Init { force },
    } = cli.command
    {
        match init_config(cli.config.as_deref(), force) {
            Ok(code) => process::exit(code),
            Err(e) => fail(&e),
        }
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check {
            workflow,
            inputs,
            format,
        } => check(&workflow, &inputs, format, &config),
        Commands::Hints { workflow, format } => print_hints(&workflow, format, &config),
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(&config),
            ConfigAction::Init { .. } => Ok(0),
        },
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => fail(&e),
    }
}

fn fail(e: &HintGuardError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), e);
    if let Some(suggestion) = e.fix_suggestion() {
        eprintln!("  {} {}", "Fix:".yellow(), suggestion);
    }
    process::exit(EXIT_ERROR);
}

fn load_config(path: Option<&Path>) -> Result<HintGuardConfig, HintGuardError> {
    let config = match path {
        Some(path) => HintGuardConfig::load_from(path)?,
        None => HintGuardConfig::load()?,
    };
    Ok(config.with_env())
}

fn check(
    workflow: &Path,
    inputs: &Path,
    format: Option<OutputFormat>,
    config: &HintGuardConfig,
) -> Result<i32, HintGuardError> {
    let started = Utc::now();

    let document = load_document(workflow)?;
    let inputs = load_inputs(inputs)?;
    info!(
        processes = document.processes.len(),
        inputs = inputs.len(),
        "Loading took {} ms",
        (Utc::now() - started).num_milliseconds()
    );

    let orchestrator = Orchestrator::new(HintRegistry::with_builtin(config.namespace()));
    let validation_started = Utc::now();
    let reports = orchestrator.validate_document(&document, &inputs);
    info!(
        "Validation took {} ms",
        (Utc::now() - validation_started).num_milliseconds()
    );

    let format = format.unwrap_or(config.output.format);
    println!("{}", report::render(&reports, format)?);

    info!(
        total_ms = (Utc::now() - started).num_milliseconds(),
        "VALIDATION COMPLETE"
    );

    Ok(if reports.iter().all(WorkflowReport::is_clean) {
        0
    } else {
        EXIT_INVALID
    })
}

fn print_hints(
    workflow: &Path,
    format: DeclarationFormat,
    config: &HintGuardConfig,
) -> Result<i32, HintGuardError> {
    let document = load_document(workflow)?;
    let registry = HintRegistry::with_builtin(config.namespace());
    let declarations = report::hint_declarations(&document, &registry, &CwlTypeConverter);

    let rendered = match format {
        DeclarationFormat::Yaml => serde_yaml::to_string(&declarations)?,
        DeclarationFormat::Json => serde_json::to_string_pretty(&declarations)?,
    };
    println!("{}", rendered);

    Ok(0)
}

fn init_config(path: Option<&Path>, force: bool) -> Result<i32, HintGuardError> {
    let path = path.map_or_else(HintGuardConfig::config_path, Path::to_path_buf);
    HintGuardConfig::init(&path, force)?;
    println!(
        "{} Wrote default config to {}",
        "✓".green(),
        path.display().to_string().bold()
    );
    Ok(0)
}

fn show_config(config: &HintGuardConfig) -> Result<i32, HintGuardError> {
    print!("{}", config.to_toml()?);
    Ok(0)
}
