//! Binary entrypoint for the questgraph CLI.
//!
//! Commands:
//! - `validate [--report <path>]` - check the prerequisite graph (the default command)
//! - `simulate [--completed <id>...] [--completed-file <path>]` - quest availability
//! - `fix [--dry-run]` - link multi-part quest chains and save the dataset
//! - `suspects` - list quests that probably lack prerequisites
//! - `import --input <raw.json> [--output <path>]` - convert a raw task export
//! - `init [--force]` - write a starter `questgraph.toml`
//!
//! Exit status is 1 when validation finds errors or cycles.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use questgraph::config::Config;
use questgraph::logutil::{escape_log, init_logging};
use questgraph::questdb::{
    apply_fixes, find_suspicious_quests, import_file, plan_repairs, render_availability,
    render_fixes, render_suspects, render_validation_summary, simulate, write_report,
    AvailabilityReport, Dataset, FixReport, QuestIndex, QuestStore, SuspectReport,
    ValidationReport, Validator, DATASET_VERSION,
};

#[derive(Parser)]
#[command(name = "questgraph")]
#[command(about = "Validate and repair a quest prerequisite dataset")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "questgraph.toml", global = true)]
    config: String,

    /// Dataset path, overriding `[dataset] path` from the configuration
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every structural check and write the validation report
    Validate {
        /// Report path, overriding `[reports] validation`
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Simulate quest availability for a set of completed quests
    Simulate {
        /// Completed quest id (repeatable)
        #[arg(long = "completed", value_name = "ID")]
        completed: Vec<String>,
        /// JSON file holding an array of completed quest ids
        #[arg(long, value_name = "PATH")]
        completed_file: Option<PathBuf>,
    },
    /// Add missing "Part N-1" prerequisites to multi-part quest chains
    Fix {
        /// Write the fix report without touching the dataset
        #[arg(long)]
        dry_run: bool,
    },
    /// List quests without prerequisites that look like they need some
    Suspects,
    /// Build a dataset from a raw task export
    Import {
        /// Raw task export (JSON array or GraphQL response)
        #[arg(short, long)]
        input: PathBuf,
        /// Output dataset path (defaults to the configured dataset)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let Cli {
        command,
        config: config_path,
        dataset,
        verbose,
    } = Cli::parse();

    match command.unwrap_or(Commands::Validate { report: None }) {
        Commands::Init { force } => {
            init_logging(None, verbose);
            run_init(&config_path, force).await
        }
        Commands::Validate { report } => {
            let (config, store) = prepare(&config_path, dataset, verbose).await?;
            let dataset = store.load()?;
            let report_path = report.unwrap_or_else(|| PathBuf::from(&config.reports.validation));
            run_validate(&config, &dataset, &report_path)
        }
        Commands::Simulate {
            completed,
            completed_file,
        } => {
            let (config, store) = prepare(&config_path, dataset, verbose).await?;
            let dataset = store.load()?;
            run_simulate(&config, &dataset, completed, completed_file.as_deref()).await
        }
        Commands::Fix { dry_run } => {
            let (config, store) = prepare(&config_path, dataset, verbose).await?;
            run_fix(&config, &store, dry_run)
        }
        Commands::Suspects => {
            let (config, store) = prepare(&config_path, dataset, verbose).await?;
            let dataset = store.load()?;
            run_suspects(&config, &dataset)
        }
        Commands::Import { input, output } => {
            let (_, store) = prepare(&config_path, dataset, verbose).await?;
            let target = output.map(QuestStore::new).unwrap_or(store);
            run_import(&input, &target)
        }
    }
}

/// Load the configuration, start logging and open the dataset store.
async fn prepare(config_path: &str, dataset: Option<PathBuf>, verbose: u8) -> Result<(Config, QuestStore)> {
    let config = Config::load_or_default(config_path).await?;
    init_logging(Some(&config.logging), verbose);

    let dataset_path = dataset.unwrap_or_else(|| PathBuf::from(&config.dataset.path));
    let store = QuestStore::new(dataset_path);
    Ok((config, store))
}

async fn run_init(config_path: &str, force: bool) -> Result<ExitCode> {
    if !force && tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        warn!("{} already exists; use --force to overwrite", config_path);
        return Ok(ExitCode::FAILURE);
    }
    Config::create_default(config_path).await?;
    info!("Configuration file created at {}", config_path);
    Ok(ExitCode::SUCCESS)
}

fn validate_and_report(config: &Config, dataset: &Dataset, report_path: &Path) -> Result<ExitCode> {
    let outcome = Validator::new(config.validation_options()).run(dataset);
    let report = ValidationReport::emit(dataset, &outcome);
    write_report(report_path, &report)
        .with_context(|| format!("writing {}", report_path.display()))?;
    println!("{}", render_validation_summary(&report));
    info!("Validation report written to {}", report_path.display());

    Ok(if report.has_blocking_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_validate(config: &Config, dataset: &Dataset, report_path: &Path) -> Result<ExitCode> {
    info!(
        "Validating {} quests across {} NPCs",
        dataset.quest_count(),
        dataset.npcs.len()
    );
    validate_and_report(config, dataset, report_path)
}

async fn run_simulate(
    config: &Config,
    dataset: &Dataset,
    mut completed: Vec<String>,
    completed_file: Option<&Path>,
) -> Result<ExitCode> {
    if let Some(path) = completed_file {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let ids: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("{} must hold a JSON array of quest ids", path.display()))?;
        completed.extend(ids);
    }
    let mut seen = HashSet::new();
    completed.retain(|id| seen.insert(id.clone()));

    let index = QuestIndex::build(dataset);
    for id in completed.iter().filter(|id| !index.contains(id)) {
        warn!("completed quest '{}' is not in the dataset", escape_log(id));
    }

    let availability = simulate(dataset, &index, &seen);
    let report = AvailabilityReport::emit(dataset, &completed, &availability);
    let path = PathBuf::from(&config.reports.availability);
    write_report(&path, &report).with_context(|| format!("writing {}", path.display()))?;
    println!("{}", render_availability(&report));
    info!("Availability report written to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn run_fix(config: &Config, store: &QuestStore, dry_run: bool) -> Result<ExitCode> {
    let dataset = store.load()?;
    let proposed = plan_repairs(&dataset);
    let fixes_path = PathBuf::from(&config.reports.fixes);

    if dry_run {
        let report = FixReport::dry_run(proposed);
        write_report(&fixes_path, &report)?;
        println!("{}", render_fixes(&report));
        return Ok(ExitCode::SUCCESS);
    }

    let (mut repaired, summary) = apply_fixes(dataset, &proposed);
    let report = FixReport::new(proposed, Some(summary));
    write_report(&fixes_path, &report)?;
    println!("{}", render_fixes(&report));

    if summary.applied > 0 {
        repaired.touch();
        store.save(&repaired)?;
    } else {
        info!("No changes to save");
    }

    if config.repair.revalidate_after_apply {
        let report_path = PathBuf::from(&config.reports.validation);
        return validate_and_report(config, &repaired, &report_path);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_import(input: &Path, target: &QuestStore) -> Result<ExitCode> {
    let mut dataset = import_file(input, DATASET_VERSION)?;
    dataset.touch();
    target.save(&dataset)?;
    println!(
        "Imported {} quests for {} NPCs into {}",
        dataset.quest_count(),
        dataset.npcs.len(),
        target.path().display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_suspects(config: &Config, dataset: &Dataset) -> Result<ExitCode> {
    let index = QuestIndex::build(dataset);
    let report = SuspectReport {
        suspicious_quests: find_suspicious_quests(dataset, &index),
    };
    let path = PathBuf::from(&config.reports.suspects);
    write_report(&path, &report)?;
    println!("{}", render_suspects(&report));
    Ok(ExitCode::SUCCESS)
}
