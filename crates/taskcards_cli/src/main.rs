//! `taskcards` command-line entry point.
//!
//! # Responsibility
//! - Load configuration and apply command-line overrides.
//! - Own the task store for the whole process: open, use, close.
//! - Wire a task source and the text card printer into one cycle.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use taskcards_core::config::default_config_path;
use taskcards_core::{
    init_logging, AppConfig, CycleOutcome, DedupPolicy, Extractor, JsonFileExtractor,
    Orchestrator, SqliteTaskStore, StaticExtractor, TaskStore, TextCardPrinter,
};

#[derive(Parser)]
#[command(name = "taskcards")]
#[command(about = "Deduplicate reminder tasks and print new ones as cards")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Task database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one extraction cycle
    Run {
        /// JSON file with the extracted task batch
        #[arg(long, required_unless_present = "demo", conflicts_with = "demo")]
        tasks: Option<PathBuf>,

        /// Use the built-in sample batch
        #[arg(long)]
        demo: bool,

        /// Print a card for every newly stored task
        #[arg(long)]
        print: bool,

        /// Dedup distance threshold
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Show stored tasks closest to a name
    Similar {
        name: String,

        /// Maximum results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// List every stored task
    List,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(log_dir) = &config.logging.dir {
        init_logging(config.logging.effective_level(), log_dir)?;
    }

    let db_path = config.db_path()?;
    let mut store = SqliteTaskStore::open(&db_path)
        .with_context(|| format!("cannot open task database `{}`", db_path.display()))?;

    let result = match cli.command {
        Command::Run {
            tasks,
            demo,
            print,
            threshold,
        } => {
            let policy = DedupPolicy::new(threshold.unwrap_or(config.dedup.threshold))?;
            let extractor: Box<dyn Extractor> = match (demo, tasks) {
                (true, _) => Box::new(StaticExtractor::sample(chrono::Utc::now())),
                (false, Some(path)) => Box::new(JsonFileExtractor::new(path)),
                (false, None) => anyhow::bail!("either --tasks or --demo is required"),
            };
            Ok(run_cycle(
                &mut store,
                policy,
                extractor.as_ref(),
                print || config.printer.enabled,
            ))
        }
        Command::Similar { name, limit } => show_similar(&store, &name, limit),
        Command::List => list_tasks(&store),
    };

    // The cycle result is already reported; a close failure only warns.
    if let Err(err) = store.close() {
        warn!("event=store_close module=cli status=error error={err}");
        eprintln!("warning: {err}");
    }

    result
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.logging.dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }

    Ok(config)
}

fn run_cycle(
    store: &mut SqliteTaskStore,
    policy: DedupPolicy,
    extractor: &dyn Extractor,
    print: bool,
) -> ExitCode {
    let printer = TextCardPrinter::new(io::stdout());
    let mut orchestrator = Orchestrator::new(store, policy);
    if print {
        orchestrator = orchestrator.with_printer(&printer);
    }

    let report = orchestrator.run_cycle(extractor);
    print!("{}", report.render());

    match report.outcome {
        CycleOutcome::SourceUnavailable(_) => ExitCode::FAILURE,
        CycleOutcome::Completed | CycleOutcome::NoTasks => ExitCode::SUCCESS,
    }
}

fn show_similar(store: &SqliteTaskStore, name: &str, limit: usize) -> Result<ExitCode> {
    let results = store.query_by_name(name, limit)?;
    if results.is_empty() {
        println!("No stored tasks");
    }
    for result in results {
        println!(
            "{:.3}  {}  [{}]  {}",
            result.similarity_distance,
            result.record.name,
            result.record.priority.label(),
            result.record_id
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn list_tasks(store: &SqliteTaskStore) -> Result<ExitCode> {
    let tasks = store.list_all()?;
    println!("{} stored tasks", tasks.len());
    for stored in tasks {
        let record = &stored.record;
        println!(
            "{}  {}  [{}]  due={}  list={}  created={}{}",
            stored.id,
            record.name,
            record.priority.label(),
            record.due_date.as_deref().unwrap_or("-"),
            record.list_name.as_deref().unwrap_or("-"),
            record.created_at,
            if record.completed { "  (done)" } else { "" }
        );
    }
    Ok(ExitCode::SUCCESS)
}
