mod logging;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use rowproof::db::{job_repo, proof_repo};
use rowproof::parser::extract_proof_fields_now;
use rowproof::{
    build_blob_store, build_recognizer, load_config, BatchOptions, Config, Database,
    ExtractionPipeline, ExtractionStatus, PipelineConfig,
};

use logging::LogFormat;

#[derive(Parser)]
#[command(name = "rowproof")]
#[command(about = "Extracts and validates workout proof images", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "ROWPROOF_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lease and process one batch of extraction jobs
    Run {
        /// Overrides pipeline.maxJobs
        #[arg(long)]
        max_jobs: Option<usize>,
    },
    /// Queue extraction for a proof image
    Enqueue { proof_image_id: String },
    /// Move a failed job back to the queue
    Requeue { proof_image_id: String },
    /// Run the text parser on a file, or on stdin with `-`
    Parse { input: String },
    /// Print job counts per status
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::Parse { input } => parse_command(&input),
        Commands::Run { max_jobs } => {
            let (config, db) = open(config_path)?;
            run_command(&config, db, max_jobs)
        }
        Commands::Enqueue { proof_image_id } => {
            let (_, db) = open(config_path)?;
            enqueue_command(&db, &proof_image_id)
        }
        Commands::Requeue { proof_image_id } => {
            let (_, db) = open(config_path)?;
            requeue_command(&db, &proof_image_id)
        }
        Commands::Status => {
            let (_, db) = open(config_path)?;
            status_command(&db)
        }
    }
}

fn open(config_path: Option<PathBuf>) -> Result<(Config, Database)> {
    let config_path = resolve_config_path(config_path)?;
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let db = Database::open(Path::new(&config.database_path))
        .with_context(|| format!("opening database {}", config.database_path))?;
    Ok((config, db))
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match dirs::config_dir() {
        Some(dir) => Ok(dir.join("rowproof").join("config.json")),
        None => bail!("no config directory found; pass --config or set ROWPROOF_CONFIG"),
    }
}

fn run_command(config: &Config, db: Database, max_jobs: Option<usize>) -> Result<()> {
    let blob_store = build_blob_store(&config.storage)?;
    let recognizer = build_recognizer(&config.recognizer)?;
    let pipeline = ExtractionPipeline::new(
        db,
        blob_store,
        recognizer,
        PipelineConfig::from_config(config),
    );

    let report = pipeline.run_batch(BatchOptions { max_jobs })?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn enqueue_command(db: &Database, proof_image_id: &str) -> Result<()> {
    if proof_repo::find_by_id(db, proof_image_id)?.is_none() {
        warn!(
            proof_image_id,
            "Proof image does not exist yet; the job will fail with reason 'missing'"
        );
    }
    let job = job_repo::enqueue(db, proof_image_id)?;
    info!(job_id = %job.id, status = %job.status, "Extraction job queued");
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

fn requeue_command(db: &Database, proof_image_id: &str) -> Result<()> {
    if !job_repo::requeue_failed(db, proof_image_id)? {
        bail!("no FAILED extraction job for proof image {}", proof_image_id);
    }
    info!(proof_image_id, "Extraction job requeued");
    Ok(())
}

fn parse_command(input: &str) -> Result<()> {
    let text = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };

    let extraction = extract_proof_fields_now(&text);
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

fn status_command(db: &Database) -> Result<()> {
    let mut counts = BTreeMap::new();
    for status in ExtractionStatus::ALL {
        counts.insert(status.as_str(), job_repo::count_by_status(db, status)?);
    }
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_max_jobs() {
        let cli = Cli::parse_from(["rowproof", "--log-format", "json", "run", "--max-jobs", "3"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Run { max_jobs: Some(3) }));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/etc/rowproof.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/rowproof.json"));
    }
}
