//! `riskprint`: ingest risk profiles and query behavioral neighbors.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use riskprint_retrieval::{
    FingerprintEngine, IngestRequest, ProfileId, RawDataRequest, RetrievalConfig,
};

/// Largest result set a single query may ask for.
const MAX_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "riskprint", version, about = "Behavioral risk fingerprints")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fingerprint a written financial history.
    Ingest {
        #[arg(long)]
        name: String,
        #[arg(long)]
        score: i64,
        /// File holding the behavior text.
        #[arg(long)]
        history_file: PathBuf,
    },
    /// Narrate raw financial data, then fingerprint the narrative.
    IngestRaw {
        #[arg(long)]
        name: String,
        #[arg(long)]
        score: i64,
        /// File holding the raw data.
        #[arg(long)]
        data_file: PathBuf,
        /// Replaces the default narrative instruction.
        #[arg(long)]
        instruction: Option<String>,
    },
    /// List the profiles most similar to a target.
    Similar {
        id: ProfileId,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a stored profile.
    Show { id: ProfileId },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<RetrievalConfig> {
    match path {
        Some(path) => RetrievalConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RetrievalConfig::default()),
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    debug!("{cli:?}");

    let config = load_config(cli.config.as_deref())?;
    let engine = FingerprintEngine::from_config(&config)
        .await
        .context("failed to initialize engine")?;

    match cli.command {
        Command::Ingest {
            name,
            score,
            history_file,
        } => {
            let text = read_input(&history_file)?;
            let profile = engine
                .ingest(IngestRequest::new(name, score, text))
                .await
                .context("ingestion failed")?;
            print_json(&profile)?;
        }
        Command::IngestRaw {
            name,
            score,
            data_file,
            instruction,
        } => {
            let mut request = RawDataRequest::new(name, score, read_input(&data_file)?);
            if let Some(instruction) = instruction {
                request = request.with_instruction(instruction);
            }
            let profile = engine
                .ingest_from_raw_data(request)
                .await
                .context("raw data ingestion failed")?;
            print_json(&profile)?;
        }
        Command::Similar { id, limit } => {
            let matches = engine
                .find_similar(id, clamp_limit(limit))
                .await
                .with_context(|| format!("similarity search for {id} failed"))?;
            print_json(&matches)?;
        }
        Command::Show { id } => {
            let profile = engine.get_profile(id).await?;
            print_json(&profile)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_similar() {
        let id = ProfileId::new();
        let id_arg = id.to_string();
        let cli =
            Cli::try_parse_from(["riskprint", "similar", id_arg.as_str(), "--limit", "3"]).unwrap();
        match cli.command {
            Command::Similar { id: parsed, limit } => {
                assert_eq!(parsed, id);
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_id() {
        assert!(Cli::try_parse_from(["riskprint", "show", "nope"]).is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(5), 5);
        assert_eq!(clamp_limit(500), MAX_LIMIT);
    }
}
