//! DecisionLab CLI: run the decision pipeline from the command line.
//!
//! Commands:
//! - `predict`: decide on a JSON request file, or on a candle CSV plus cash
//! - `batch`: decide on several request files in parallel
//! - `health`: report model, cache and schema status
//! - `synth`: write deterministic synthetic candles as CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use decisionlab_runner::data_loader::{read_request_body, write_candles_csv};
use decisionlab_runner::{
    generate_universe, logging, request_from_csv, BatchCall, DecisionService, HttpResponse,
    ServiceConfig,
};

#[derive(Parser)]
#[command(
    name = "decisionlab",
    about = "DecisionLab CLI: feature-driven trading decisions"
)]
struct Cli {
    /// Path to a TOML service config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide on a single request.
    Predict {
        /// JSON file holding a full agent context request.
        #[arg(long, conflicts_with = "candles")]
        request: Option<PathBuf>,

        /// Candle CSV (symbol,timestamp,open,high,low,close,volume).
        #[arg(long, requires = "cash")]
        candles: Option<PathBuf>,

        /// Cash balance for a CSV-built request.
        #[arg(long)]
        cash: Option<Decimal>,

        /// Agent id for a CSV-built request.
        #[arg(long, default_value = "cli")]
        agent_id: String,

        /// Replay a stored response for this key, or store the new one.
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Decide on several request files in parallel.
    Batch {
        /// Request JSON files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Report service health as JSON.
    Health,
    /// Generate deterministic synthetic candles.
    Synth {
        /// Symbols to generate.
        #[arg(long, num_args = 1.., default_values = ["BTC", "ETH"])]
        symbols: Vec<String>,

        /// Number of daily candles per symbol.
        #[arg(long, default_value_t = 30)]
        days: usize,

        /// Output CSV. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServiceConfig::load_or_default(cli.config.as_deref())
        .context("failed to load service config")?;
    logging::init(&config.logging);

    match cli.command {
        Commands::Predict {
            request,
            candles,
            cash,
            agent_id,
            idempotency_key,
        } => run_predict(
            &config,
            request,
            candles,
            cash,
            &agent_id,
            idempotency_key.as_deref(),
        ),
        Commands::Batch { files } => run_batch(&config, &files),
        Commands::Health => run_health(&config),
        Commands::Synth { symbols, days, out } => run_synth(&symbols, days, out.as_deref()),
    }
}

fn run_predict(
    config: &ServiceConfig,
    request: Option<PathBuf>,
    candles: Option<PathBuf>,
    cash: Option<Decimal>,
    agent_id: &str,
    idempotency_key: Option<&str>,
) -> Result<()> {
    let body = match (request, candles) {
        (Some(path), None) => read_request_body(&path)?,
        (None, Some(path)) => {
            let cash = cash.context("--cash is required with --candles")?;
            let request = request_from_csv(&path, agent_id, cash)?;
            serde_json::to_string(&request)?
        }
        _ => bail!("one of --request or --candles is required"),
    };

    let service = DecisionService::from_config(config);
    let response = service.predict(&body, idempotency_key);
    print_response(&response);
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_batch(config: &ServiceConfig, files: &[PathBuf]) -> Result<()> {
    let calls = files
        .iter()
        .map(|path| -> Result<BatchCall> {
            Ok(BatchCall {
                body: read_request_body(path)?,
                idempotency_key: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let service = DecisionService::from_config(config);
    let responses = service.predict_batch(&calls);

    let mut failures = 0;
    for (path, response) in files.iter().zip(&responses) {
        if !response.is_success() {
            failures += 1;
        }
        println!("{}\t{}\t{}", path.display(), response.status, response.body);
    }
    info!(total = files.len(), failures, "batch complete");

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_health(config: &ServiceConfig) -> Result<()> {
    let service = DecisionService::from_config(config);
    println!("{}", serde_json::to_string_pretty(&service.health())?);
    Ok(())
}

fn run_synth(symbols: &[String], days: usize, out: Option<&Path>) -> Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let end = chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight")?
        .and_utc();
    let candles = generate_universe(symbols, days, end);

    match out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_candles_csv(file, &candles)?;
            println!("Wrote {} candles to {}", candles.len(), path.display());
        }
        None => write_candles_csv(std::io::stdout().lock(), &candles)?,
    }
    Ok(())
}

fn print_response(response: &HttpResponse) {
    let pretty = serde_json::from_str::<serde_json::Value>(&response.body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| response.body.clone());
    if response.is_success() {
        println!("{pretty}");
    } else {
        eprintln!("Request failed with status {}", response.status);
        eprintln!("{pretty}");
    }
}
