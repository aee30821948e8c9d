use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mixer_resilience::core::OnlineFlag;
use mixer_resilience::logger::init_logger;
use mixer_resilience::models::{NetworkId, RawError};
use mixer_resilience::utils::{base_delay, compute_delay};
use mixer_resilience::{next_endpoint, AppConfig};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "mixer-resilience", version, about = "Inspect the client resilience layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify an error message and print the resulting record
    Classify {
        /// Raw error message as reported by a collaborator
        message: String,

        /// Error type name, e.g. WalletSignTransactionError
        #[arg(long)]
        name: Option<String>,

        /// Classify as if the host reported no connectivity
        #[arg(long)]
        offline: bool,
    },

    /// Print the endpoint rotation order for a network
    Endpoints {
        /// Network to list; defaults to MIXER_NETWORK
        #[arg(long)]
        network: Option<NetworkId>,
    },

    /// Print the retry delay schedule for the configured backoff
    Backoff {
        /// Number of retries to show; defaults to MIXER_MAX_RETRIES
        #[arg(long)]
        attempts: Option<u32>,
    },
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;

    match cli.command {
        Command::Classify {
            message,
            name,
            offline,
        } => classify(&config, message, name, offline),
        Command::Endpoints { network } => endpoints(&config, network.unwrap_or(config.network)),
        Command::Backoff { attempts } => backoff(&config, attempts.unwrap_or(config.retry.max_retries)),
    }
}

fn classify(config: &AppConfig, message: String, name: Option<String>, offline: bool) -> Result<()> {
    let classifier = config.classifier(Arc::new(OnlineFlag::new(!offline)));

    let mut raw = RawError::new(message);
    if let Some(name) = name {
        raw = raw.with_name(name);
    }

    let record = classifier.record(raw);
    let output = json!({
        "record": record,
        "info": record.info(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn endpoints(config: &AppConfig, network: NetworkId) -> Result<()> {
    let catalog = config.catalog().context("invalid endpoint catalog")?;
    let entries = catalog.endpoints();

    let Some(first) = next_endpoint(None, network, entries) else {
        anyhow::bail!("no endpoints configured for {network}");
    };

    let mut current = first;
    loop {
        println!("{:>3}  {:<12} {}", current.priority, current.id, current.url);
        match next_endpoint(Some(current), network, entries) {
            Some(next) if next.id != first.id => current = next,
            _ => break,
        }
    }
    Ok(())
}

fn backoff(config: &AppConfig, attempts: u32) -> Result<()> {
    let mut rng = rand::thread_rng();
    let retry = &config.retry;

    println!(
        "initial={}ms max={}ms multiplier={} jitter={}",
        retry.initial_delay.as_millis(),
        retry.max_delay.as_millis(),
        retry.backoff_multiplier,
        retry.jitter
    );
    for attempt in 0..attempts {
        let base = base_delay(attempt, retry);
        let delay = compute_delay(attempt, retry, &mut rng);
        println!(
            "retry {:>2}: base {:>6}ms  sampled {:>6}ms",
            attempt + 1,
            base.as_millis(),
            delay.as_millis()
        );
    }
    Ok(())
}
