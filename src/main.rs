//! circuit-recovery demo
//!
//! Drives a simulated flaky primary through a named breaker with a constant
//! fallback and logs what the consumer sees on every invocation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures_util::{stream, StreamExt};
use rand::Rng;

use circuit_recovery::config::{load_config, watcher};
use circuit_recovery::observability::init_logging;
use circuit_recovery::{BreakerRegistry, RecoveryConfig, Source, SourceExt, DEFAULT_BREAKER_NAME};

#[derive(Parser)]
#[command(name = "circuit-recovery")]
#[command(about = "Drive a flaky source through a circuit breaker with a fallback", long_about = None)]
struct Cli {
    /// TOML file with the default and per-breaker policies.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,

    /// Breaker guarding the primary.
    #[arg(short, long, default_value = DEFAULT_BREAKER_NAME)]
    breaker: String,

    /// Number of invocations to run.
    #[arg(short = 'n', long, default_value_t = 20)]
    invocations: u32,

    /// Probability that each primary item fails.
    #[arg(long, default_value_t = 0.3)]
    failure_rate: f64,

    /// Delay before each primary item, in milliseconds.
    #[arg(long, default_value_t = 10)]
    delay_ms: u64,

    /// Pause between invocations, in milliseconds.
    #[arg(long, default_value_t = 250)]
    pause_ms: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("simulated upstream failure")]
struct UpstreamError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RecoveryConfig::default(),
    };
    init_logging(&config.logging)?;

    tracing::info!("circuit-recovery v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(BreakerRegistry::from_config(&config));

    // Keep the watcher alive for the whole run.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (config_watcher, updates) = watcher::ConfigWatcher::new(path);
            let handle = config_watcher.run()?;
            tokio::spawn(watcher::apply_updates(registry.clone(), updates));
            Some(handle)
        }
        _ => None,
    };

    let failure_rate = cli.failure_rate.clamp(0.0, 1.0);
    let delay = Duration::from_millis(cli.delay_ms);
    let primary = move || {
        stream::iter(1..=3u32).then(move |n| async move {
            let fail = rand::thread_rng().gen_bool(failure_rate);
            tokio::time::sleep(delay).await;
            if fail {
                Err(UpstreamError)
            } else {
                Ok(n)
            }
        })
    };
    let fallback = || stream::iter(vec![Ok::<u32, UpstreamError>(0)]);

    let source = primary.recover_with(fallback, &registry, &cli.breaker)?;

    tracing::info!(
        breaker = %cli.breaker,
        policy = ?source.breaker().policy(),
        invocations = cli.invocations,
        failure_rate,
        "Running invocations"
    );

    for invocation in 1..=cli.invocations {
        let items: Vec<Result<u32, UpstreamError>> = source.subscribe().collect().await;
        let values: Vec<String> = items
            .iter()
            .map(|item| match item {
                Ok(n) => n.to_string(),
                Err(e) => format!("<{}>", e),
            })
            .collect();

        tracing::info!(
            invocation,
            items = %values.join(","),
            state = %source.breaker().state(),
            "Invocation finished"
        );

        tokio::time::sleep(Duration::from_millis(cli.pause_ms)).await;
    }

    println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
    Ok(())
}
