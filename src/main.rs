use anyhow::Result;
use clap::Parser;
use proxy_checker::{CancelHandle, Config, ProxyChecker, ProxyParser, Validator};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Check a list of proxies and keep the ones that work
#[derive(Parser)]
#[command(name = "proxy-checker")]
#[command(about = "Check a list of proxies and keep the ones that work")]
struct Cli {
    /// Input file containing proxies, one per line
    input: Option<PathBuf>,
    /// Output file for working proxies
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy_checker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.input, cli.output);

    info!("Starting proxy checker");

    let descriptors = ProxyParser::read_descriptors(&config.input_path)?;
    info!(
        "Loaded {} proxies from {:?}",
        descriptors.len(),
        config.input_path
    );

    let (cancel, cancel_rx) = CancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for running checks to finish");
            cancel.cancel();
        }
    });

    let validator = Validator::new(ProxyChecker::new()).with_cancellation(cancel_rx);
    let report = validator.validate(&descriptors).await;

    ProxyParser::save_descriptors(&report.working, &config.output_path)?;

    info!(
        "Finished: {} proxies read, {} parsed, {} working",
        report.total,
        report.parsed(),
        report.working.len()
    );
    info!("Saved working proxies to {:?}", config.output_path);

    Ok(())
}
