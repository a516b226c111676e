/*
 * Route Scanner - DEX aggregator pair scanner
 * Main entry point for the application
 */

use anyhow::Context;
use route_scanner::{
    aggregator::JupiterClient,
    bootstrap,
    config::Config,
    confirmation::{ConfirmOptions, ConfirmationWatcher},
    execution::SwapExecutor,
    report::ScanSummary,
    rpc::RpcClient,
    scanner::{ScanOrchestrator, ScanSettings},
    wallet,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting route scanner");

    let config = Config::from_env()
        .map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })
        .context("loading configuration")?;

    info!(
        aggregator = %config.aggregator.base_url,
        tokens = config.tokens.len(),
        submit = config.scan.submit,
        "Configuration loaded successfully"
    );

    let wallet = wallet::from_config(&config.wallet).context("loading wallet")?;
    let jupiter = Arc::new(JupiterClient::new(&config.aggregator).context("creating aggregator client")?);

    let mut orchestrator = ScanOrchestrator::new(
        jupiter.clone(),
        jupiter,
        wallet.public_key(),
        ScanSettings::from(&config.scan),
    );

    if config.scan.submit {
        let rpc = Arc::new(RpcClient::new(&config.rpc).context("creating RPC client")?);
        bootstrap::ensure_wrapped_native_account(&rpc, wallet.public_key(), &config.tokens)
            .await
            .context("checking wrapped native account")?;

        let watcher = ConfirmationWatcher::new(rpc.clone(), ConfirmOptions::from(&config.confirmation));
        let executor = SwapExecutor::new(wallet.clone(), rpc, watcher);
        orchestrator = orchestrator.with_executor(Arc::new(executor));
        info!(rpc = %config.rpc.url, "Submission enabled");
    }

    let report = orchestrator.run(&config.tokens).await;
    ScanSummary::from_report(&report).log();

    Ok(())
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_scanner=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
