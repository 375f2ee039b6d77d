//! `sourcewatch` — background worker that watches chains for newly-deployed
//! contracts and routes them through source assembly, verification, and
//! repository storage.

use std::sync::Arc;
use std::time::Duration;

use chain_rpc::AlloyConnector;
use clap::Parser;
use monitor_core::{ChainRegistry, MonitorSupervisor, MonitorTunables};
use sourcewatch::{
    CborTrailerDecoder, EnvChainRegistry, HttpRepository, HttpSourceFetcher,
    HttpVerificationService, TracingEventBus,
};
use tracing_subscriber::EnvFilter;

/// CLI flags for the monitor service. Everything else is read from the
/// environment via [`MonitorTunables::load`].
#[derive(Debug, Parser)]
#[command(name = "sourcewatch", about = "Watches chains for newly-deployed contracts")]
struct Cli {
    /// Base URL of the verification service.
    #[arg(long, env = "VERIFICATION_SERVICE_URL")]
    verification_url: String,

    /// Base URL of the repository service.
    #[arg(long, env = "REPOSITORY_SERVICE_URL")]
    repository_url: String,

    /// Base URL of the source-fetcher service.
    #[arg(long, env = "SOURCE_FETCHER_URL")]
    source_fetcher_url: String,

    /// HTTP client timeout, in seconds, for every collaborator call.
    #[arg(long, env = "HTTP_CLIENT_TIMEOUT_SECS", default_value_t = 10)]
    http_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let tunables = MonitorTunables::load()?;
    let registry = EnvChainRegistry::from_env();
    let http_timeout = Duration::from_secs(cli.http_timeout_secs);

    let connector = Arc::new(AlloyConnector::new(tunables.provider_timeout()));
    let repository = Arc::new(HttpRepository::new(cli.repository_url, http_timeout));
    let verification = Arc::new(HttpVerificationService::new(cli.verification_url, http_timeout));
    let fetcher = Arc::new(HttpSourceFetcher::new(cli.source_fetcher_url, http_timeout));
    let decoder = Arc::new(CborTrailerDecoder::new());
    let events = Arc::new(TracingEventBus::new());

    let supervisor = MonitorSupervisor::new(
        registry.default_chains(),
        &registry,
        connector,
        fetcher,
        verification,
        repository,
        decoder.clone(),
        decoder,
        events,
        tunables,
    );

    supervisor.start().await;
    tracing::info!("sourcewatch running; press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    supervisor.stop().await;

    Ok(())
}
