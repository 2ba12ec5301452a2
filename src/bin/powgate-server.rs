//! powgate server: hands out quotes for fresh proofs of work.

use anyhow::Context;
use clap::Parser;
use powgate::gate::{MokaReplayCache, QuoteBook, QuoteGate};
use powgate::http::{init_logging, router, ServerArgs, ServerSettings, ShutdownSignals};
use powgate::Verifier;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    let settings = ServerSettings::resolve(&args)?;
    init_logging(settings.log_format, &settings.log_level);

    let verifier = Verifier::new(settings.verifier_config())?;
    let quotes = Arc::new(
        QuoteBook::load(&settings.quotes).context("failed to create the quote store")?,
    );
    let cache = Arc::new(MokaReplayCache::with_system_clock(settings.ttl()));
    let sweeper = cache
        .spawn_sweeper()
        .context("failed to start the replay sweeper")?;
    let gate = Arc::new(QuoteGate::new(verifier, cache.clone(), quotes.clone()));

    let mut signals =
        ShutdownSignals::install().context("failed to install shutdown signal handlers")?;

    let addr = settings.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        difficulty = settings.difficulty,
        algorithm = %settings.algorithm,
        ttl = ?cache.ttl(),
        request_timeout = ?settings.request_timeout(),
        quotes = quotes.len(),
        "serving quotes"
    );

    let served = axum::serve(listener, router(gate, settings.request_timeout()))
        .with_graceful_shutdown(async move {
            let signal = signals.recv().await;
            info!(signal, "attempting to shut down gracefully");
        })
        .await;

    sweeper.stop();
    served.context("error while serving")?;
    info!("clean shutdown");
    Ok(())
}
