//! powgate client: solves a proof of work and exchanges it for a quote.

use anyhow::{bail, Context};
use clap::Parser;
use powgate::http::{init_logging, ClientArgs, FetchOutcome, QuoteClient};
use powgate::{Error, Proof, ProofEngine};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ClientArgs::parse();
    init_logging(args.log_format, &args.log_level);

    let engine = Arc::new(args.engine()?);
    let client = QuoteClient::new(&args.server).context("failed to build http client")?;

    for round in 0..args.count {
        let proof = solve_with_retries(engine.clone(), args.retries).await?;
        match client
            .fetch(&proof)
            .await
            .with_context(|| format!("request to {} failed", client.url_for(&proof)))?
        {
            FetchOutcome::Quote(quote) => println!("{quote}"),
            FetchOutcome::Duplicate(msg) => warn!(round, %msg, "server has seen this proof"),
            FetchOutcome::PredicateFailed(msg) => {
                bail!("server rejected the proof as too weak ({msg}); check --difficulty and --algorithm")
            }
            FetchOutcome::Malformed(msg) => bail!("server rejected the proof as malformed: {msg}"),
            FetchOutcome::Unexpected { status, body } => {
                bail!("unexpected response {status}: {body}")
            }
        }
    }
    Ok(())
}

/// Run the CPU-bound search off the async runtime, starting over with a new
/// prefix whenever the attempt budget runs out.
async fn solve_with_retries(engine: Arc<ProofEngine>, retries: u32) -> anyhow::Result<Proof> {
    let mut attempt = 0u32;
    loop {
        let started = Instant::now();
        let worker = engine.clone();
        let result = tokio::task::spawn_blocking(move || worker.solve())
            .await
            .context("proof search task failed")?;
        match result {
            Ok(proof) => {
                info!(
                    attempts = engine.progress.load(Ordering::Relaxed),
                    elapsed = ?started.elapsed(),
                    "generated proof {proof}"
                );
                return Ok(proof);
            }
            Err(err @ Error::GenerationExhausted { .. }) if attempt < retries => {
                attempt += 1;
                warn!(%err, attempt, "retrying with a fresh prefix");
            }
            Err(err) => return Err(err.into()),
        }
    }
}
