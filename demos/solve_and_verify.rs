//! In-process walk through the quote gate.
//!
//! - Solves a proof at the requested difficulty and prints how long it took.
//! - Exchanges it for a quote, then shows the replay being refused.
//! - Sweeps the replay cache after the window and exchanges the same proof again.

use powgate::gate::{MokaReplayCache, QuoteBook, QuoteGate, ReplayCache};
use powgate::{HashAlgorithm, ProofEngineBuilder, Verifier, VerifierConfig};
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn usage() -> String {
    "Usage: cargo run --release --example solve_and_verify -- \
      [--bits <u32>] [--algorithm <name>] [--threads <usize>]\n\
     Defaults: --bits 16 --algorithm sha1 --threads 1\n"
        .to_string()
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let mut bits: u32 = 16;
    let mut algorithm = HashAlgorithm::Sha1;
    let mut threads: usize = 1;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--bits" => {
                bits = args
                    .next()
                    .ok_or_else(usage)?
                    .parse()
                    .map_err(|_| usage())?
            }
            "--algorithm" => {
                algorithm = HashAlgorithm::from_str(&args.next().ok_or_else(usage)?)?;
            }
            "--threads" => {
                threads = args
                    .next()
                    .ok_or_else(usage)?
                    .parse()
                    .map_err(|_| usage())?
            }
            _ => return Err(usage()),
        }
    }

    let engine = ProofEngineBuilder::default()
        .bits(bits)
        .algorithm(algorithm)
        .threads(threads)
        .build_validated()
        .map_err(|e| e.to_string())?;

    let started = Instant::now();
    let proof = engine.solve().map_err(|e| e.to_string())?;
    let elapsed = started.elapsed();
    let attempts = engine.progress.load(Ordering::Relaxed);
    println!(
        "solved bits={bits} algorithm={algorithm} threads={threads} attempts={attempts} elapsed_ms={}",
        elapsed.as_millis()
    );
    println!("proof={proof} digest={}", proof.digest_hex(algorithm));

    let verifier = Verifier::new(VerifierConfig {
        bits,
        algorithm,
        ..VerifierConfig::default()
    })
    .map_err(|e| e.to_string())?;
    let ttl = Duration::from_secs(1);
    let cache = Arc::new(MokaReplayCache::with_system_clock(ttl));
    let quotes = Arc::new(
        QuoteBook::from_lines([
            "Simplicity is prerequisite for reliability.",
            "Premature optimization is the root of all evil.",
        ])
        .map_err(|e| e.to_string())?,
    );
    let gate = QuoteGate::new(verifier, cache.clone(), quotes);

    let encoded = proof.encode();
    let quote = gate.fetch(&encoded).map_err(|e| e.to_string())?;
    println!("first exchange: {quote}");

    match gate.fetch(&encoded) {
        Ok(_) => return Err("replay was accepted".into()),
        Err(err) => println!("replay refused: {err}"),
    }

    std::thread::sleep(ttl + Duration::from_millis(100));
    let removed = cache.sweep();
    println!("swept {removed} expired entr{}", if removed == 1 { "y" } else { "ies" });

    let quote = gate.fetch(&encoded).map_err(|e| e.to_string())?;
    println!("after sweep: {quote}");
    Ok(())
}
