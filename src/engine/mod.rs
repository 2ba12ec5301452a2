pub mod counter;

use crate::engine::counter::WideCounter;
use crate::error::Error;
use crate::types::Proof;
use crate::work::{AttemptBudget, StopFlag};
use crate::{leading_zero_bits, meets_leading_zero_bits, HashAlgorithm};
use derive_builder::Builder;
use flume::{Receiver, Sender};
use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

pub const DEFAULT_PREFIX_LEN: usize = 12;
pub const DEFAULT_COUNTER_WIDTH: usize = 4;
/// Widest starting counter the engine accepts.
pub const MAX_COUNTER_WIDTH: usize = 8;

/// Client-side proof search.
///
/// Each worker draws its own random prefix and walks a [`WideCounter`] behind
/// it until `algorithm(prefix ++ counter)` has `bits` leading zero bits.
/// Expect about `2^bits` attempts. Without `max_attempts` the search does not
/// stop on its own.
///
/// Proofs are `prefix_len + counter_width` bytes long, or longer once the
/// counter widens. An engine with a non-default shape needs a verifier built
/// from [`VerifierConfig::for_engine`](crate::VerifierConfig::for_engine); the
/// default bounds only cover the default prefix.
#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct ProofEngine {
    pub bits: u32,
    #[builder(default)]
    pub algorithm: HashAlgorithm,
    #[builder(default = "DEFAULT_PREFIX_LEN")]
    pub prefix_len: usize,
    #[builder(default = "DEFAULT_COUNTER_WIDTH")]
    pub counter_width: usize,
    #[builder(default = "1")]
    pub threads: usize,
    /// Attempt budget shared by all workers.
    #[builder(default)]
    pub max_attempts: Option<u64>,
    /// Attempts made by the current search.
    #[builder(default = "Arc::new(AtomicU64::new(0))")]
    pub progress: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy)]
struct SearchSpec {
    algorithm: HashAlgorithm,
    bits: u32,
    prefix_len: usize,
    counter_width: usize,
}

impl ProofEngineBuilder {
    pub fn build_validated(self) -> Result<ProofEngine, Error> {
        let engine = self
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        engine.validate()?;
        Ok(engine)
    }
}

impl ProofEngine {
    fn validate(&self) -> Result<(), Error> {
        if self.bits > self.algorithm.digest_bits() {
            return Err(Error::InvalidConfig(format!(
                "bits must be <= {} for {}",
                self.algorithm.digest_bits(),
                self.algorithm
            )));
        }
        if self.prefix_len == 0 {
            return Err(Error::InvalidConfig("prefix_len must be >= 1".into()));
        }
        if self.counter_width == 0 || self.counter_width > MAX_COUNTER_WIDTH {
            return Err(Error::InvalidConfig(format!(
                "counter_width must be in 1..={MAX_COUNTER_WIDTH}"
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidConfig("max_attempts must be >= 1".into()));
        }
        Ok(())
    }

    fn spec(&self) -> SearchSpec {
        SearchSpec {
            algorithm: self.algorithm,
            bits: self.bits,
            prefix_len: self.prefix_len,
            counter_width: self.counter_width,
        }
    }

    /// Search for a proof meeting the configured difficulty.
    ///
    /// Returns [`Error::GenerationExhausted`] once `max_attempts` is spent.
    pub fn solve(&self) -> Result<Proof, Error> {
        self.validate()?;
        self.progress.store(0, Ordering::SeqCst);
        let budget = Arc::new(AttemptBudget::new(self.max_attempts));
        let stop = Arc::new(StopFlag::new());

        let found = if self.threads == 1 {
            search(self.spec(), &stop, &budget, &self.progress)
        } else {
            self.solve_parallel(stop, budget.clone())?
        };

        match found {
            Some(proof) => {
                debug!(
                    bits = self.bits,
                    zero_bits = leading_zero_bits(&proof.digest(self.algorithm)),
                    attempts = self.progress.load(Ordering::Relaxed),
                    len = proof.len(),
                    "proof found"
                );
                Ok(proof)
            }
            None => Err(Error::GenerationExhausted {
                attempts: budget.used(),
            }),
        }
    }

    fn solve_parallel(
        &self,
        stop: Arc<StopFlag>,
        budget: Arc<AttemptBudget>,
    ) -> Result<Option<Proof>, Error> {
        // One slot per worker, so a late hit never blocks its sender.
        let (tx, rx): (Sender<Proof>, Receiver<Proof>) = flume::bounded(self.threads);
        let mut joins = Vec::with_capacity(self.threads);

        for idx in 0..self.threads {
            let spec = self.spec();
            let worker_stop = stop.clone();
            let worker_budget = budget.clone();
            let worker_progress = self.progress.clone();
            let worker_tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("powgate-solver-{idx}"))
                .spawn(move || {
                    if let Some(proof) =
                        search(spec, &worker_stop, &worker_budget, &worker_progress)
                    {
                        worker_stop.force_stop();
                        let _ = worker_tx.send(proof);
                    }
                });
            match spawned {
                Ok(join) => joins.push(join),
                Err(err) => {
                    stop.force_stop();
                    join_handles(joins);
                    return Err(Error::Spawn(err));
                }
            }
        }
        drop(tx);

        let found = rx.recv().ok();
        stop.force_stop();
        join_handles(joins);

        match found {
            Some(proof) => Ok(Some(proof)),
            None if budget.is_exhausted() => Ok(None),
            None => Err(Error::ChannelClosed),
        }
    }
}

fn search(
    spec: SearchSpec,
    stop: &StopFlag,
    budget: &AttemptBudget,
    progress: &AtomicU64,
) -> Option<Proof> {
    let mut candidate = vec![0u8; spec.prefix_len];
    rand::thread_rng().fill_bytes(&mut candidate);
    let mut counter = WideCounter::new(spec.counter_width);

    while !stop.should_stop() && budget.try_take() {
        candidate.truncate(spec.prefix_len);
        candidate.extend_from_slice(counter.as_bytes());
        let digest = spec.algorithm.digest(&candidate);
        progress.fetch_add(1, Ordering::Relaxed);
        if meets_leading_zero_bits(&digest, spec.bits) {
            let proof = Proof::from_bytes(candidate);
            debug_assert!(proof.meets(spec.algorithm, spec.bits));
            return Some(proof);
        }
        if counter.increment() {
            debug!(width = counter.width(), "search counter widened");
        }
    }
    None
}

fn join_handles(joins: Vec<thread::JoinHandle<()>>) {
    for handle in joins {
        let _ = handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(bits: u32) -> ProofEngineBuilder {
        ProofEngineBuilder::default().bits(bits)
    }

    #[test]
    fn solve_meets_difficulty() {
        let engine = engine(8).build_validated().expect("build engine");
        let proof = engine.solve().expect("solve");
        assert_eq!(proof.len(), DEFAULT_PREFIX_LEN + DEFAULT_COUNTER_WIDTH);
        assert!(proof.meets(HashAlgorithm::Sha1, 8));
        assert!(leading_zero_bits(&proof.digest(HashAlgorithm::Sha1)) >= 8);
        assert!(engine.progress.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn zero_difficulty_accepts_first_candidate() {
        let engine = engine(0).build_validated().expect("build engine");
        let proof = engine.solve().expect("solve");
        assert_eq!(&proof.as_bytes()[DEFAULT_PREFIX_LEN..], &[0, 0, 0, 0]);
        assert_eq!(engine.progress.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn honours_prefix_and_counter_width() {
        let engine = engine(4)
            .algorithm(HashAlgorithm::Blake3)
            .prefix_len(16)
            .counter_width(2)
            .build_validated()
            .expect("build engine");
        let proof = engine.solve().expect("solve");
        assert!(proof.len() >= 18);
        assert!(proof.meets(HashAlgorithm::Blake3, 4));
    }

    #[test]
    fn parallel_solve_meets_difficulty() {
        let engine = engine(10)
            .threads(4)
            .build_validated()
            .expect("build engine");
        let proof = engine.solve().expect("solve");
        assert!(proof.meets(HashAlgorithm::Sha1, 10));
    }

    #[test]
    fn each_solve_draws_a_fresh_prefix() {
        let engine = engine(1).threads(2).build_validated().expect("build");
        let a = engine.solve().expect("solve");
        let b = engine.solve().expect("solve");
        assert_ne!(
            &a.as_bytes()[..DEFAULT_PREFIX_LEN],
            &b.as_bytes()[..DEFAULT_PREFIX_LEN]
        );
    }

    #[test]
    fn budget_exhaustion_is_retryable() {
        // A full 160-bit zero SHA-1 digest will not turn up in 100 tries.
        let engine = engine(160)
            .max_attempts(Some(100))
            .build_validated()
            .expect("build engine");
        let err = engine.solve().expect_err("budget should run out");
        assert!(err.is_retryable());
        assert!(matches!(err, Error::GenerationExhausted { attempts: 100 }));
        assert_eq!(engine.progress.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn parallel_budget_is_shared() {
        let engine = engine(160)
            .threads(3)
            .max_attempts(Some(90))
            .build_validated()
            .expect("build engine");
        let err = engine.solve().expect_err("budget should run out");
        assert!(matches!(err, Error::GenerationExhausted { attempts: 90 }));
        assert_eq!(engine.progress.load(Ordering::SeqCst), 90);
    }

    #[test]
    fn rejects_unsatisfiable_difficulty() {
        let err = engine(161).build_validated().expect_err("too many bits");
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(engine(256)
            .algorithm(HashAlgorithm::Sha2_256)
            .build_validated()
            .is_ok());
    }

    #[test]
    fn rejects_bad_shape() {
        assert!(engine(1).threads(0).build_validated().is_err());
        assert!(engine(1).prefix_len(0).build_validated().is_err());
        assert!(engine(1).counter_width(0).build_validated().is_err());
        assert!(engine(1).counter_width(9).build_validated().is_err());
        assert!(engine(1).max_attempts(Some(0)).build_validated().is_err());
        assert!(ProofEngineBuilder::default().build_validated().is_err());
    }
}
