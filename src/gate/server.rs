use std::sync::Arc;
use tracing::debug;

use crate::error::VerifyError;
use crate::gate::cache::{ReplayCache, ReplayCacheError};
use crate::gate::quotes::QuoteStore;
use crate::verify::Verifier;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// The proof is valid but was accepted recently; resending it will not help.
    #[error("proof has been used recently")]
    DuplicateProof,
    #[error("replay cache error: {0}")]
    Cache(#[from] ReplayCacheError),
}

/// Server-side pipeline: verify the proof, admit it into the replay cache,
/// then hand out a quote.
pub struct QuoteGate<C: ReplayCache, Q: QuoteStore> {
    verifier: Verifier,
    replay_cache: Arc<C>,
    quotes: Arc<Q>,
}

impl<C, Q> QuoteGate<C, Q>
where
    C: ReplayCache,
    Q: QuoteStore,
{
    pub fn new(verifier: Verifier, replay_cache: Arc<C>, quotes: Arc<Q>) -> Self {
        Self {
            verifier,
            replay_cache,
            quotes,
        }
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn replay_cache(&self) -> &Arc<C> {
        &self.replay_cache
    }

    /// Exchange a transport-encoded proof for a quote.
    ///
    /// The quote store is only consulted after the proof was admitted.
    pub fn fetch(&self, encoded: &str) -> Result<&str, GateError> {
        let proof = match self.verifier.verify(encoded) {
            Ok(proof) => proof,
            Err(err) => {
                debug!(proof = encoded, %err, "proof rejected");
                return Err(err.into());
            }
        };
        if !self.replay_cache.admit(proof.as_bytes())? {
            debug!(proof = encoded, "duplicate proof rejected");
            return Err(GateError::DuplicateProof);
        }
        debug!(proof = encoded, "proof accepted");
        Ok(self.quotes.next())
    }
}
