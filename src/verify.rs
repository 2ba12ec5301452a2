use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{ProofEngine, DEFAULT_PREFIX_LEN, MAX_COUNTER_WIDTH};
use crate::error::{Error, VerifyError};
use crate::types::Proof;
use crate::HashAlgorithm;

/// Server-side verification policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub bits: u32,
    pub algorithm: HashAlgorithm,
    /// Shortest accepted decoded proof, in bytes.
    pub min_len: usize,
    /// Longest accepted decoded proof, in bytes.
    pub max_len: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            bits: 20,
            algorithm: HashAlgorithm::Sha1,
            min_len: DEFAULT_PREFIX_LEN,
            max_len: DEFAULT_PREFIX_LEN + MAX_COUNTER_WIDTH,
        }
    }
}

impl VerifierConfig {
    /// Policy that accepts exactly what `engine` produces: same difficulty and
    /// algorithm, lengths from its starting width up to a counter widened to
    /// [`MAX_COUNTER_WIDTH`] bytes.
    pub fn for_engine(engine: &ProofEngine) -> Self {
        Self {
            bits: engine.bits,
            algorithm: engine.algorithm,
            min_len: engine.prefix_len + engine.counter_width,
            max_len: engine.prefix_len + engine.counter_width.max(MAX_COUNTER_WIDTH),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.bits > self.algorithm.digest_bits() {
            return Err(Error::InvalidConfig(format!(
                "bits must be <= {} for {}",
                self.algorithm.digest_bits(),
                self.algorithm
            )));
        }
        if self.min_len == 0 {
            return Err(Error::InvalidConfig("min_len must be >= 1".into()));
        }
        if self.min_len > self.max_len {
            return Err(Error::InvalidConfig("min_len must be <= max_len".into()));
        }
        Ok(())
    }
}

/// Recomputes the digest of a received proof and applies the difficulty predicate.
///
/// Verification is stateless; replay protection lives in [`crate::gate`].
#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Decode a transport-encoded proof and check it.
    ///
    /// On success the decoded proof is returned for use as the replay key.
    pub fn verify(&self, encoded: &str) -> Result<Proof, VerifyError> {
        let proof = Proof::decode(encoded).inspect_err(|err| {
            debug!(%err, "rejecting undecodable proof");
        })?;
        self.check(&proof)?;
        Ok(proof)
    }

    /// Length bounds and difficulty check on an already decoded proof.
    pub fn check(&self, proof: &Proof) -> Result<(), VerifyError> {
        let cfg = &self.config;
        if proof.len() < cfg.min_len || proof.len() > cfg.max_len {
            debug!(len = proof.len(), "rejecting proof with bad length");
            return Err(VerifyError::MalformedProof {
                len: proof.len(),
                min: cfg.min_len,
                max: cfg.max_len,
            });
        }
        if !proof.meets(cfg.algorithm, cfg.bits) {
            return Err(VerifyError::PredicateFailed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProofEngineBuilder;

    fn verifier(bits: u32) -> Verifier {
        Verifier::new(VerifierConfig {
            bits,
            ..VerifierConfig::default()
        })
        .expect("valid config")
    }

    /// Smallest counter value whose proof, behind `prefix`, fails `bits`.
    fn failing_proof(prefix: &[u8], bits: u32) -> Proof {
        (0u32..)
            .map(|n| {
                let mut bytes = prefix.to_vec();
                bytes.extend_from_slice(&n.to_be_bytes());
                Proof::from_bytes(bytes)
            })
            .find(|p| !p.meets(HashAlgorithm::Sha1, bits))
            .expect("some candidate fails")
    }

    #[test]
    fn accepts_engine_output() {
        for bits in [0, 1, 8, 12] {
            let engine = ProofEngineBuilder::default()
                .bits(bits)
                .build_validated()
                .expect("build engine");
            let proof = engine.solve().expect("solve");
            let accepted = verifier(bits)
                .verify(&proof.encode())
                .expect("own proof verifies");
            assert_eq!(accepted, proof);
        }
    }

    #[test]
    fn accepts_parallel_engine_output() {
        let engine = ProofEngineBuilder::default()
            .bits(10)
            .threads(3)
            .algorithm(HashAlgorithm::Sha2_256)
            .build_validated()
            .expect("build engine");
        let proof = engine.solve().expect("solve");
        let verifier = Verifier::new(VerifierConfig {
            bits: 10,
            algorithm: HashAlgorithm::Sha2_256,
            ..VerifierConfig::default()
        })
        .expect("valid config");
        assert!(verifier.verify(&proof.encode()).is_ok());
    }

    #[test]
    fn rejects_bad_encoding() {
        let err = verifier(0).verify("###").expect_err("not base64");
        assert!(matches!(err, VerifyError::Decode(_)));
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let v = verifier(0);
        let at_min = Proof::from_bytes(vec![7u8; 12]);
        let at_max = Proof::from_bytes(vec![7u8; 20]);
        assert!(v.verify(&at_min.encode()).is_ok());
        assert!(v.verify(&at_max.encode()).is_ok());

        let under = Proof::from_bytes(vec![7u8; 11]);
        let over = Proof::from_bytes(vec![7u8; 21]);
        assert_eq!(
            v.verify(&under.encode()),
            Err(VerifyError::MalformedProof {
                len: 11,
                min: 12,
                max: 20
            })
        );
        assert!(matches!(
            v.verify(&over.encode()),
            Err(VerifyError::MalformedProof { len: 21, .. })
        ));
        assert!(matches!(
            v.verify(""),
            Err(VerifyError::MalformedProof { len: 0, .. })
        ));
    }

    #[test]
    fn rejects_proof_below_difficulty() {
        let proof = failing_proof(&[3u8; 12], 8);
        assert_eq!(
            verifier(8).verify(&proof.encode()),
            Err(VerifyError::PredicateFailed)
        );
    }

    #[test]
    fn digest_is_over_the_received_bytes() {
        // A proof that starts with zero bytes but whose digest does not must fail:
        // the check never inspects the candidate itself.
        let proof = failing_proof(&[0u8; 12], 8);
        assert_eq!(proof.as_bytes()[0], 0);
        assert_eq!(
            verifier(8).check(&proof),
            Err(VerifyError::PredicateFailed)
        );
    }

    #[test]
    fn rejects_proof_solved_with_other_algorithm() {
        let engine = ProofEngineBuilder::default()
            .bits(12)
            .algorithm(HashAlgorithm::Blake3)
            .build_validated()
            .expect("build engine");
        let proof = engine.solve().expect("solve");
        if !proof.meets(HashAlgorithm::Sha1, 12) {
            assert_eq!(
                verifier(12).check(&proof),
                Err(VerifyError::PredicateFailed)
            );
        }
    }

    #[test]
    fn custom_engine_shape_needs_matching_bounds() {
        let engine = ProofEngineBuilder::default()
            .bits(4)
            .prefix_len(16)
            .counter_width(8)
            .build_validated()
            .expect("build engine");
        let proof = engine.solve().expect("solve");
        assert_eq!(proof.len(), 24);

        assert!(matches!(
            verifier(4).verify(&proof.encode()),
            Err(VerifyError::MalformedProof { len: 24, .. })
        ));

        let config = VerifierConfig::for_engine(&engine);
        assert_eq!((config.min_len, config.max_len), (24, 24));
        let matching = Verifier::new(config).expect("valid config");
        assert_eq!(matching.verify(&proof.encode()), Ok(proof));
    }

    #[test]
    fn engine_bounds_cover_counter_widening() {
        let engine = ProofEngineBuilder::default()
            .bits(0)
            .counter_width(2)
            .build_validated()
            .expect("build engine");
        let config = VerifierConfig::for_engine(&engine);
        assert_eq!(config.min_len, DEFAULT_PREFIX_LEN + 2);
        assert_eq!(config.max_len, DEFAULT_PREFIX_LEN + MAX_COUNTER_WIDTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        assert!(VerifierConfig::default().validate().is_ok());
        let too_hard = VerifierConfig {
            bits: 161,
            ..VerifierConfig::default()
        };
        assert!(matches!(too_hard.validate(), Err(Error::InvalidConfig(_))));
        let inverted = VerifierConfig {
            min_len: 21,
            max_len: 20,
            ..VerifierConfig::default()
        };
        assert!(Verifier::new(inverted).is_err());
        let empty = VerifierConfig {
            min_len: 0,
            ..VerifierConfig::default()
        };
        assert!(empty.validate().is_err());
    }
}
