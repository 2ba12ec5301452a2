/// Reasons a submitted proof is rejected by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("malformed proof encoding: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("proof length {len} outside accepted range {min}..={max}")]
    MalformedProof { len: usize, min: usize, max: usize },
    #[error("proof does not meet difficulty")]
    PredicateFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// The caller's attempt budget ran out; retry with a fresh prefix.
    #[error("proof search gave up after {attempts} attempts")]
    GenerationExhausted { attempts: u64 },
    #[error("solver channel closed")]
    ChannelClosed,
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::GenerationExhausted { .. })
    }
}
