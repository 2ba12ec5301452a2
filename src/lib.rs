//! Proof-of-work gate for a quote server.
//!
//! A client searches for a short byte string whose digest starts with a
//! required number of zero bits ([`ProofEngine`]). The server recomputes the
//! digest over exactly those bytes ([`Verifier`]), refuses proofs it has
//! accepted recently ([`gate::MokaReplayCache`]) and hands out a quote on
//! success ([`gate::QuoteGate`]).
//!
//! The `http` feature adds an axum server, a reqwest client and the two
//! binaries built on them.

pub mod core;
pub mod engine;
pub mod error;
pub mod gate;
#[cfg(feature = "http")]
pub mod http;
pub mod types;
pub mod verify;
pub mod work;

use ripemd::Ripemd320;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use crate::core::{leading_zero_bits, meets_leading_zero_bits};
pub use crate::engine::{ProofEngine, ProofEngineBuilder};
pub use crate::error::{Error, VerifyError};
pub use crate::types::Proof;
pub use crate::verify::{Verifier, VerifierConfig};

/// Digest functions a proof can be searched and checked against.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha2_256,
    Sha2_512,
    Ripemd320,
    Blake3,
}

impl HashAlgorithm {
    /// Length of the produced digest in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha2_256 | Self::Blake3 => 32,
            Self::Ripemd320 => 40,
            Self::Sha2_512 => 64,
        }
    }

    /// Length of the produced digest in bits, the upper bound for a difficulty.
    pub const fn digest_bits(&self) -> u32 {
        (self.digest_len() * 8) as u32
    }

    /// Hash `data` with the selected algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => digest_with::<Sha1>(data),
            Self::Sha2_256 => digest_with::<Sha256>(data),
            Self::Sha2_512 => digest_with::<Sha512>(data),
            Self::Ripemd320 => digest_with::<Ripemd320>(data),
            Self::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha2_256 => "sha2_256",
            Self::Sha2_512 => "sha2_512",
            Self::Ripemd320 => "ripemd320",
            Self::Blake3 => "blake3",
        }
    }
}

fn digest_with<D: Digest>(data: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha2_256" | "sha256" => Ok(Self::Sha2_256),
            "sha2_512" | "sha512" => Ok(Self::Sha2_512),
            "ripemd320" | "ripemd_320" => Ok(Self::Ripemd320),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}
