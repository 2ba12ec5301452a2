use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

use crate::core::meets_leading_zero_bits;
use crate::HashAlgorithm;

/// Raw proof bytes: a random prefix followed by a big-endian counter.
///
/// On the wire a proof travels as URL-safe base64 without padding, which can be
/// placed in a URL path segment as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proof(Vec<u8>);

impl Proof {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Proof(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Transport encoding of the proof.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn decode(encoded: &str) -> Result<Self, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(encoded).map(Proof)
    }

    /// Digest over the proof bytes themselves.
    ///
    /// This is the exact byte string the search hashed before wrapping it into
    /// a `Proof`; the verifier must hash nothing else.
    pub fn digest(&self, algorithm: HashAlgorithm) -> Vec<u8> {
        algorithm.digest(&self.0)
    }

    pub fn meets(&self, algorithm: HashAlgorithm, bits: u32) -> bool {
        meets_leading_zero_bits(&self.digest(algorithm), bits)
    }

    /// Digest as hex, for logging.
    pub fn digest_hex(&self, algorithm: HashAlgorithm) -> String {
        hex::encode(self.digest(algorithm))
    }
}

impl Display for Proof {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl AsRef<[u8]> for Proof {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Serialized in its transport encoding so JSON and TOML carry the same string
// that goes into the URL.
impl Serialize for Proof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Proof::decode(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_path_safe() {
        let proof = Proof::from_bytes(vec![0xfb, 0xff, 0xfe, 0x3e, 0x3f, 0x00]);
        let encoded = proof.encode();
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(Proof::decode(&encoded).unwrap(), proof);
    }

    #[test]
    fn decode_rejects_standard_alphabet() {
        assert!(Proof::decode("+/+/").is_err());
        assert!(Proof::decode("not base64!").is_err());
    }

    #[test]
    fn digest_covers_proof_bytes() {
        let proof = Proof::from_bytes(b"hello world".to_vec());
        assert_eq!(
            proof.digest_hex(HashAlgorithm::Sha1),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert!(proof.meets(HashAlgorithm::Sha1, 2));
        assert!(!proof.meets(HashAlgorithm::Sha1, 3));
    }

    #[test]
    fn serde_uses_transport_encoding() {
        let proof = Proof::from_bytes(vec![1, 2, 3, 4]);
        let json = serde_json::to_string(&proof).unwrap();
        assert_eq!(json, format!("\"{}\"", proof.encode()));
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }
}
