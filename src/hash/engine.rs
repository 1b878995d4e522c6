//! Engine state for the four session algorithms
//!
//! XXH3 comes from `xxhash-rust`, BLAKE3 from `blake3`. Both expose
//! non-consuming digests, so [`Engine::digest`] is a peek: it can be called
//! repeatedly and the stream can keep growing afterwards.

use super::digest::Digest;
use crate::error::{HashError, Result};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// Key length required by keyed BLAKE3
pub const KEY_LEN: usize = blake3::KEY_LEN;

/// Default BLAKE3 output length
pub const CRYPTO_OUT_LEN: usize = blake3::OUT_LEN;

/// Algorithm of a hash session, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionAlgorithm {
    /// XXH3 64-bit, seed 0
    FastHash64,
    /// XXH3 128-bit, seed 0
    FastHash128,
    /// BLAKE3 hash mode
    CryptoHash,
    /// BLAKE3 keyed hash mode
    CryptoHashKeyed,
}

impl SessionAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FastHash64 => "XXH3-64",
            Self::FastHash128 => "XXH3-128",
            Self::CryptoHash => "BLAKE3",
            Self::CryptoHashKeyed => "BLAKE3-keyed",
        }
    }

    /// Size of the default digest in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::FastHash64 => 8,
            Self::FastHash128 => 16,
            Self::CryptoHash | Self::CryptoHashKeyed => CRYPTO_OUT_LEN,
        }
    }

    /// Whether creation needs a key
    pub fn requires_key(&self) -> bool {
        matches!(self, Self::CryptoHashKeyed)
    }

    /// Whether the engine supports extendable output
    pub fn is_extendable(&self) -> bool {
        matches!(self, Self::CryptoHash | Self::CryptoHashKeyed)
    }
}

impl std::fmt::Display for SessionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Exclusively owned state of an external hash engine
#[allow(clippy::large_enum_variant)]
#[derive(Clone)]
pub enum Engine {
    /// XXH3 streaming state, finalized as 64 bits
    FastHash64(Xxh3),
    /// XXH3 streaming state, finalized as 128 bits
    FastHash128(Xxh3),
    /// BLAKE3 hasher
    CryptoHash(blake3::Hasher),
    /// BLAKE3 hasher initialized with a key
    CryptoHashKeyed(blake3::Hasher),
}

impl Engine {
    /// Initialize engine state for `algorithm`
    ///
    /// `key` must be present and exactly [`KEY_LEN`] bytes for
    /// [`SessionAlgorithm::CryptoHashKeyed`], and absent otherwise. The key is
    /// copied into the BLAKE3 key schedule and not kept anywhere else.
    pub fn new(algorithm: SessionAlgorithm, key: Option<&[u8]>) -> Result<Self> {
        match (algorithm, key) {
            (SessionAlgorithm::CryptoHashKeyed, key) => {
                let key = key.unwrap_or_default();
                let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| HashError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: key.len(),
                })?;
                Ok(Self::CryptoHashKeyed(blake3::Hasher::new_keyed(key)))
            }
            (_, Some(_)) => Err(HashError::invalid_input(format!(
                "{} does not take a key",
                algorithm
            ))),
            (SessionAlgorithm::FastHash64, None) => Ok(Self::FastHash64(Xxh3::new())),
            (SessionAlgorithm::FastHash128, None) => Ok(Self::FastHash128(Xxh3::new())),
            (SessionAlgorithm::CryptoHash, None) => Ok(Self::CryptoHash(blake3::Hasher::new())),
        }
    }

    /// Initialize a keyed BLAKE3 engine
    pub fn new_keyed(key: &[u8; KEY_LEN]) -> Self {
        Self::CryptoHashKeyed(blake3::Hasher::new_keyed(key))
    }

    /// Get the algorithm this engine runs
    pub fn algorithm(&self) -> SessionAlgorithm {
        match self {
            Self::FastHash64(_) => SessionAlgorithm::FastHash64,
            Self::FastHash128(_) => SessionAlgorithm::FastHash128,
            Self::CryptoHash(_) => SessionAlgorithm::CryptoHash,
            Self::CryptoHashKeyed(_) => SessionAlgorithm::CryptoHashKeyed,
        }
    }

    /// Feed more data into the engine
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::FastHash64(h) | Self::FastHash128(h) => h.update(data),
            Self::CryptoHash(h) | Self::CryptoHashKeyed(h) => {
                h.update(data);
            }
        }
    }

    /// Digest of everything fed so far
    pub fn digest(&self) -> Digest {
        match self {
            Self::FastHash64(h) => Digest::Fast64(h.digest()),
            Self::FastHash128(h) => Digest::Fast128(h.digest128()),
            Self::CryptoHash(h) | Self::CryptoHashKeyed(h) => Digest::Crypto(*h.finalize().as_bytes()),
        }
    }

    /// Fill `out` with BLAKE3 extendable output
    ///
    /// The first [`CRYPTO_OUT_LEN`] bytes equal the default digest.
    pub fn digest_xof(&self, out: &mut [u8]) -> Result<()> {
        match self {
            Self::CryptoHash(h) | Self::CryptoHashKeyed(h) => {
                h.finalize_xof().fill(out);
                Ok(())
            }
            Self::FastHash64(_) | Self::FastHash128(_) => Err(HashError::AlgorithmMismatch {
                expected: SessionAlgorithm::CryptoHash.name(),
                actual: self.algorithm().name(),
            }),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Engine").field(&self.algorithm()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_requires_exact_key() {
        assert!(Engine::new(SessionAlgorithm::CryptoHashKeyed, Some(&[7u8; 32])).is_ok());

        for len in [0usize, 1, 16, 31, 33, 64] {
            let key = vec![7u8; len];
            match Engine::new(SessionAlgorithm::CryptoHashKeyed, Some(&key)) {
                Err(HashError::InvalidKeyLength { expected, actual }) => {
                    assert_eq!(expected, 32);
                    assert_eq!(actual, len);
                }
                other => panic!("unexpected result for len {}: {:?}", len, other),
            }
        }

        assert!(matches!(
            Engine::new(SessionAlgorithm::CryptoHashKeyed, None),
            Err(HashError::InvalidKeyLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_unkeyed_rejects_key() {
        let err = Engine::new(SessionAlgorithm::FastHash64, Some(&[0u8; 32])).unwrap_err();
        assert!(matches!(err, HashError::InvalidInput(_)));
    }

    #[test]
    fn test_engines_match_reference_functions() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let key = [0x42u8; KEY_LEN];

        let mut fast64 = Engine::new(SessionAlgorithm::FastHash64, None).unwrap();
        let mut fast128 = Engine::new(SessionAlgorithm::FastHash128, None).unwrap();
        let mut crypto = Engine::new(SessionAlgorithm::CryptoHash, None).unwrap();
        let mut keyed = Engine::new_keyed(&key);

        for engine in [&mut fast64, &mut fast128, &mut crypto, &mut keyed] {
            engine.update(data);
        }

        assert_eq!(fast64.digest(), Digest::Fast64(xxhash_rust::xxh3::xxh3_64(data)));
        assert_eq!(fast128.digest(), Digest::Fast128(xxhash_rust::xxh3::xxh3_128(data)));
        assert_eq!(crypto.digest(), Digest::Crypto(*blake3::hash(data).as_bytes()));
        assert_eq!(keyed.digest(), Digest::Crypto(*blake3::keyed_hash(&key, data).as_bytes()));
    }

    #[test]
    fn test_xof_prefix_matches_digest() {
        let mut engine = Engine::new(SessionAlgorithm::CryptoHash, None).unwrap();
        engine.update(b"extendable");

        let mut long = [0u8; 64];
        engine.digest_xof(&mut long).unwrap();
        assert_eq!(&long[..32], engine.digest().as_bytes().as_slice());

        let fast = Engine::new(SessionAlgorithm::FastHash128, None).unwrap();
        assert!(matches!(
            fast.digest_xof(&mut long),
            Err(HashError::AlgorithmMismatch { .. })
        ));
    }
}
