//! Incremental hash sessions
//!
//! A [`Session`] owns one engine state and moves through
//! `create -> update* -> digest* -> free`. The [`SessionManager`] hands out
//! generation-checked [`SessionToken`]s so callers never hold the session
//! itself.

mod arena;
mod token;

pub use arena::SessionManager;
pub use token::SessionToken;

use crate::error::{HashError, Result};
use crate::hash::{Digest, Engine, SessionAlgorithm, CRYPTO_OUT_LEN};

/// One incremental hash computation
#[derive(Debug, Clone)]
pub struct Session {
    engine: Engine,
    bytes_ingested: u64,
    digests_taken: u64,
}

impl Session {
    /// Create a session; `key` is required for keyed BLAKE3 only
    pub fn new(algorithm: SessionAlgorithm, key: Option<&[u8]>) -> Result<Self> {
        Ok(Self::from_engine(Engine::new(algorithm, key)?))
    }

    /// Wrap an initialized engine
    pub fn from_engine(engine: Engine) -> Self {
        Self {
            engine,
            bytes_ingested: 0,
            digests_taken: 0,
        }
    }

    /// Get the algorithm of this session
    pub fn algorithm(&self) -> SessionAlgorithm {
        self.engine.algorithm()
    }

    /// Feed more data; empty slices are ignored
    pub fn update(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.engine.update(data);
        self.bytes_ingested += data.len() as u64;
    }

    /// Digest of everything fed so far, without ending the session
    pub fn digest(&mut self) -> Digest {
        self.digests_taken += 1;
        self.engine.digest()
    }

    /// XXH3 64-bit digest
    pub fn digest_fast64(&mut self) -> Result<u64> {
        self.require(&[SessionAlgorithm::FastHash64])?;
        self.digest()
            .as_u64()
            .ok_or_else(|| mismatch(SessionAlgorithm::FastHash64, self.algorithm()))
    }

    /// XXH3 128-bit digest, high word first, each word big-endian
    pub fn digest_fast128(&mut self) -> Result<[u8; 16]> {
        self.require(&[SessionAlgorithm::FastHash128])?;
        match self.digest() {
            Digest::Fast128(value) => Ok(value.to_be_bytes()),
            _ => Err(mismatch(SessionAlgorithm::FastHash128, self.algorithm())),
        }
    }

    /// BLAKE3 digest of a plain or keyed session
    pub fn digest_crypto(&mut self) -> Result<[u8; CRYPTO_OUT_LEN]> {
        self.require(&[SessionAlgorithm::CryptoHash, SessionAlgorithm::CryptoHashKeyed])?;
        match self.digest() {
            Digest::Crypto(bytes) => Ok(bytes),
            _ => Err(mismatch(SessionAlgorithm::CryptoHash, self.algorithm())),
        }
    }

    /// BLAKE3 extendable output of `len` bytes
    ///
    /// Fails with `OutputAllocation` when `len` bytes cannot be reserved.
    pub fn digest_xof(&mut self, len: usize) -> Result<Vec<u8>> {
        self.require(&[SessionAlgorithm::CryptoHash, SessionAlgorithm::CryptoHashKeyed])?;
        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| HashError::OutputAllocation { len })?;
        out.resize(len, 0);
        self.digest_xof_into(&mut out)?;
        Ok(out)
    }

    /// Fill `out` with BLAKE3 extendable output
    pub fn digest_xof_into(&mut self, out: &mut [u8]) -> Result<()> {
        if out.is_empty() {
            return Err(HashError::invalid_input("output length must be at least 1"));
        }
        self.engine.digest_xof(out)?;
        self.digests_taken += 1;
        Ok(())
    }

    /// Bytes fed so far
    pub fn bytes_ingested(&self) -> u64 {
        self.bytes_ingested
    }

    /// Number of digests served so far
    pub fn digests_taken(&self) -> u64 {
        self.digests_taken
    }

    fn require(&self, accepted: &[SessionAlgorithm]) -> Result<()> {
        if accepted.contains(&self.algorithm()) {
            Ok(())
        } else {
            Err(mismatch(accepted[0], self.algorithm()))
        }
    }
}

fn mismatch(expected: SessionAlgorithm, actual: SessionAlgorithm) -> HashError {
    HashError::AlgorithmMismatch {
        expected: expected.name(),
        actual: actual.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [SessionAlgorithm; 4] = [
        SessionAlgorithm::FastHash64,
        SessionAlgorithm::FastHash128,
        SessionAlgorithm::CryptoHash,
        SessionAlgorithm::CryptoHashKeyed,
    ];

    const KEY: [u8; 32] = *b"whats the Elvish word for friend";

    fn new_session(algorithm: SessionAlgorithm) -> Session {
        let key = algorithm.requires_key().then_some(&KEY[..]);
        Session::new(algorithm, key).unwrap()
    }

    fn hash_whole(algorithm: SessionAlgorithm, data: &[u8]) -> Digest {
        let mut session = new_session(algorithm);
        session.update(data);
        session.digest()
    }

    #[test]
    fn test_xxh3_64_empty_vector() {
        let mut session = new_session(SessionAlgorithm::FastHash64);
        assert_eq!(session.digest(), Digest::Fast64(0x2d06_8005_38d3_94c2));
    }

    #[test]
    fn test_xxh3_128_abc_vector() {
        let mut session = new_session(SessionAlgorithm::FastHash128);
        session.update(b"abc");
        let bytes = session.digest().as_bytes();

        let high = u64::from_be_bytes(bytes[..8].try_into().unwrap());
        let low = u64::from_be_bytes(bytes[8..].try_into().unwrap());
        assert_eq!(high, 0x06b0_5ab6_733a_6185);
        assert_eq!(low, 0x78af_5f94_892f_3950);

        let reference = xxhash_rust::xxh3::xxh3_128(b"abc");
        assert_eq!(high, (reference >> 64) as u64);
        assert_eq!(low, reference as u64);
    }

    #[test]
    fn test_blake3_empty_vector() {
        let mut session = new_session(SessionAlgorithm::CryptoHash);
        assert_eq!(
            session.digest().to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_empty_update_is_noop() {
        for algorithm in ALL {
            let mut session = new_session(algorithm);
            let before = session.clone().digest();
            session.update(&[]);
            assert_eq!(session.bytes_ingested(), 0);
            assert_eq!(session.digest(), before);
        }
    }

    #[test]
    fn test_digest_is_repeatable() {
        for algorithm in ALL {
            let mut session = new_session(algorithm);
            session.update(b"peek twice");
            let first = session.digest();
            let second = session.digest();
            assert_eq!(first, second);
            assert_eq!(session.digests_taken(), 2);
        }
    }

    #[test]
    fn test_update_after_digest_extends_stream() {
        for algorithm in ALL {
            let mut session = new_session(algorithm);
            session.update(b"hello ");
            let partial = session.digest();
            session.update(b"world");

            assert_eq!(partial, hash_whole(algorithm, b"hello "));
            assert_eq!(session.digest(), hash_whole(algorithm, b"hello world"));
            assert_eq!(session.bytes_ingested(), 11);
        }
    }

    #[test]
    fn test_large_input_crosses_internal_buffers() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        for algorithm in ALL {
            let mut session = new_session(algorithm);
            for chunk in data.chunks(4093) {
                session.update(chunk);
            }
            assert_eq!(session.digest(), hash_whole(algorithm, &data));
        }
    }

    #[test]
    fn test_digest_xof() {
        let mut session = new_session(SessionAlgorithm::CryptoHashKeyed);
        session.update(b"xof");
        let out = session.digest_xof(100).unwrap();
        assert_eq!(out.len(), 100);
        assert_eq!(&out[..32], session.digest().as_bytes().as_slice());

        assert!(session.digest_xof(0).is_err());
        assert!(new_session(SessionAlgorithm::FastHash64).digest_xof(32).is_err());
    }

    #[test]
    fn test_digest_xof_oversized_length() {
        let mut session = new_session(SessionAlgorithm::CryptoHash);
        assert!(matches!(
            session.digest_xof(usize::MAX),
            Err(HashError::OutputAllocation { len: usize::MAX })
        ));
        assert_eq!(session.digests_taken(), 0);
        assert_eq!(session.digest_xof(64).unwrap().len(), 64);
    }

    #[test]
    fn test_typed_digests() {
        let mut fast64 = new_session(SessionAlgorithm::FastHash64);
        let mut fast128 = new_session(SessionAlgorithm::FastHash128);
        let mut keyed = new_session(SessionAlgorithm::CryptoHashKeyed);

        assert_eq!(fast64.digest_fast64().unwrap(), 0x2d06_8005_38d3_94c2);
        assert!(fast64.digest_crypto().is_err());

        fast128.update(b"abc");
        assert_eq!(
            hex::encode(fast128.digest_fast128().unwrap()),
            "06b05ab6733a618578af5f94892f3950"
        );
        assert!(matches!(
            fast128.digest_fast64(),
            Err(HashError::AlgorithmMismatch { expected: "XXH3-64", actual: "XXH3-128" })
        ));

        assert_eq!(
            keyed.digest_crypto().unwrap(),
            *blake3::keyed_hash(&KEY, b"").as_bytes()
        );
    }

    proptest! {
        #[test]
        fn prop_split_updates_match_single_update(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
            points.sort_unstable();

            for algorithm in ALL {
                let mut session = new_session(algorithm);
                let mut start = 0;
                for &point in &points {
                    session.update(&data[start..point]);
                    start = point;
                }
                session.update(&data[start..]);

                prop_assert_eq!(session.digest(), hash_whole(algorithm, &data));
                prop_assert_eq!(session.bytes_ingested(), data.len() as u64);
            }
        }
    }
}
