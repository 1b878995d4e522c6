//! One-shot hashing of in-memory data
//!
//! Supports MD5, SHA-1, SHA-2, XXH3 and BLAKE3 in three modes: plain `hash`,
//! `hmac` (SHA-224/256/384/512) and `keyed` (BLAKE3 with a 32-byte key).
//! XXH3 and BLAKE3 run through a [`Session`] exactly like native callers of
//! the C ABI do.

use super::engine::{SessionAlgorithm, KEY_LEN};
use crate::config::{HashAlgorithm, HashMode, InputEncoding, KeyEncoding};
use crate::error::{HashError, Result};
use crate::session::Session;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use std::time::{Duration, Instant};

/// Hash result as hex string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    /// The hash algorithm used
    pub algorithm: HashAlgorithm,
    /// The mode used
    pub mode: HashMode,
    /// Hash value as lowercase hex string
    pub hash: String,
    /// Input size in bytes
    pub size: u64,
}

impl HashResult {
    /// Create a new hash result
    pub fn new(algorithm: HashAlgorithm, mode: HashMode, hash: String, size: u64) -> Self {
        Self {
            algorithm,
            mode,
            hash,
            size,
        }
    }

    /// Verify against another hash result
    pub fn verify(&self, other: &HashResult) -> bool {
        self.algorithm == other.algorithm && self.mode == other.mode && self.hash == other.hash
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Mode and key for a one-shot hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashOptions {
    /// Hashing mode
    pub mode: HashMode,
    /// Key for `hmac` and `keyed` modes
    pub key: Option<String>,
    /// Encoding of `key`
    pub key_encoding: KeyEncoding,
}

impl HashOptions {
    /// Plain hashing
    pub fn hash() -> Self {
        Self::default()
    }

    /// HMAC with the given key
    pub fn hmac(key: impl Into<String>, key_encoding: KeyEncoding) -> Self {
        Self {
            mode: HashMode::Hmac,
            key: Some(key.into()),
            key_encoding,
        }
    }

    /// Keyed BLAKE3 with the given key
    pub fn keyed(key: impl Into<String>, key_encoding: KeyEncoding) -> Self {
        Self {
            mode: HashMode::Keyed,
            key: Some(key.into()),
            key_encoding,
        }
    }

    /// Check the options against `algorithm` and decode the key
    ///
    /// Returns the decoded key for `hmac`/`keyed` modes and `None` for plain
    /// hashing.
    pub fn validate(&self, algorithm: HashAlgorithm) -> Result<Option<Vec<u8>>> {
        let mode = self.mode;
        if mode == HashMode::Hash {
            return Ok(None);
        }

        let key = match self.key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(HashError::MissingKey(mode.name())),
        };

        let capable = match mode {
            HashMode::Hmac => algorithm.is_hmac_capable(),
            HashMode::Keyed => algorithm.is_keyed_capable(),
            HashMode::Hash => true,
        };
        if !capable {
            return Err(HashError::UnsupportedMode {
                mode: mode.name(),
                algorithm: algorithm.name(),
            });
        }

        let key = decode_key(key, self.key_encoding)?;
        if mode == HashMode::Keyed && key.len() != KEY_LEN {
            return Err(HashError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        Ok(Some(key))
    }
}

/// Decode a key string
pub fn decode_key(key: &str, encoding: KeyEncoding) -> Result<Vec<u8>> {
    match encoding {
        KeyEncoding::Utf8 => Ok(key.as_bytes().to_vec()),
        KeyEncoding::Hex => {
            let cleaned: String = key.chars().filter(|c| !c.is_whitespace()).collect();
            if cleaned.len() % 2 != 0 {
                return Err(HashError::invalid_input("Hex key length must be even"));
            }
            hex::decode(&cleaned).map_err(|e| HashError::invalid_input(format!("Invalid hex key: {}", e)))
        }
        KeyEncoding::Base64 => decode_base64(key)
            .map_err(|e| HashError::invalid_input(format!("Invalid base64 key: {}", e))),
    }
}

/// Decode input text
pub fn decode_input(text: &str, encoding: InputEncoding) -> Result<Vec<u8>> {
    match encoding {
        InputEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        InputEncoding::Base64 => decode_base64(text)
            .map_err(|e| HashError::invalid_input(format!("Invalid base64 input: {}", e))),
    }
}

/// Standard alphabet, `=` padding optional
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_LENIENT.decode(cleaned)
}

/// Streaming hasher over every algorithm and mode
#[allow(clippy::large_enum_variant)]
pub enum Hasher {
    /// MD5
    Md5(md5::Md5),
    /// SHA-1
    Sha1(sha1::Sha1),
    /// SHA-224
    Sha224(Sha224),
    /// SHA-256
    Sha256(Sha256),
    /// SHA-384
    Sha384(Sha384),
    /// SHA-512
    Sha512(Sha512),
    /// HMAC-SHA-224
    HmacSha224(Hmac<Sha224>),
    /// HMAC-SHA-256
    HmacSha256(Hmac<Sha256>),
    /// HMAC-SHA-384
    HmacSha384(Hmac<Sha384>),
    /// HMAC-SHA-512
    HmacSha512(Hmac<Sha512>),
    /// XXH3 or BLAKE3 session
    Session(Session),
}

impl Hasher {
    /// Create a hasher for `algorithm` with validated options
    pub fn new(algorithm: HashAlgorithm, options: &HashOptions) -> Result<Self> {
        let key = options.validate(algorithm)?;

        let hasher = match (options.mode, algorithm, key.as_deref()) {
            (HashMode::Hmac, HashAlgorithm::Sha224, Some(key)) => Self::HmacSha224(new_mac(key)?),
            (HashMode::Hmac, HashAlgorithm::Sha256, Some(key)) => Self::HmacSha256(new_mac(key)?),
            (HashMode::Hmac, HashAlgorithm::Sha384, Some(key)) => Self::HmacSha384(new_mac(key)?),
            (HashMode::Hmac, HashAlgorithm::Sha512, Some(key)) => Self::HmacSha512(new_mac(key)?),
            (HashMode::Keyed, HashAlgorithm::Blake3, Some(key)) => {
                Self::Session(Session::new(SessionAlgorithm::CryptoHashKeyed, Some(key))?)
            }
            (HashMode::Hash, algorithm, _) => Self::plain(algorithm)?,
            (mode, algorithm, _) => {
                return Err(HashError::UnsupportedMode {
                    mode: mode.name(),
                    algorithm: algorithm.name(),
                })
            }
        };
        Ok(hasher)
    }

    fn plain(algorithm: HashAlgorithm) -> Result<Self> {
        use sha2::Digest as _;

        Ok(match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => Self::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            HashAlgorithm::Xxh3_64 => Self::Session(Session::new(SessionAlgorithm::FastHash64, None)?),
            HashAlgorithm::Xxh3_128 => Self::Session(Session::new(SessionAlgorithm::FastHash128, None)?),
            HashAlgorithm::Blake3 => Self::Session(Session::new(SessionAlgorithm::CryptoHash, None)?),
        })
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        use sha2::Digest as _;

        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::HmacSha224(h) => Mac::update(h, data),
            Self::HmacSha256(h) => Mac::update(h, data),
            Self::HmacSha384(h) => Mac::update(h, data),
            Self::HmacSha512(h) => Mac::update(h, data),
            Self::Session(s) => s.update(data),
        }
    }

    /// Finalize and get the hash as hex string
    pub fn finalize(self) -> String {
        use sha2::Digest as _;

        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha224(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha384(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::HmacSha224(h) => hex::encode(Mac::finalize(h).into_bytes()),
            Self::HmacSha256(h) => hex::encode(Mac::finalize(h).into_bytes()),
            Self::HmacSha384(h) => hex::encode(Mac::finalize(h).into_bytes()),
            Self::HmacSha512(h) => hex::encode(Mac::finalize(h).into_bytes()),
            Self::Session(mut s) => s.digest().to_hex(),
        }
    }
}

fn new_mac<M: Mac + hmac::digest::KeyInit>(key: &[u8]) -> Result<M> {
    <M as Mac>::new_from_slice(key).map_err(|e| HashError::invalid_input(format!("Invalid HMAC key: {}", e)))
}

/// Compute hash of data in memory
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm, options: &HashOptions) -> Result<HashResult> {
    let mut hasher = Hasher::new(algorithm, options)?;
    hasher.update(data);
    Ok(HashResult::new(algorithm, options.mode, hasher.finalize(), data.len() as u64))
}

/// Compute hash of a string given as UTF-8 or base64
pub fn hash_string(
    text: &str,
    algorithm: HashAlgorithm,
    encoding: InputEncoding,
    options: &HashOptions,
) -> Result<HashResult> {
    let data = decode_input(text, encoding)?;
    hash_bytes(&data, algorithm, options)
}

/// Hash many buffers in parallel, one hasher per buffer
pub fn hash_batch_parallel(
    inputs: &[&[u8]],
    algorithm: HashAlgorithm,
    options: &HashOptions,
) -> Vec<Result<HashResult>> {
    inputs
        .par_iter()
        .map(|data| hash_bytes(data, algorithm, options))
        .collect()
}

/// Throughput measurement of one algorithm
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    /// Algorithm measured
    pub algorithm: HashAlgorithm,
    /// Mean time per iteration
    pub duration: Duration,
    /// Throughput in MiB/s
    pub throughput_mibps: f64,
}

/// Benchmark hash algorithms, fastest first
pub fn benchmark_algorithms(data_size: usize, iterations: u32) -> Vec<BenchmarkResult> {
    let data: Vec<u8> = (0..data_size).map(|i| (i % 256) as u8).collect();
    let iterations = iterations.max(1);
    let options = HashOptions::hash();
    let mut results = Vec::new();

    for algorithm in HashAlgorithm::ALL {
        let start = Instant::now();

        for _ in 0..iterations {
            let _ = hash_bytes(&data, algorithm, &options);
        }

        let duration = start.elapsed() / iterations;
        let secs = duration.as_secs_f64().max(f64::EPSILON);
        let throughput_mibps = (data_size as f64) / secs / (1024.0 * 1024.0);

        tracing::debug!("{}: {:?} per iteration", algorithm, duration);
        results.push(BenchmarkResult {
            algorithm,
            duration,
            throughput_mibps,
        });
    }

    results.sort_by(|a, b| a.duration.cmp(&b.duration));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(data: &[u8], algorithm: HashAlgorithm) -> String {
        hash_bytes(data, algorithm, &HashOptions::hash()).unwrap().hash
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(plain(b"abc", HashAlgorithm::Md5), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            plain(b"abc", HashAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            plain(b"abc", HashAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(plain(b"", HashAlgorithm::Xxh3_64), "2d06800538d394c2");
        assert_eq!(plain(b"abc", HashAlgorithm::Xxh3_128), "06b05ab6733a618578af5f94892f3950");
        assert_eq!(
            plain(b"", HashAlgorithm::Blake3),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_output_lengths() {
        for algorithm in HashAlgorithm::ALL {
            let hash = plain(b"Hello, World!", algorithm);
            assert_eq!(hash.len(), algorithm.output_size() * 2, "{}", algorithm);
            assert_eq!(hash, plain(b"Hello, World!", algorithm));
        }
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let options = HashOptions::hmac("Jefe", KeyEncoding::Utf8);
        let result = hash_bytes(b"what do ya want for nothing?", HashAlgorithm::Sha256, &options).unwrap();
        assert_eq!(
            result.hash,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert_eq!(result.mode, HashMode::Hmac);
    }

    #[test]
    fn test_hmac_rejected_for_non_sha2() {
        let options = HashOptions::hmac("k", KeyEncoding::Utf8);
        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Blake3] {
            assert!(matches!(
                hash_bytes(b"x", algorithm, &options),
                Err(HashError::UnsupportedMode { mode: "hmac", .. })
            ));
        }
    }

    #[test]
    fn test_keyed_mode() {
        let hex_key = "aa".repeat(32);
        let options = HashOptions::keyed(hex_key, KeyEncoding::Hex);
        let result = hash_bytes(b"payload", HashAlgorithm::Blake3, &options).unwrap();
        assert_eq!(
            result.hash,
            blake3::keyed_hash(&[0xaa; 32], b"payload").to_hex().to_string()
        );

        let short = HashOptions::keyed("short", KeyEncoding::Utf8);
        assert!(matches!(
            hash_bytes(b"x", HashAlgorithm::Blake3, &short),
            Err(HashError::InvalidKeyLength { expected: 32, actual: 5 })
        ));

        let keyed = HashOptions::keyed("0".repeat(64), KeyEncoding::Hex);
        assert!(matches!(
            hash_bytes(b"x", HashAlgorithm::Sha256, &keyed),
            Err(HashError::UnsupportedMode { mode: "keyed", .. })
        ));
    }

    #[test]
    fn test_missing_key() {
        let options = HashOptions {
            mode: HashMode::Hmac,
            key: None,
            key_encoding: KeyEncoding::Utf8,
        };
        assert!(matches!(
            options.validate(HashAlgorithm::Sha256),
            Err(HashError::MissingKey("hmac"))
        ));
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("ab cd\n01", KeyEncoding::Hex).unwrap(), vec![0xab, 0xcd, 0x01]);
        assert!(decode_key("abc", KeyEncoding::Hex).is_err());
        assert!(decode_key("zz", KeyEncoding::Hex).is_err());
        assert_eq!(decode_key("c2VjcmV0", KeyEncoding::Base64).unwrap(), b"secret");
        assert_eq!(decode_key("secret", KeyEncoding::Utf8).unwrap(), b"secret");
    }

    #[test]
    fn test_hash_string_encodings() {
        let utf8 = hash_string("hello", HashAlgorithm::Sha256, InputEncoding::Utf8, &HashOptions::hash()).unwrap();
        let b64 = hash_string("aGVsbG8=", HashAlgorithm::Sha256, InputEncoding::Base64, &HashOptions::hash()).unwrap();
        assert!(utf8.verify(&b64));
        assert_eq!(b64.size, 5);

        let err = hash_string("@@@", HashAlgorithm::Sha256, InputEncoding::Base64, &HashOptions::hash()).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_INPUT");
    }

    #[test]
    fn test_base64_padding_optional() {
        let padded = hash_string("aGVsbG8=", HashAlgorithm::Sha256, InputEncoding::Base64, &HashOptions::hash()).unwrap();
        let unpadded = hash_string("aGVsbG8", HashAlgorithm::Sha256, InputEncoding::Base64, &HashOptions::hash()).unwrap();
        assert_eq!(padded.hash, unpadded.hash);

        assert_eq!(decode_key("c2VjcmV0Mg", KeyEncoding::Base64).unwrap(), b"secret2");
        assert_eq!(decode_key("c2VjcmV0Mg==", KeyEncoding::Base64).unwrap(), b"secret2");

        let key = base64::engine::general_purpose::STANDARD_NO_PAD.encode([7u8; 32]);
        let keyed = HashOptions::keyed(key, KeyEncoding::Base64);
        let result = hash_bytes(b"data", HashAlgorithm::Blake3, &keyed).unwrap();
        assert_eq!(result.hash, blake3::keyed_hash(&[7u8; 32], b"data").to_hex().to_string());
    }

    #[test]
    fn test_batch_parallel() {
        let inputs: Vec<Vec<u8>> = (0..32u8).map(|i| vec![i; 1000 + i as usize]).collect();
        let refs: Vec<&[u8]> = inputs.iter().map(|v| v.as_slice()).collect();

        let results = hash_batch_parallel(&refs, HashAlgorithm::Xxh3_128, &HashOptions::hash());
        assert_eq!(results.len(), inputs.len());
        for (input, result) in inputs.iter().zip(results) {
            assert_eq!(result.unwrap().hash, plain(input, HashAlgorithm::Xxh3_128));
        }
    }

    #[test]
    fn test_benchmark_covers_all_algorithms() {
        let results = benchmark_algorithms(4096, 1);
        assert_eq!(results.len(), HashAlgorithm::ALL.len());
        assert!(results.windows(2).all(|w| w[0].duration <= w[1].duration));
    }
}
