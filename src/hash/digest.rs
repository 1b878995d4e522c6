//! Fixed-width digest values produced by hash sessions

use super::engine::{SessionAlgorithm, CRYPTO_OUT_LEN};

/// Digest produced by [`Engine::digest`](super::Engine::digest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// XXH3 64-bit value
    Fast64(u64),
    /// XXH3 128-bit value; the high word occupies bits 64..128
    Fast128(u128),
    /// BLAKE3 default-length output
    Crypto([u8; CRYPTO_OUT_LEN]),
}

impl Digest {
    /// Algorithm family that produced this digest
    pub fn algorithm(&self) -> SessionAlgorithm {
        match self {
            Self::Fast64(_) => SessionAlgorithm::FastHash64,
            Self::Fast128(_) => SessionAlgorithm::FastHash128,
            Self::Crypto(_) => SessionAlgorithm::CryptoHash,
        }
    }

    /// Length of the byte form
    pub fn len(&self) -> usize {
        match self {
            Self::Fast64(_) => 8,
            Self::Fast128(_) => 16,
            Self::Crypto(_) => CRYPTO_OUT_LEN,
        }
    }

    /// Digests are never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Byte form of the digest
    ///
    /// Fast128 is laid out as the high 64-bit word most-significant byte
    /// first, followed by the low word most-significant byte first. This is
    /// the XXH3 canonical representation.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Self::Fast64(value) => value.to_be_bytes().to_vec(),
            Self::Fast128(value) => value.to_be_bytes().to_vec(),
            Self::Crypto(bytes) => bytes.to_vec(),
        }
    }

    /// Copy the byte form into `out`, returning the number of bytes written
    ///
    /// Returns `None` when `out` is too short.
    pub fn write_to(&self, out: &mut [u8]) -> Option<usize> {
        let len = self.len();
        let dst = out.get_mut(..len)?;
        match self {
            Self::Fast64(value) => dst.copy_from_slice(&value.to_be_bytes()),
            Self::Fast128(value) => dst.copy_from_slice(&value.to_be_bytes()),
            Self::Crypto(bytes) => dst.copy_from_slice(bytes),
        }
        Some(len)
    }

    /// Numeric value of a 64-bit digest
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Fast64(value) => Some(*value),
            _ => None,
        }
    }

    /// `(high, low)` words of a 128-bit digest
    pub fn as_words(&self) -> Option<(u64, u64)> {
        match self {
            Self::Fast128(value) => Some(((*value >> 64) as u64, *value as u64)),
            _ => None,
        }
    }

    /// Lowercase hex of the byte form
    pub fn to_hex(&self) -> String {
        match self {
            Self::Fast64(value) => format!("{:016x}", value),
            Self::Fast128(value) => format!("{:032x}", value),
            Self::Crypto(bytes) => hex::encode(bytes),
        }
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
