//! C ABI for native callers
//!
//! Sessions created through these functions live in a process-wide
//! [`Registry`]. Callers receive a `u64` token where `0` is the invalid
//! handle. Every entry point catches panics, and every failure degrades to a
//! sentinel: a `0` token, a `0` digest or a negative [`FhStatus`].
//!
//! The registry lock only covers the slot table. A session is checked out
//! of its slot for the duration of an update or digest, so distinct tokens
//! hash in parallel. Driving one token from several threads at once is a
//! caller error; the loser of such a race sees [`FhStatus::SessionBusy`] or a
//! silently dropped update.

use crate::config::HasherConfig;
use crate::error::{HashError, Result};
use crate::hash::{SessionAlgorithm, CRYPTO_OUT_LEN, KEY_LEN};
use crate::session::{Session, SessionManager, SessionToken};
use parking_lot::Mutex;
use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

/// Status returned by digest entry points
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FhStatus {
    /// Success
    Ok = 0,
    /// Null, stale or freed token
    InvalidHandle = -1,
    /// Null pointer, short buffer or bad length
    InvalidArgument = -2,
    /// Digest function does not match the session's algorithm
    AlgorithmMismatch = -3,
    /// Session is in use by another thread
    SessionBusy = -4,
    /// No session slot available
    AllocationFailure = -5,
    /// A panic was caught at the boundary
    Panic = -6,
}

impl FhStatus {
    /// Static description of this status
    pub fn message(&self) -> &'static CStr {
        match self {
            Self::Ok => c"ok",
            Self::InvalidHandle => c"invalid session handle",
            Self::InvalidArgument => c"invalid argument",
            Self::AlgorithmMismatch => c"algorithm mismatch",
            Self::SessionBusy => c"session busy",
            Self::AllocationFailure => c"allocation failure",
            Self::Panic => c"internal panic",
        }
    }

    fn from_raw(raw: i32) -> Option<Self> {
        [
            Self::Ok,
            Self::InvalidHandle,
            Self::InvalidArgument,
            Self::AlgorithmMismatch,
            Self::SessionBusy,
            Self::AllocationFailure,
            Self::Panic,
        ]
        .into_iter()
        .find(|status| *status as i32 == raw)
    }
}

impl From<&HashError> for FhStatus {
    fn from(err: &HashError) -> Self {
        match err {
            HashError::InvalidHandle(_) => Self::InvalidHandle,
            HashError::SessionBusy(_) => Self::SessionBusy,
            HashError::AlgorithmMismatch { .. } => Self::AlgorithmMismatch,
            HashError::AllocationFailure { .. } | HashError::OutputAllocation { .. } => {
                Self::AllocationFailure
            }
            _ => Self::InvalidArgument,
        }
    }
}

impl<T> From<Result<T>> for FhStatus {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(err) => Self::from(&err),
        }
    }
}

/// Thread-safe session table
pub struct Registry {
    sessions: Mutex<SessionManager>,
}

impl Registry {
    /// Create a registry holding at most `capacity` live sessions
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(SessionManager::with_capacity(capacity)),
        }
    }

    /// Create a session
    pub fn create(&self, algorithm: SessionAlgorithm, key: Option<&[u8]>) -> Result<SessionToken> {
        self.sessions.lock().create(algorithm, key)
    }

    /// Run `f` on a session without holding the registry lock
    ///
    /// If `f` panics the session is freed and its token becomes invalid.
    pub fn with_session<R>(&self, token: SessionToken, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        let mut session = self.sessions.lock().checkout(token)?;
        let guard = FreeOnUnwind {
            sessions: &self.sessions,
            token,
        };
        let result = f(session.as_mut());
        std::mem::forget(guard);
        self.sessions.lock().restore(token, session);
        Ok(result)
    }

    /// Release a session; returns `false` for invalid tokens
    pub fn free(&self, token: SessionToken) -> bool {
        self.sessions.lock().free(token)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

/// Frees a checked-out slot unless defused with `mem::forget`
struct FreeOnUnwind<'a> {
    sessions: &'a Mutex<SessionManager>,
    token: SessionToken,
}

impl Drop for FreeOnUnwind<'_> {
    fn drop(&mut self) {
        tracing::warn!("Freeing session {} after a panic", self.token);
        self.sessions.lock().free(self.token);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(HasherConfig::default().max_sessions)
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::default);

/// Run `f`, mapping a panic to `fallback`
fn abi_boundary<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!("Panic caught at C ABI boundary");
        fallback
    })
}

fn create(algorithm: SessionAlgorithm, key: Option<&[u8]>) -> u64 {
    abi_boundary(0, || match REGISTRY.create(algorithm, key) {
        Ok(token) => token.into_raw(),
        Err(_) => 0,
    })
}

/// Create an XXH3 64-bit session. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn fh_xxh3_64_init() -> u64 {
    create(SessionAlgorithm::FastHash64, None)
}

/// Create an XXH3 128-bit session. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn fh_xxh3_128_init() -> u64 {
    create(SessionAlgorithm::FastHash128, None)
}

/// Create a BLAKE3 session. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn fh_blake3_init() -> u64 {
    create(SessionAlgorithm::CryptoHash, None)
}

/// Create a keyed BLAKE3 session. Returns 0 unless `key_len` is 32.
///
/// # Safety
///
/// `key` must be null or point to `key_len` readable bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn fh_blake3_init_keyed(key: *const u8, key_len: usize) -> u64 {
    if key.is_null() || key_len != KEY_LEN {
        tracing::warn!("Rejected keyed BLAKE3 session: key length {}", key_len);
        return 0;
    }
    // SAFETY: the caller guarantees `key` points to `key_len` readable bytes.
    let key = unsafe { std::slice::from_raw_parts(key, key_len) };
    create(SessionAlgorithm::CryptoHashKeyed, Some(key))
}

/// Feed `length` bytes at `data` into a session.
///
/// Null tokens, null `data` and `length <= 0` are ignored. The bytes are
/// consumed before the call returns.
///
/// # Safety
///
/// `data` must be null or point to `length` readable bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn fh_update(token: u64, data: *const u8, length: isize) {
    if token == 0 || data.is_null() || length <= 0 {
        return;
    }
    // SAFETY: the caller guarantees `data` points to `length` readable bytes.
    let data = unsafe { std::slice::from_raw_parts(data, length as usize) };
    abi_boundary((), || {
        if let Err(e) = REGISTRY.with_session(SessionToken::from_raw(token), |s| s.update(data)) {
            tracing::trace!("Ignoring update: {}", e);
        }
    })
}

/// XXH3 64-bit digest. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn fh_xxh3_64_digest(token: u64) -> u64 {
    abi_boundary(0, || {
        REGISTRY
            .with_session(SessionToken::from_raw(token), |s| s.digest_fast64())
            .and_then(|digest| digest)
            .unwrap_or(0)
    })
}

/// Copy a digest into a caller buffer of `out_len` bytes.
///
/// # Safety
///
/// `out` must be null or point to `out_len` writable bytes.
#[allow(unsafe_code)]
unsafe fn write_digest(
    token: u64,
    out: *mut u8,
    out_len: usize,
    min_len: usize,
    f: impl FnOnce(&mut Session, &mut [u8]) -> Result<()>,
) -> FhStatus {
    if out.is_null() || out_len < min_len {
        return FhStatus::InvalidArgument;
    }
    // SAFETY: the caller guarantees `out` points to `out_len` writable bytes.
    let out = unsafe { std::slice::from_raw_parts_mut(out, out_len) };
    abi_boundary(FhStatus::Panic, || {
        REGISTRY
            .with_session(SessionToken::from_raw(token), |s| f(s, out))
            .and_then(|result| result)
            .into()
    })
}

/// XXH3 128-bit digest: 16 bytes, high word then low word, each big-endian.
///
/// # Safety
///
/// `out` must be null or point to `out_len` writable bytes; `out_len` must
/// be at least 16.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn fh_xxh3_128_digest(token: u64, out: *mut u8, out_len: usize) -> FhStatus {
    // SAFETY: forwarded caller contract.
    unsafe {
        write_digest(token, out, out_len, 16, |s, out| {
            out[..16].copy_from_slice(&s.digest_fast128()?);
            Ok(())
        })
    }
}

/// BLAKE3 digest of a plain or keyed session: 32 bytes.
///
/// # Safety
///
/// `out` must be null or point to `out_len` writable bytes; `out_len` must
/// be at least 32.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn fh_blake3_digest(token: u64, out: *mut u8, out_len: usize) -> FhStatus {
    // SAFETY: forwarded caller contract.
    unsafe {
        write_digest(token, out, out_len, CRYPTO_OUT_LEN, |s, out| {
            out[..CRYPTO_OUT_LEN].copy_from_slice(&s.digest_crypto()?);
            Ok(())
        })
    }
}

/// BLAKE3 extendable output filling all `out_len` bytes.
///
/// # Safety
///
/// `out` must be null or point to `out_len` writable bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn fh_blake3_digest_xof(token: u64, out: *mut u8, out_len: usize) -> FhStatus {
    // SAFETY: forwarded caller contract.
    unsafe { write_digest(token, out, out_len, 1, |s, out| s.digest_xof_into(out)) }
}

/// Release a session. Null, stale and repeated tokens are ignored.
#[no_mangle]
pub extern "C" fn fh_free(token: u64) {
    abi_boundary((), || {
        REGISTRY.free(SessionToken::from_raw(token));
    })
}

/// Static, NUL-terminated description of a status code.
#[no_mangle]
pub extern "C" fn fh_status_message(status: i32) -> *const c_char {
    FhStatus::from_raw(status)
        .map_or(c"unknown status", |status| status.message())
        .as_ptr()
}
