//! Generation-checked arena of hash sessions

use super::{Session, SessionToken};
use crate::config::HasherConfig;
use crate::error::{HashError, Result};
use crate::hash::{Digest, SessionAlgorithm};

enum SlotState {
    Vacant,
    Occupied(Box<Session>),
    /// Session is temporarily owned by a caller outside the arena
    CheckedOut,
}

struct Slot {
    generation: u32,
    state: SlotState,
}

impl Slot {
    /// Move to the next generation; a slot whose generations are exhausted
    /// is left at 0 and never handed out again
    fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = SlotState::Vacant;
    }

    fn is_retired(&self) -> bool {
        self.generation == 0
    }
}

/// Owner of all sessions created through it
///
/// Callers hold [`SessionToken`]s only. A token stays valid until it is passed
/// to [`free`](Self::free); after that every operation on it is rejected, even
/// when the slot has been reused by a newer session.
///
/// The manager itself is not synchronized. One session must be driven by one
/// thread at a time; separate managers (or the registry in `ffi`) are used
/// for concurrent callers.
pub struct SessionManager {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
    capacity: usize,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Create a manager with the default session capacity
    pub fn new() -> Self {
        Self::with_capacity(HasherConfig::default().max_sessions)
    }

    /// Create a manager holding at most `capacity` live sessions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            live: 0,
            capacity: capacity.min(u32::MAX as usize),
        }
    }

    /// Create a manager from configuration
    pub fn from_config(config: &HasherConfig) -> Self {
        Self::with_capacity(config.max_sessions)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Maximum number of live sessions
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `token` names a live session
    pub fn contains(&self, token: SessionToken) -> bool {
        self.slot(token)
            .is_some_and(|slot| !matches!(slot.state, SlotState::Vacant))
    }

    /// Create a session and return its token
    ///
    /// Fails with `InvalidKeyLength` when a keyed session gets anything but a
    /// 32-byte key, and with `AllocationFailure` when the arena is full. No
    /// slot is consumed on failure.
    pub fn create(&mut self, algorithm: SessionAlgorithm, key: Option<&[u8]>) -> Result<SessionToken> {
        let session = Session::new(algorithm, key).map_err(|e| {
            tracing::warn!("Rejected {} session: {}", algorithm, e);
            e
        })?;

        if self.live >= self.capacity {
            tracing::warn!("Session arena full ({} sessions)", self.capacity);
            return Err(HashError::AllocationFailure {
                capacity: self.capacity,
            });
        }

        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 1,
                    state: SlotState::Vacant,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.state = SlotState::Occupied(Box::new(session));
        self.live += 1;

        let token = SessionToken::new(index, slot.generation);
        tracing::debug!("Created {} session {}", algorithm, token);
        Ok(token)
    }

    /// Create a session from a caller-provided key slice
    pub fn create_keyed(&mut self, key: &[u8]) -> Result<SessionToken> {
        self.create(SessionAlgorithm::CryptoHashKeyed, Some(key))
    }

    /// Borrow a live session
    pub fn get(&self, token: SessionToken) -> Option<&Session> {
        match &self.slot(token)?.state {
            SlotState::Occupied(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    /// Mutably borrow a live session
    pub fn get_mut(&mut self, token: SessionToken) -> Option<&mut Session> {
        match &mut self.slot_mut(token)?.state {
            SlotState::Occupied(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    /// Feed `data` into a session
    ///
    /// Invalid tokens and empty buffers are ignored.
    pub fn update(&mut self, token: SessionToken, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        match self.get_mut(token) {
            Some(session) => session.update(data),
            None => tracing::trace!("Ignoring update on invalid session {}", token),
        }
    }

    /// Digest of everything fed into a session so far
    ///
    /// The session stays live and may keep receiving updates.
    pub fn digest(&mut self, token: SessionToken) -> Result<Digest> {
        Ok(self.session_mut(token)?.digest())
    }

    /// XXH3 64-bit digest
    pub fn digest_fast64(&mut self, token: SessionToken) -> Result<u64> {
        self.session_mut(token)?.digest_fast64()
    }

    /// XXH3 128-bit digest, high word first, each word big-endian
    pub fn digest_fast128(&mut self, token: SessionToken) -> Result<[u8; 16]> {
        self.session_mut(token)?.digest_fast128()
    }

    /// BLAKE3 digest of a plain or keyed session
    pub fn digest_crypto(&mut self, token: SessionToken) -> Result<[u8; 32]> {
        self.session_mut(token)?.digest_crypto()
    }

    /// BLAKE3 extendable output of `len` bytes
    pub fn digest_xof(&mut self, token: SessionToken, len: usize) -> Result<Vec<u8>> {
        self.session_mut(token)?.digest_xof(len)
    }

    /// Release a session
    ///
    /// Returns `false` for null, stale or already freed tokens.
    pub fn free(&mut self, token: SessionToken) -> bool {
        let Some(slot) = self.slot_mut(token) else {
            tracing::trace!("Ignoring free of invalid session {}", token);
            return false;
        };
        if matches!(slot.state, SlotState::Vacant) {
            return false;
        }

        slot.advance();
        if slot.is_retired() {
            tracing::debug!("Retiring slot {} after its last generation", token.index());
        } else {
            self.free_slots.push(token.index() as u32);
        }
        self.live -= 1;
        tracing::debug!("Freed session {}", token);
        true
    }

    /// Take a session out of its slot so it can be driven without holding
    /// the arena
    pub(crate) fn checkout(&mut self, token: SessionToken) -> Result<Box<Session>> {
        let slot = self.slot_mut(token).ok_or(HashError::InvalidHandle(token.into_raw()))?;
        match std::mem::replace(&mut slot.state, SlotState::CheckedOut) {
            SlotState::Occupied(session) => Ok(session),
            SlotState::CheckedOut => Err(HashError::SessionBusy(token.into_raw())),
            SlotState::Vacant => {
                slot.state = SlotState::Vacant;
                Err(HashError::InvalidHandle(token.into_raw()))
            }
        }
    }

    /// Return a checked-out session to its slot
    ///
    /// If the token was freed in the meantime the session is dropped and
    /// `false` is returned.
    pub(crate) fn restore(&mut self, token: SessionToken, session: Box<Session>) -> bool {
        match self.slot_mut(token) {
            Some(slot) if matches!(slot.state, SlotState::CheckedOut) => {
                slot.state = SlotState::Occupied(session);
                true
            }
            _ => {
                tracing::debug!("Dropping session {} freed while in use", token);
                false
            }
        }
    }

    fn slot(&self, token: SessionToken) -> Option<&Slot> {
        if token.is_null() {
            return None;
        }
        self.slots
            .get(token.index())
            .filter(|slot| slot.generation == token.generation())
    }

    fn slot_mut(&mut self, token: SessionToken) -> Option<&mut Slot> {
        if token.is_null() {
            return None;
        }
        self.slots
            .get_mut(token.index())
            .filter(|slot| slot.generation == token.generation())
    }

    fn session_mut(&mut self, token: SessionToken) -> Result<&mut Session> {
        self.get_mut(token)
            .ok_or(HashError::InvalidHandle(token.into_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_free() {
        let mut manager = SessionManager::new();
        assert!(manager.is_empty());

        let token = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        assert!(!token.is_null());
        assert!(manager.contains(token));
        assert_eq!(manager.len(), 1);

        assert!(manager.free(token));
        assert!(!manager.contains(token));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_double_free_is_noop() {
        let mut manager = SessionManager::new();
        let token = manager.create(SessionAlgorithm::CryptoHash, None).unwrap();

        assert!(manager.free(token));
        assert!(!manager.free(token));
        assert!(!manager.free(SessionToken::NULL));
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_stale_token_rejected_after_slot_reuse() {
        let mut manager = SessionManager::new();
        let old = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        manager.free(old);

        let new = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);

        manager.update(old, b"ignored");
        assert!(matches!(manager.digest(old), Err(HashError::InvalidHandle(_))));
        assert!(!manager.free(old));

        assert!(manager.contains(new));
        assert_eq!(
            manager.digest_fast64(new).unwrap(),
            xxhash_rust::xxh3::xxh3_64(b"")
        );
    }

    #[test]
    fn test_exhausted_slot_is_retired() {
        let mut manager = SessionManager::new();
        let first = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        manager.slots[first.index()].generation = u32::MAX;
        let last = SessionToken::new(first.index() as u32, u32::MAX);

        assert!(manager.free(last));
        assert!(manager.is_empty());
        assert!(!manager.contains(first));

        let next = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        assert_ne!(next.index(), first.index());
        assert!(!next.is_null());
        assert!(!manager.free(first));
    }

    #[test]
    fn test_capacity_limit() {
        let mut manager = SessionManager::with_capacity(2);
        let a = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
        let _b = manager.create(SessionAlgorithm::FastHash128, None).unwrap();

        assert!(matches!(
            manager.create(SessionAlgorithm::CryptoHash, None),
            Err(HashError::AllocationFailure { capacity: 2 })
        ));

        manager.free(a);
        assert!(manager.create(SessionAlgorithm::CryptoHash, None).is_ok());
    }

    #[test]
    fn test_invalid_key_consumes_no_slot() {
        let mut manager = SessionManager::with_capacity(1);
        assert!(manager.create_keyed(&[1u8; 31]).is_err());
        assert!(manager.is_empty());
        assert!(manager.create_keyed(&[1u8; 32]).is_ok());
    }

    #[test]
    fn test_typed_digest_mismatch() {
        let mut manager = SessionManager::new();
        let token = manager.create(SessionAlgorithm::CryptoHash, None).unwrap();

        assert!(matches!(
            manager.digest_fast64(token),
            Err(HashError::AlgorithmMismatch { expected: "XXH3-64", actual: "BLAKE3" })
        ));
        assert!(manager.digest_fast128(token).is_err());
        assert!(manager.digest_crypto(token).is_ok());
    }

    #[test]
    fn test_keyed_session_uses_crypto_digest() {
        let key = [0x11u8; 32];
        let mut manager = SessionManager::new();
        let token = manager.create_keyed(&key).unwrap();
        manager.update(token, b"payload");

        assert_eq!(
            manager.digest_crypto(token).unwrap(),
            *blake3::keyed_hash(&key, b"payload").as_bytes()
        );
    }

    #[test]
    fn test_checkout_and_restore() {
        let mut manager = SessionManager::new();
        let token = manager.create(SessionAlgorithm::FastHash128, None).unwrap();

        let mut session = manager.checkout(token).unwrap();
        assert!(matches!(manager.checkout(token), Err(HashError::SessionBusy(_))));
        assert!(manager.get(token).is_none());
        assert!(manager.contains(token));

        session.update(b"abc");
        assert!(manager.restore(token, session));
        assert_eq!(
            manager.digest(token).unwrap(),
            Digest::Fast128(xxhash_rust::xxh3::xxh3_128(b"abc"))
        );
    }

    #[test]
    fn test_free_while_checked_out_drops_session() {
        let mut manager = SessionManager::new();
        let token = manager.create(SessionAlgorithm::CryptoHash, None).unwrap();

        let session = manager.checkout(token).unwrap();
        assert!(manager.free(token));
        assert!(!manager.restore(token, session));
        assert!(manager.is_empty());
        assert!(matches!(manager.checkout(token), Err(HashError::InvalidHandle(_))));
    }
}
