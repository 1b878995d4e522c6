//! Opaque session tokens

/// Caller-held handle naming one session in a [`SessionManager`](super::SessionManager)
///
/// The low 32 bits hold the slot index, the high 32 bits the slot
/// generation. Generations start at 1, so a live token is never zero and
/// [`SessionToken::NULL`] can serve as the invalid handle at the C ABI.
/// A slot is retired after its last generation, so a stale token never
/// becomes valid again.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    /// The null handle
    pub const NULL: SessionToken = SessionToken(0);

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        debug_assert!(generation != 0);
        Self((generation as u64) << 32 | index as u64)
    }

    /// Rebuild a token from its raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value handed across the C ABI
    pub fn into_raw(self) -> u64 {
        self.0
    }

    /// Whether this is the null handle
    pub fn is_null(&self) -> bool {
        self.generation() == 0
    }

    pub(crate) fn index(&self) -> usize {
        (self.0 & u32::MAX as u64) as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
