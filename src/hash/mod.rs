//! Hash engines and one-shot hashing
//!
//! [`Engine`] wraps the XXH3 and BLAKE3 streaming states behind one enum so
//! every session variant shares the same init/update/digest lifecycle. The
//! `oneshot` module layers MD5, SHA-1, SHA-2 and HMAC on top for in-memory
//! inputs.

mod digest;
mod engine;
mod oneshot;

pub use digest::Digest;
pub use engine::{Engine, SessionAlgorithm, CRYPTO_OUT_LEN, KEY_LEN};
pub use oneshot::*;
