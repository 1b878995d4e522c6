//! # FileHash - Incremental Hashing Sessions for Native Callers
//!
//! FileHash exposes streaming XXH3 (64 and 128 bit) and BLAKE3 (plain and
//! keyed) hashing through opaque session tokens, both as a Rust API and as
//! a C ABI for foreign runtimes. A one-shot layer adds MD5, SHA-1 and SHA-2
//! with HMAC support on top.
//!
//! ## Features
//!
//! - **Incremental sessions**: create, update any number of times, digest, free
//! - **Generation-checked tokens**: stale and double-freed handles are rejected
//! - **Non-destructive digests**: a digest can be taken mid-stream
//! - **BLAKE3 XOF**: extendable output of any length
//! - **C ABI**: panic-safe `fh_*` entry points with status codes
//! - **One-shot hashing**: MD5, SHA-1, SHA-2, HMAC-SHA-2, keyed BLAKE3
//!
//! ## Quick Start
//!
//! ```no_run
//! use filehash::session::SessionManager;
//! use filehash::hash::SessionAlgorithm;
//!
//! let mut manager = SessionManager::new();
//! let token = manager.create(SessionAlgorithm::FastHash64, None).unwrap();
//!
//! manager.update(token, b"hello ");
//! manager.update(token, b"world");
//! println!("{:016x}", manager.digest_fast64(token).unwrap());
//!
//! manager.free(token);
//! ```
//!
//! ## One-shot Hashing
//!
//! ```no_run
//! use filehash::config::{HashAlgorithm, KeyEncoding};
//! use filehash::hash::{hash_bytes, HashOptions};
//!
//! let options = HashOptions::hmac("secret", KeyEncoding::Utf8);
//! let result = hash_bytes(b"message", HashAlgorithm::Sha256, &options).unwrap();
//! println!("{}", result.hash);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod ffi;
pub mod hash;
pub mod session;

// Re-export commonly used types
pub use config::{HashAlgorithm, HasherConfig};
pub use error::{HashError, Result};
pub use hash::{Digest, SessionAlgorithm};
pub use session::{Session, SessionManager, SessionToken};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use filehash::prelude::*;
    //! ```

    pub use crate::config::{HashAlgorithm, HashMode, HasherConfig, InputEncoding, KeyEncoding};
    pub use crate::error::{HashError, Result};
    pub use crate::hash::{hash_bytes, hash_string, Digest, HashOptions, HashResult, SessionAlgorithm};
    pub use crate::session::{Session, SessionManager, SessionToken};
}
