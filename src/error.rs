//! Error types for FileHash
//!
//! Every failure of the session manager, the one-shot hashing layer and the
//! configuration loader is reported through [`HashError`]. Errors never
//! unwind across the C ABI; the `ffi` module maps them onto status codes.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FileHash operations
#[derive(Error, Debug)]
pub enum HashError {
    /// The session arena has no free slot left
    #[error("Cannot allocate hash session: arena is full ({capacity} sessions)")]
    AllocationFailure { capacity: usize },

    /// A digest output buffer could not be allocated
    #[error("Cannot allocate {len} bytes of digest output")]
    OutputAllocation { len: usize },

    /// Keyed hashing requires a key of a fixed length
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Token does not name a live session
    #[error("Invalid session handle: {0:#018x}")]
    InvalidHandle(u64),

    /// Session is currently being driven by another caller
    #[error("Session {0:#018x} is in use by another caller")]
    SessionBusy(u64),

    /// Typed digest requested from a session of another algorithm
    #[error("Algorithm mismatch: expected {expected}, session uses {actual}")]
    AlgorithmMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Hash algorithm not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Mode cannot be combined with the algorithm
    #[error("Mode '{mode}' is not supported for {algorithm}")]
    UnsupportedMode {
        mode: &'static str,
        algorithm: &'static str,
    },

    /// A key is required by the selected mode
    #[error("Key is required for {0} mode")]
    MissingKey(&'static str),

    /// Input or key could not be decoded
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error while loading configuration
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailure { .. } | Self::OutputAllocation { .. } => "E_ALLOCATION_FAILED",
            Self::InvalidKeyLength { .. } => "E_INVALID_KEY",
            Self::InvalidHandle(_) => "E_INVALID_HANDLE",
            Self::SessionBusy(_) => "E_SESSION_BUSY",
            Self::AlgorithmMismatch { .. } => "E_ALGORITHM_MISMATCH",
            Self::UnsupportedAlgorithm(_) => "E_UNSUPPORTED_ALGORITHM",
            Self::UnsupportedMode { .. } => "E_UNSUPPORTED_MODE",
            Self::MissingKey(_) | Self::InvalidInput(_) => "E_INVALID_INPUT",
            Self::ConfigError(_) => "E_CONFIG",
            Self::Io { .. } => "E_IO",
        }
    }

    /// Check if this error was caused by the caller's arguments
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyLength { .. }
                | Self::InvalidHandle(_)
                | Self::AlgorithmMismatch { .. }
                | Self::UnsupportedAlgorithm(_)
                | Self::UnsupportedMode { .. }
                | Self::MissingKey(_)
                | Self::InvalidInput(_)
        )
    }
}

/// Result type alias for FileHash operations
pub type Result<T> = std::result::Result<T, HashError>;

impl From<serde_json::Error> for HashError {
    fn from(err: serde_json::Error) -> Self {
        HashError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| HashError::io(path, e))
    }
}
