//! Configuration settings for FileHash
//!
//! Defines CLI arguments, the hashing configuration file format, and the
//! algorithm, mode and encoding enums shared by the library and the binary.

use crate::error::{HashError, IoResultExt, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// FileHash - incremental XXH3 and BLAKE3 hashing
#[derive(Parser, Debug, Clone)]
#[command(name = "filehash")]
#[command(author = "FileHash Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incremental XXH3 / BLAKE3 hashing with MD5, SHA-1 and SHA-2 helpers")]
#[command(long_about = r#"
FileHash exposes XXH3 (64/128-bit) and BLAKE3 (plain and keyed) through
handle-based incremental sessions, plus one-shot MD5, SHA-1 and SHA-2
hashing with HMAC support.

Examples:
  filehash hash "hello"                               # SHA-256 of a string
  filehash hash "hello" -a xxh3-128                   # XXH3 128-bit
  filehash hash "aGVsbG8=" --encoding base64 -a md5   # base64 input
  filehash hash "msg" -a sha256 --mode hmac --key secret
  filehash hash "msg" -a blake3 --mode keyed --key-encoding hex --key <64 hex>
  filehash algorithms                                 # List algorithms
  filehash bench --size 64M                           # Benchmark
"#)]
pub struct CliArgs {
    /// Path to a JSON configuration file
    #[arg(long, value_name = "PATH", env = "FILEHASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Hash a string
    #[command(name = "hash")]
    Hash {
        /// Input text (UTF-8, or base64 with --encoding base64)
        text: String,

        /// Hash algorithm (defaults to the configured algorithm)
        #[arg(short, long, value_enum)]
        algorithm: Option<HashAlgorithm>,

        /// Input encoding
        #[arg(long, value_enum, default_value = "utf8")]
        encoding: InputEncoding,

        /// Hashing mode
        #[arg(long, value_enum, default_value = "hash")]
        mode: HashMode,

        /// Key for hmac/keyed modes
        #[arg(long, value_name = "KEY", env = "FILEHASH_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Key encoding
        #[arg(long, value_enum, default_value = "utf8")]
        key_encoding: KeyEncoding,
    },

    /// List supported algorithms
    #[command(name = "algorithms")]
    Algorithms,

    /// Benchmark all algorithms
    #[command(name = "bench")]
    Bench {
        /// Size of the in-memory buffer to hash (e.g. 10M)
        #[arg(long, value_name = "SIZE")]
        size: Option<String>,

        /// Iterations per algorithm
        #[arg(long, value_name = "NUM")]
        iterations: Option<u32>,
    },
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Hash algorithm
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HashAlgorithm {
    /// MD5 - legacy, non-secure
    #[value(name = "md5")]
    #[serde(rename = "MD5")]
    Md5,
    /// SHA-1 - legacy, non-secure
    #[value(name = "sha1")]
    #[serde(rename = "SHA-1")]
    Sha1,
    /// SHA-224
    #[value(name = "sha224")]
    #[serde(rename = "SHA-224")]
    Sha224,
    /// SHA-256 - standard cryptographic hash
    #[default]
    #[value(name = "sha256")]
    #[serde(rename = "SHA-256")]
    Sha256,
    /// SHA-384
    #[value(name = "sha384")]
    #[serde(rename = "SHA-384")]
    Sha384,
    /// SHA-512
    #[value(name = "sha512")]
    #[serde(rename = "SHA-512")]
    Sha512,
    /// XXH3 64-bit - ultra fast, non-cryptographic
    #[value(name = "xxh3-64")]
    #[serde(rename = "XXH3-64")]
    Xxh3_64,
    /// XXH3 128-bit - ultra fast, non-cryptographic
    #[value(name = "xxh3-128")]
    #[serde(rename = "XXH3-128")]
    Xxh3_128,
    /// BLAKE3 - fast and cryptographically secure
    #[value(name = "blake3")]
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm
    pub const ALL: [HashAlgorithm; 9] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Xxh3_64,
        Self::Xxh3_128,
        Self::Blake3,
    ];

    /// Get the output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
            Self::Xxh3_64 => 8,
            Self::Xxh3_128 => 16,
            Self::Blake3 => 32,
        }
    }

    /// Get canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Xxh3_64 => "XXH3-64",
            Self::Xxh3_128 => "XXH3-128",
            Self::Blake3 => "BLAKE3",
        }
    }

    /// Whether HMAC mode is available
    pub fn is_hmac_capable(&self) -> bool {
        matches!(self, Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512)
    }

    /// Whether keyed mode is available
    pub fn is_keyed_capable(&self) -> bool {
        matches!(self, Self::Blake3)
    }

    /// Whether the algorithm is cryptographically secure
    pub fn is_cryptographic(&self) -> bool {
        !matches!(self, Self::Md5 | Self::Sha1 | Self::Xxh3_64 | Self::Xxh3_128)
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| {
                algo.name() == s
                    || algo
                        .to_possible_value()
                        .is_some_and(|value| value.matches(s, true))
            })
            .ok_or_else(|| HashError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Hashing mode
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// Plain digest
    #[default]
    Hash,
    /// HMAC over a SHA-2 digest
    Hmac,
    /// BLAKE3 keyed hash
    Keyed,
}

impl HashMode {
    /// Get mode name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Hmac => "hmac",
            Self::Keyed => "keyed",
        }
    }
}

impl FromStr for HashMode {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "hmac" => Ok(Self::Hmac),
            "keyed" => Ok(Self::Keyed),
            other => Err(HashError::invalid_input(format!("Unsupported mode: {}", other))),
        }
    }
}

/// Encoding of a key string
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// UTF-8 bytes of the string
    #[default]
    Utf8,
    /// Hexadecimal, whitespace ignored
    Hex,
    /// Standard base64
    Base64,
}

/// Encoding of input text
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputEncoding {
    /// UTF-8 bytes of the string
    #[default]
    Utf8,
    /// Standard base64
    Base64,
}

/// Hashing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Algorithm used when none is given
    pub default_algorithm: HashAlgorithm,
    /// Maximum number of live sessions in one arena
    pub max_sessions: usize,
    /// Buffer size for benchmarks in bytes
    pub bench_size: usize,
    /// Iterations per algorithm in benchmarks
    pub bench_iterations: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            default_algorithm: HashAlgorithm::Sha256,
            max_sessions: 4096,
            bench_size: 10 * 1024 * 1024,
            bench_iterations: 10,
        }
    }
}

impl HasherConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_path(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }

    /// Reject values the session manager cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(HashError::config("max_sessions must be at least 1"));
        }
        if self.max_sessions > u32::MAX as usize {
            return Err(HashError::config(format!(
                "max_sessions must not exceed {}",
                u32::MAX
            )));
        }
        if self.bench_iterations == 0 {
            return Err(HashError::config("bench_iterations must be at least 1"));
        }
        Ok(())
    }

    /// Create config from CLI arguments, layered over an optional config file
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Commands::Bench { size, iterations } = &args.command {
            if let Some(size) = size {
                config.bench_size = parse_size(size)
                    .map_err(|e| HashError::config(format!("Invalid bench size: {}", e)))?
                    as usize;
            }
            if let Some(iterations) = iterations {
                config.bench_iterations = *iterations;
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(['G', 'B']), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}
