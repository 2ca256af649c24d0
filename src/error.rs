//! Error types.

use crate::key::Key;

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// The key does not have the configured number of decimal digits.
    #[error("key {key} has {actual} digits, expected exactly {expected}")]
    WrongKeyLength {
        /// Offending key.
        key: Key,
        /// Configured digit width.
        expected: u32,
        /// Digit count of the key.
        actual: u32,
    },
    /// Key text is not a non-negative decimal integer.
    #[error("malformed key: {0:?}")]
    MalformedKey(String),
    /// The key is already stored (in a bucket or in overflow).
    #[error("key {0} already exists in the structure")]
    DuplicateKey(Key),
    /// The key is not stored anywhere.
    #[error("key {0} not found")]
    KeyNotFound(Key),
    /// The structure configuration violates a rule.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigViolation),
    /// An operation was attempted before the structure was created.
    #[error("structure has not been created")]
    StructureNotInitialized,
}

/// A single violated configuration rule.
///
/// Validation reports the first rule that fails, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigViolation {
    #[error("bucket count must be at least 2 (got {0})")]
    TooFewBuckets(usize),
    #[error("bucket count must be even (got {0})")]
    OddBucketCount(usize),
    #[error("bucket capacity must be at least 1")]
    ZeroCapacity,
    #[error("key digits must be between 1 and {max} (got {got})")]
    KeyDigitsOutOfRange { got: u32, max: u32 },
    #[error("maximum density must be between 1% and 99% (got {0})")]
    MaxDensityOutOfRange(u8),
    #[error("minimum density must be between 1% and 99% (got {0})")]
    MinDensityOutOfRange(u8),
    #[error("minimum density {min}% must be below maximum density {max}%")]
    MinNotBelowMax { min: u8, max: u8 },
    #[error("base must be between 2 and 36 (got {0})")]
    BaseOutOfRange(u32),
}

/// Errors returned while loading a configuration file or environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading config files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Invalid value for a key.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value string.
        value: String,
    },
    /// Unknown configuration key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    /// Parsed configuration breaks a structural rule.
    #[error(transparent)]
    Invalid(#[from] ConfigViolation),
}

pub type Result<T> = std::result::Result<T, HashError>;
