//! Structure configuration and loading helpers.
//!
//! A [`StoreConfig`] can be built in code, parsed from TOML, or loaded from
//! the file named by `EXTHASH_CONFIG` with `EXTHASH__section__field`
//! environment overrides applied on top:
//!
//! ```toml
//! bucket_count = 4
//! bucket_capacity = 5
//! key_digits = 4
//! probe = "binary"
//!
//! [density]
//! max_density = 70
//! min_density = 30
//! strategy = "partial"
//!
//! [hash]
//! kind = "base-change"
//! base = 8
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::density::{DensityConfig, MIN_BUCKETS};
use crate::error::{ConfigError, ConfigViolation};
use crate::hash::{HashKind, MAX_BASE, MIN_BASE};
use crate::key::MAX_KEY_DIGITS;
use crate::playback::SearchProbe;

/// Env var naming a TOML config file.
pub const CONFIG_PATH_VAR: &str = "EXTHASH_CONFIG";
/// Prefix of per-field env overrides.
pub const ENV_PREFIX: &str = "EXTHASH__";
/// Base used when an override switches to base-change hashing without one.
pub const DEFAULT_BASE: u32 = 8;

/// How `modify(old, new)` is carried out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifyMode {
    /// A full `delete(old)` followed by a full `insert(new)`, each with its
    /// own density check. Not transactional: a failing insert leaves `old`
    /// removed.
    #[default]
    TwoPhase,
    /// Swap `old` for `new` and check density once at the end.
    Atomic,
}

/// Everything needed to create a bucket store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Initial number of buckets. Must be even and at least 2.
    pub bucket_count: usize,
    /// Slots per bucket.
    pub bucket_capacity: usize,
    /// Exact decimal width of every key.
    pub key_digits: u32,
    pub density: DensityConfig,
    pub hash: HashKind,
    pub probe: SearchProbe,
    pub modify_mode: ModifyMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket_count: 4,
            bucket_capacity: 5,
            key_digits: 4,
            density: DensityConfig::default(),
            hash: HashKind::Modulo,
            probe: SearchProbe::Direct,
            modify_mode: ModifyMode::TwoPhase,
        }
    }
}

impl StoreConfig {
    /// Report the first violated rule, if any.
    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if self.bucket_count < MIN_BUCKETS {
            return Err(ConfigViolation::TooFewBuckets(self.bucket_count));
        }
        if self.bucket_count % 2 != 0 {
            return Err(ConfigViolation::OddBucketCount(self.bucket_count));
        }
        if self.bucket_capacity == 0 {
            return Err(ConfigViolation::ZeroCapacity);
        }
        if !(1..=MAX_KEY_DIGITS).contains(&self.key_digits) {
            return Err(ConfigViolation::KeyDigitsOutOfRange {
                got: self.key_digits,
                max: MAX_KEY_DIGITS,
            });
        }
        let DensityConfig {
            max_density: max,
            min_density: min,
            ..
        } = self.density;
        if !(1..=99).contains(&max) {
            return Err(ConfigViolation::MaxDensityOutOfRange(max));
        }
        if !(1..=99).contains(&min) {
            return Err(ConfigViolation::MinDensityOutOfRange(min));
        }
        if min >= max {
            return Err(ConfigViolation::MinNotBelowMax { min, max });
        }
        if let HashKind::BaseChange { base } = self.hash {
            if !(MIN_BASE..=MAX_BASE).contains(&base) {
                return Err(ConfigViolation::BaseOutOfRange(base));
            }
        }
        Ok(())
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load from the `EXTHASH_CONFIG` file (if set, defaults otherwise), then
    /// apply `EXTHASH__section__field` overrides.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_VAR).ok() {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_overrides(env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `EXTHASH__section__field=value` pairs in-place. Pairs without
    /// the prefix are ignored.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut hash_kind: Option<(String, String)> = None;
        let mut hash_base: Option<(String, u32)> = None;

        for (key, value) in vars {
            let Some(path) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path = path.to_ascii_lowercase();
            let parts: Vec<&str> = path.split("__").collect();
            let value = value.trim().to_string();

            match parts.as_slice() {
                ["bucket_count"] => self.bucket_count = parse_value(&key, &value)?,
                ["bucket_capacity"] => self.bucket_capacity = parse_value(&key, &value)?,
                ["key_digits"] => self.key_digits = parse_value(&key, &value)?,
                ["probe"] => self.probe = parse_enum(&key, &value)?,
                ["modify_mode"] => self.modify_mode = parse_enum(&key, &value)?,
                ["density", "max"] | ["density", "max_density"] => {
                    self.density.max_density = parse_value(&key, &value)?;
                }
                ["density", "min"] | ["density", "min_density"] => {
                    self.density.min_density = parse_value(&key, &value)?;
                }
                ["density", "strategy"] => self.density.strategy = parse_enum(&key, &value)?,
                ["hash", "kind"] => hash_kind = Some((key, value)),
                ["hash", "base"] => {
                    let base = parse_value(&key, &value)?;
                    hash_base = Some((key, base));
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        // Kind and base arrive in arbitrary order; resolve them together.
        let current_base = match self.hash {
            HashKind::BaseChange { base } => Some(base),
            _ => None,
        };
        match (hash_kind, hash_base) {
            (Some((key, kind)), base) => {
                let plain = match kind.to_ascii_lowercase().as_str() {
                    "modulo" => Some(HashKind::Modulo),
                    "mid-square" => Some(HashKind::MidSquare),
                    "folding" => Some(HashKind::Folding),
                    "truncation" => Some(HashKind::Truncation),
                    "base-change" => None,
                    _ => return Err(ConfigError::InvalidValue { key, value: kind }),
                };
                self.hash = match (plain, base) {
                    (None, base) => HashKind::BaseChange {
                        base: base.map(|(_, b)| b).or(current_base).unwrap_or(DEFAULT_BASE),
                    },
                    (Some(kind), None) => kind,
                    (Some(_), Some((key, base))) => {
                        return Err(ConfigError::InvalidValue {
                            key,
                            value: base.to_string(),
                        })
                    }
                };
            }
            (None, Some((key, base))) => match self.hash {
                HashKind::BaseChange { .. } => self.hash = HashKind::BaseChange { base },
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        value: base.to_string(),
                    })
                }
            },
            (None, None) => {}
        }

        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(env::vars())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_enum<T: for<'de> Deserialize<'de>>(key: &str, value: &str) -> Result<T, ConfigError> {
    toml::Value::String(value.to_ascii_lowercase())
        .try_into()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
