//! Bucket-placement hash functions.
//!
//! Each [`HashKind`] is a pure function of `(key, bucket_count, key_digits)`,
//! so any key can be re-derived against a new bucket count during a resize.
//! Alongside the bucket index every function returns a short derivation
//! trace used to explain the placement.

use serde::{Deserialize, Serialize};

use crate::key::{padded, Key};

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 36;

/// Hash algorithm used to pick a key's target bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HashKind {
    /// `key mod n`.
    #[default]
    Modulo,
    /// Middle digit of `key²`, then `mod n`.
    MidSquare,
    /// Sum of the key's 2-digit groups, then `mod n`.
    Folding,
    /// Last two decimal digits, then `mod n`.
    Truncation,
    /// Least significant digits of the key written in `base`, then `mod n`.
    BaseChange { base: u32 },
}

/// Result of hashing one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashOutcome {
    pub bucket: usize,
    pub trace: String,
}

impl HashKind {
    /// Map `key` to a bucket index in `0..bucket_count`.
    ///
    /// `bucket_count` must be non-zero; the store guarantees at least two.
    pub fn hash(self, key: Key, bucket_count: usize, key_digits: u32) -> HashOutcome {
        debug_assert!(bucket_count > 0);
        let n = bucket_count as u64;
        match self {
            HashKind::Modulo => {
                let bucket = (key % n) as usize;
                HashOutcome {
                    bucket,
                    trace: format!("{key} mod {n} = {bucket}"),
                }
            }
            HashKind::MidSquare => {
                let squared = key as u128 * key as u128;
                let digit = middle_digit(squared);
                let bucket = (digit % n) as usize;
                HashOutcome {
                    bucket,
                    trace: format!(
                        "{key}² = {squared}, middle digit = {digit}, {digit} mod {n} = {bucket}"
                    ),
                }
            }
            HashKind::Folding => {
                let groups = fold_groups(key, key_digits);
                let sum: u64 = groups.iter().sum();
                let bucket = (sum % n) as usize;
                let terms: Vec<String> = groups.iter().map(u64::to_string).collect();
                HashOutcome {
                    bucket,
                    trace: format!(
                        "folding: {} = {sum}, {sum} mod {n} = {bucket}",
                        terms.join(" + ")
                    ),
                }
            }
            HashKind::Truncation => {
                let truncated = key % 100;
                let bucket = (truncated % n) as usize;
                HashOutcome {
                    bucket,
                    trace: format!(
                        "truncation: last 2 digits of {key} = {truncated}, {truncated} mod {n} = {bucket}"
                    ),
                }
            }
            HashKind::BaseChange { base } => {
                let base = base.clamp(MIN_BASE, MAX_BASE);
                let digits = digits_needed(bucket_count, base);
                let repr = to_radix(key, base);
                let tail = &repr[repr.len().saturating_sub(digits as usize)..];
                let reduced = tail_value(key, base, digits);
                let bucket = (reduced % n) as usize;
                HashOutcome {
                    bucket,
                    trace: format!(
                        "{key} in base {base} = {repr}, last {digits} digits = {tail}, \
                         as decimal = {reduced}, {reduced} mod {n} = {bucket}"
                    ),
                }
            }
        }
    }
}

/// Digit at position `floor((len - 1) / 2)` of `value`'s decimal form.
fn middle_digit(value: u128) -> u64 {
    let text = value.to_string();
    let pos = (text.len() - 1) / 2;
    (text.as_bytes()[pos] - b'0') as u64
}

/// Split the zero-padded key into 2-digit groups, left to right.
fn fold_groups(key: Key, key_digits: u32) -> Vec<u64> {
    let text = padded(key, key_digits);
    text.as_bytes()
        .chunks(2)
        .map(|chunk| chunk.iter().fold(0u64, |acc, b| acc * 10 + (b - b'0') as u64))
        .collect()
}

/// Smallest `d >= 1` with `base^d >= bucket_count`, i.e.
/// `ceil(log(bucket_count) / log(base))` computed without floating point.
fn digits_needed(bucket_count: usize, base: u32) -> u32 {
    let target = bucket_count as u128;
    let mut digits = 1;
    let mut span = base as u128;
    while span < target {
        span *= base as u128;
        digits += 1;
    }
    digits
}

/// Value of the last `digits` base-`base` digits of `key`.
fn tail_value(key: Key, base: u32, digits: u32) -> u64 {
    match (base as u128).checked_pow(digits) {
        Some(modulus) => (key as u128 % modulus) as u64,
        None => key,
    }
}

/// Lowercase representation of `value` in `base` (2..=36).
pub(crate) fn to_radix(mut value: u64, base: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let base = base as u64;
    let mut out = Vec::new();
    while value > 0 {
        let digit = (value % base) as u32;
        out.push(std::char::from_digit(digit, base as u32).unwrap_or('?'));
        value /= base;
    }
    out.iter().rev().collect()
}
