//! Fixed-width decimal keys.
//!
//! Every key handled by the store has exactly `key_digits` decimal digits.
//! There is no implicit zero padding: with a width of 4, `42` is rejected.

use crate::error::{HashError, Result};

/// Keys are non-negative integers.
pub type Key = u64;

/// Widest key that fits in a `u64` for every value of that width.
pub const MAX_KEY_DIGITS: u32 = 19;

/// Number of decimal digits in `key`. Zero has one digit.
#[inline]
pub fn digit_count(key: Key) -> u32 {
    match key.checked_ilog10() {
        Some(log) => log + 1,
        None => 1,
    }
}

/// Check that `key` has exactly `key_digits` decimal digits.
pub fn validate(key: Key, key_digits: u32) -> Result<()> {
    let actual = digit_count(key);
    if actual != key_digits {
        return Err(HashError::WrongKeyLength {
            key,
            expected: key_digits,
            actual,
        });
    }
    Ok(())
}

/// Parse user-entered key text.
///
/// The text (after trimming) must be all ASCII digits, its length must equal
/// `key_digits`, and the parsed value must itself have `key_digits` digits, so
/// leading zeros are never accepted as padding.
pub fn parse_key(text: &str, key_digits: u32) -> Result<Key> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HashError::MalformedKey(text.to_string()));
    }
    let key: Key = text
        .parse()
        .map_err(|_| HashError::MalformedKey(text.to_string()))?;
    if text.len() as u32 != key_digits {
        return Err(HashError::WrongKeyLength {
            key,
            expected: key_digits,
            actual: text.len() as u32,
        });
    }
    validate(key, key_digits)?;
    Ok(key)
}

/// Zero-padded decimal form of `key`, `width` characters wide.
pub(crate) fn padded(key: Key, width: u32) -> String {
    format!("{:0width$}", key, width = width as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(1234), 4);
        assert_eq!(digit_count(u64::MAX), 20);
    }

    #[test]
    fn test_validate() {
        assert!(validate(1234, 4).is_ok());
        assert!(validate(0, 1).is_ok());
        assert_eq!(
            validate(42, 4),
            Err(HashError::WrongKeyLength {
                key: 42,
                expected: 4,
                actual: 2
            })
        );
        assert!(validate(12345, 4).is_err());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("1234", 4), Ok(1234));
        assert_eq!(parse_key("  5678\n", 4), Ok(5678));
        assert!(matches!(parse_key("12a4", 4), Err(HashError::MalformedKey(_))));
        assert!(matches!(parse_key("", 4), Err(HashError::MalformedKey(_))));
        assert!(matches!(parse_key("-123", 3), Err(HashError::MalformedKey(_))));
        assert!(matches!(
            parse_key("123", 4),
            Err(HashError::WrongKeyLength { actual: 3, .. })
        ));
        // Leading zeros are not padding.
        assert!(matches!(
            parse_key("0042", 4),
            Err(HashError::WrongKeyLength { key: 42, actual: 2, .. })
        ));
        assert_eq!(parse_key("0", 1), Ok(0));
    }

    #[test]
    fn test_padded() {
        assert_eq!(padded(7, 4), "0007");
        assert_eq!(padded(1234, 4), "1234");
    }
}
