//! Submitted index and the configured upper bound.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Default maximum index accepted for computation.
pub const DEFAULT_MAX_INDEX: u32 = 40;

/// Largest index whose Fibonacci number fits in a `u64`.
pub const MAX_COMPUTABLE_INDEX: u32 = 93;

/// Inclusive upper bound on accepted indices.
///
/// The naive computation is exponential in the index, so the bound is what
/// keeps a single submission from pinning the worker for hours.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexLimit(u32);

impl IndexLimit {
    pub const fn new(max: u32) -> Self {
        Self(max)
    }

    /// Like [`new`](Self::new), but rejects bounds past [`MAX_COMPUTABLE_INDEX`].
    pub fn try_new(max: u32) -> DomainResult<Self> {
        if max > MAX_COMPUTABLE_INDEX {
            return Err(DomainError::Validation(format!(
                "index limit {max} exceeds the largest computable index {MAX_COMPUTABLE_INDEX}"
            )));
        }
        Ok(Self(max))
    }

    pub const fn max(&self) -> u32 {
        self.0
    }

    pub const fn allows(&self, value: u32) -> bool {
        value <= self.0
    }
}

impl Default for IndexLimit {
    fn default() -> Self {
        Self(DEFAULT_MAX_INDEX)
    }
}

impl fmt::Display for IndexLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative index accepted for computation.
///
/// Construction through [`Index::parse`] or [`Index::new`] enforces the
/// configured [`IndexLimit`]. `FromStr` only checks the decimal format and is
/// used when reading indices back from the stores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(u32);

impl Index {
    /// Validate an already-numeric index against `limit`.
    pub fn new(value: u32, limit: IndexLimit) -> DomainResult<Self> {
        if !limit.allows(value) {
            return Err(DomainError::validation(format!(
                "index {value} is too high (max {limit})"
            )));
        }
        Ok(Self(value))
    }

    /// Parse raw client input and validate it against `limit`.
    ///
    /// Rejects empty, negative, non-numeric and out-of-range input.
    pub fn parse(raw: &str, limit: IndexLimit) -> DomainResult<Self> {
        let value = parse_decimal(raw)?;
        Self::new(value, limit)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Rebuild an index that was validated before it was stored.
    pub const fn from_stored(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Index {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self)
    }
}

fn parse_decimal(raw: &str) -> DomainResult<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("index is required"));
    }

    let digits = match trimmed.strip_prefix('-') {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
            // "-0" is still zero; anything else is a negative number.
            if rest.bytes().all(|b| b == b'0') {
                rest
            } else {
                return Err(DomainError::validation(format!(
                    "index must be non-negative, got {trimmed}"
                )));
            }
        }
        _ => trimmed,
    };

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::validation(format!(
            "index must be a whole number, got {trimmed:?}"
        )));
    }

    digits
        .parse::<u32>()
        .map_err(|_| DomainError::validation(format!("index {trimmed} is too high")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_trims() {
        let limit = IndexLimit::default();
        assert_eq!(Index::parse(" 7 ", limit).unwrap().value(), 7);
        assert_eq!(Index::parse("0", limit).unwrap().value(), 0);
        assert_eq!(Index::parse("40", limit).unwrap().value(), 40);
    }

    #[test]
    fn rejects_above_limit() {
        let err = Index::parse("41", IndexLimit::new(40)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(err.to_string().contains("too high"));
    }

    #[test]
    fn rejects_malformed_input() {
        let limit = IndexLimit::default();
        for raw in ["", "   ", "abc", "4.5", "1e3", "-3", "-", "0x10", "99999999999999"] {
            assert!(
                Index::parse(raw, limit).is_err(),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn limit_capped_at_largest_computable_index() {
        assert_eq!(IndexLimit::try_new(MAX_COMPUTABLE_INDEX).unwrap().max(), 93);
        assert!(matches!(
            IndexLimit::try_new(MAX_COMPUTABLE_INDEX + 1),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(Index::parse("-0", IndexLimit::default()).unwrap().value(), 0);
    }

    #[test]
    fn from_str_ignores_limit() {
        let idx: Index = "1000".parse().unwrap();
        assert_eq!(idx.value(), 1000);
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_range(value in 0u32..200, max in 0u32..100) {
            let limit = IndexLimit::new(max);
            let parsed = Index::parse(&value.to_string(), limit);
            prop_assert_eq!(parsed.is_ok(), value <= max);
        }
    }
}
