//! Cache value: the pending placeholder or a computed result.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Text stored in the cache while a computation has been requested but has
/// not (yet) produced a value.
pub const PENDING_SENTINEL: &str = "Nothing yet!";

/// Current state of one cache entry.
///
/// Stored as text so both states share one representation: the pending
/// sentinel, or the decimal result.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CacheValue {
    Pending,
    Computed(u64),
}

impl CacheValue {
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheValue::Pending)
    }

    pub fn computed(&self) -> Option<u64> {
        match self {
            CacheValue::Pending => None,
            CacheValue::Computed(v) => Some(*v),
        }
    }

    /// Text form written to the cache.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Pending => f.write_str(PENDING_SENTINEL),
            CacheValue::Computed(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for CacheValue {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PENDING_SENTINEL {
            return Ok(CacheValue::Pending);
        }
        s.parse::<u64>()
            .map(CacheValue::Computed)
            .map_err(|_| DomainError::validation(format!("unrecognised cache value {s:?}")))
    }
}

impl Serialize for CacheValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CacheValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form() {
        assert_eq!(CacheValue::Pending.to_text(), "Nothing yet!");
        assert_eq!(CacheValue::Computed(13).to_text(), "13");
        assert_eq!("Nothing yet!".parse::<CacheValue>().unwrap(), CacheValue::Pending);
        assert_eq!("5".parse::<CacheValue>().unwrap(), CacheValue::Computed(5));
        assert!("working".parse::<CacheValue>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&CacheValue::Computed(55)).unwrap();
        assert_eq!(json, "\"55\"");
        let back: CacheValue = serde_json::from_str("\"Nothing yet!\"").unwrap();
        assert!(back.is_pending());
    }
}
