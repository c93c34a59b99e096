//! Job message wire format.

use fibcalc_core::Index;

use crate::bus::BusError;

/// Channel the dispatcher announces new indices on.
pub const DEFAULT_JOB_CHANNEL: &str = "insert";

/// Transient instruction to compute the result for one index.
///
/// On the wire this is just the decimal index, so any client that can
/// `PUBLISH insert 12` can enqueue work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JobMessage {
    index: Index,
}

impl JobMessage {
    pub fn new(index: Index) -> Self {
        Self { index }
    }

    pub fn index(&self) -> Index {
        self.index
    }

    pub fn encode(&self) -> String {
        self.index.to_string()
    }

    /// Decode a payload. The limit is not re-checked here: the dispatcher
    /// validated it before publishing.
    pub fn decode(payload: &str) -> Result<Self, BusError> {
        payload
            .parse::<Index>()
            .map(Self::new)
            .map_err(|e| BusError::Decode {
                payload: payload.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_decimal_text() {
        let msg = JobMessage::new(Index::from_stored(12));
        assert_eq!(msg.encode(), "12");
        assert_eq!(JobMessage::decode("12").unwrap(), msg);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            JobMessage::decode("twelve"),
            Err(BusError::Decode { .. })
        ));
    }
}
