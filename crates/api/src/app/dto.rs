use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use fibcalc_core::{CacheValue, Index};

// -------------------------
// Request DTOs
// -------------------------

/// `POST /values` body. The index arrives as a string from form inputs and
/// as a number from scripted clients; both are accepted and validated the
/// same way.
#[derive(Debug, Deserialize)]
pub struct SubmitIndexRequest {
    #[serde(default)]
    pub index: Option<JsonValue>,
}

impl SubmitIndexRequest {
    /// Raw text handed to validation. Missing or non-scalar values become
    /// text that validation rejects.
    pub fn raw_index(&self) -> String {
        match &self.index {
            None | Some(JsonValue::Null) => String::new(),
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SubmitIndexResponse {
    pub working: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmittedRowResponse {
    pub number: u32,
}

pub fn submitted_rows(indices: &[Index]) -> Vec<SubmittedRowResponse> {
    indices
        .iter()
        .map(|i| SubmittedRowResponse { number: i.value() })
        .collect()
}

/// `{ "<index>": "<value>" }`, with the pending sentinel for unfinished entries.
pub fn current_values(current: &BTreeMap<Index, CacheValue>) -> BTreeMap<String, String> {
    current
        .iter()
        .map(|(index, value)| (index.to_string(), value.to_text()))
        .collect()
}
