//! Serializable views handed back to JavaScript.

use meow_core::difficulty::format_difficulty;
use meow_core::BlockHeader;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Validation summary for a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Header identifier, if the required back end was available.
    pub id: Option<String>,
    /// Proof-of-work epoch name.
    pub algorithm: String,
    /// Serialized size in bytes.
    pub size: usize,
    /// Difficulty as a number.
    pub difficulty: Option<f64>,
    /// Formatted difficulty string.
    pub difficulty_display: Option<String>,
    /// Whether the timestamp is within two hours of `now`.
    pub valid_timestamp: bool,
    /// Proof-of-work verdict, if one could be reached.
    pub valid_proof_of_work: Option<bool>,
    /// Messages for every check that could not be completed.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Run every check, collecting failures instead of stopping at the first.
    pub fn build(header: &BlockHeader, now: u32) -> Self {
        let mut errors = Vec::new();

        let id = header
            .id()
            .map(str::to_string)
            .map_err(|e| note(&mut errors, e.to_string()))
            .ok();
        let difficulty = header
            .difficulty()
            .map_err(|e| note(&mut errors, e.to_string()))
            .ok();
        let valid_proof_of_work = header
            .valid_proof_of_work()
            .map_err(|e| note(&mut errors, e.to_string()))
            .ok();

        ValidationReport {
            id,
            algorithm: header.epoch().name().to_string(),
            size: header.size(),
            difficulty,
            difficulty_display: difficulty.map(format_difficulty),
            valid_timestamp: header.valid_timestamp(now),
            valid_proof_of_work,
            errors,
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
    }
}

fn note(errors: &mut Vec<String>, message: String) {
    if !errors.contains(&message) {
        errors.push(message);
    }
}
