// SPDX-License-Identifier: MIT

//! Tagged union of validated variable values.
//!
//! The validator (crate `jg-validator`) consumes a per-service schema and
//! produces `valid_data: BTreeMap<String, VarValue>` from a raw JSON request.
//! All type coercion — string-to-float, datetime-string-to-timestamp — is
//! done once during validation; the rest of the system only ever sees these
//! concrete, already-bounded values.

use std::collections::BTreeMap;

/// A single validated variable value, one per declared schema type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VarValue {
    Int(i64),
    Float(f64),
    Str(String),
    /// Parsed datetime, stored as epoch milliseconds (UTC) plus the format
    /// string it was validated against, so it can be re-rendered for a
    /// scheduler adapter without losing the original precision.
    DateTime { epoch_ms: i64 },
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    Object(BTreeMap<String, VarValue>),
    ObjectArray(Vec<BTreeMap<String, VarValue>>),
}

impl VarValue {
    /// Convenience accessor used by the engine to read `CIS_SCHEDULER`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "var_tests.rs"]
mod tests;
