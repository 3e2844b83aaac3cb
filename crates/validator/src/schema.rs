// SPDX-License-Identifier: MIT

//! The per-service schema model: one [`Schema`] per declared variable,
//! recursively bounded for `object`/`object_array`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use jg_core::VarValue;

/// Parse a strftime-style datetime string, returning epoch milliseconds
/// (UTC). Shared by request validation (`validate_value`) and schema loading
/// (a `datetime` variable's `default` is pre-parsed once at load time).
pub fn parse_datetime(format: &str, value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// A scalar bound: `[min, max]` inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesBound<T> {
    pub min: T,
    pub max: T,
}

/// `[max_len, inner_min, inner_max]` for `int_array`/`float_array`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema<T> {
    pub default: Vec<T>,
    pub max_len: usize,
    pub bound: ValuesBound<T>,
}

/// Field declarations for `object` and `object_array`, at most one nesting
/// level below whatever called into it (depth enforced by the caller).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub fields: BTreeMap<String, Schema>,
}

impl ObjectSchema {
    pub fn default_value(&self) -> BTreeMap<String, VarValue> {
        self.fields
            .iter()
            .map(|(name, schema)| (name.clone(), schema.default_value()))
            .collect()
    }
}

/// One declared variable's type, default, and bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Int {
        default: i64,
        bound: ValuesBound<i64>,
    },
    Float {
        default: f64,
        bound: ValuesBound<f64>,
    },
    String {
        default: String,
        values: Vec<String>,
    },
    /// `format` is a strftime-style pattern; `default` is pre-parsed to
    /// epoch milliseconds at schema-construction time.
    DateTime {
        default: i64,
        format: String,
    },
    IntArray(ArraySchema<i64>),
    FloatArray(ArraySchema<f64>),
    Object(ObjectSchema),
    /// `max_len` bounds the array; `fields` describes each element.
    ObjectArray {
        max_len: usize,
        fields: ObjectSchema,
    },
}

impl Schema {
    pub fn default_value(&self) -> VarValue {
        match self {
            Schema::Int { default, .. } => VarValue::Int(*default),
            Schema::Float { default, .. } => VarValue::Float(*default),
            Schema::String { default, .. } => VarValue::Str(default.clone()),
            Schema::DateTime { default, .. } => VarValue::DateTime { epoch_ms: *default },
            Schema::IntArray(a) => VarValue::IntArray(a.default.clone()),
            Schema::FloatArray(a) => VarValue::FloatArray(a.default.clone()),
            Schema::Object(o) => VarValue::Object(o.default_value()),
            Schema::ObjectArray { .. } => VarValue::ObjectArray(Vec::new()),
        }
    }

    /// A human-readable tag matching the config file's `type` string, used
    /// in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Int { .. } => "int",
            Schema::Float { .. } => "float",
            Schema::String { .. } => "string",
            Schema::DateTime { .. } => "datetime",
            Schema::IntArray(_) => "int_array",
            Schema::FloatArray(_) => "float_array",
            Schema::Object(_) => "object",
            Schema::ObjectArray { .. } => "object_array",
        }
    }
}

/// The full schema for one service: variable name -> declaration.
pub type ServiceSchema = BTreeMap<String, Schema>;
