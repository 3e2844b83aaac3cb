// SPDX-License-Identifier: MIT

//! Request validation: schema-directed coercion of a raw JSON object into a
//! `ValidData` record.

use std::collections::BTreeMap;

use jg_core::VarValue;
use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::{parse_datetime, ArraySchema, ObjectSchema, Schema, ServiceSchema, ValuesBound};

pub type ValidData = BTreeMap<String, VarValue>;

const MAX_OBJECT_DEPTH: usize = 2;

/// Validate a raw request body against a service schema, then confirm
/// `CIS_SCHEDULER` names one of `registered_schedulers`.
pub fn validate_request(
    schema: &ServiceSchema,
    request: &serde_json::Map<String, Value>,
    registered_schedulers: &[&str],
) -> Result<ValidData, ValidationError> {
    let fields = ObjectSchema {
        fields: schema.clone(),
    };
    let valid_data = validate_fields(&fields, request, 1)?;

    match valid_data.get("CIS_SCHEDULER") {
        Some(VarValue::Str(name)) if registered_schedulers.contains(&name.as_str()) => {
            Ok(valid_data)
        }
        Some(VarValue::Str(name)) => Err(ValidationError::UnknownScheduler(name.clone())),
        _ => Err(ValidationError::MissingScheduler),
    }
}

fn validate_fields(
    object: &ObjectSchema,
    input: &serde_json::Map<String, Value>,
    depth: usize,
) -> Result<BTreeMap<String, VarValue>, ValidationError> {
    for key in input.keys() {
        if !object.fields.contains_key(key) {
            return Err(ValidationError::UnknownKey(key.clone()));
        }
    }

    let mut out = BTreeMap::new();
    for (name, schema) in &object.fields {
        let value = match input.get(name) {
            Some(v) => validate_value(name, schema, v, depth)?,
            None => schema.default_value(),
        };
        out.insert(name.clone(), value);
    }
    Ok(out)
}

fn validate_value(
    name: &str,
    schema: &Schema,
    value: &Value,
    depth: usize,
) -> Result<VarValue, ValidationError> {
    match schema {
        Schema::Int { bound, .. } => {
            let n = coerce_i64(value).ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "int",
            })?;
            check_range(name, n, bound)?;
            Ok(VarValue::Int(n))
        }
        Schema::Float { bound, .. } => {
            let n = coerce_f64(value).ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "float",
            })?;
            check_range(name, n, bound)?;
            Ok(VarValue::Float(n))
        }
        Schema::String { values, .. } => {
            let s = value.as_str().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            })?;
            if !values.iter().any(|v| v == s) {
                return Err(ValidationError::NotInEnum {
                    name: name.to_string(),
                });
            }
            Ok(VarValue::Str(s.to_string()))
        }
        Schema::DateTime { format, .. } => {
            let s = value.as_str().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "datetime",
            })?;
            let epoch_ms = parse_datetime(format, s).ok_or_else(|| ValidationError::DateTimeParse {
                name: name.to_string(),
                format: format.clone(),
            })?;
            Ok(VarValue::DateTime { epoch_ms })
        }
        Schema::IntArray(array) => {
            let items = value.as_array().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "int_array",
            })?;
            if items.len() > array.max_len {
                return Err(ValidationError::TooLong {
                    name: name.to_string(),
                });
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let n = coerce_i64(item).ok_or_else(|| ValidationError::TypeMismatch {
                    name: name.to_string(),
                    expected: "int",
                })?;
                check_range(name, n, &array.bound)?;
                out.push(n);
            }
            Ok(VarValue::IntArray(out))
        }
        Schema::FloatArray(array) => {
            let items = value.as_array().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "float_array",
            })?;
            if items.len() > array.max_len {
                return Err(ValidationError::TooLong {
                    name: name.to_string(),
                });
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let n = coerce_f64(item).ok_or_else(|| ValidationError::TypeMismatch {
                    name: name.to_string(),
                    expected: "float",
                })?;
                check_range(name, n, &array.bound)?;
                out.push(n);
            }
            Ok(VarValue::FloatArray(out))
        }
        Schema::Object(object) => {
            if depth + 1 > MAX_OBJECT_DEPTH {
                return Err(ValidationError::TooDeep {
                    name: name.to_string(),
                });
            }
            let map = value.as_object().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "object",
            })?;
            let fields = validate_fields(object, map, depth + 1)?;
            Ok(VarValue::Object(fields))
        }
        Schema::ObjectArray { max_len, fields } => {
            if depth + 1 > MAX_OBJECT_DEPTH {
                return Err(ValidationError::TooDeep {
                    name: name.to_string(),
                });
            }
            let items = value.as_array().ok_or_else(|| ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: "object_array",
            })?;
            if items.len() > *max_len {
                return Err(ValidationError::TooLong {
                    name: name.to_string(),
                });
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let map = item.as_object().ok_or_else(|| ValidationError::TypeMismatch {
                    name: name.to_string(),
                    expected: "object",
                })?;
                out.push(validate_fields(fields, map, depth + 1)?);
            }
            Ok(VarValue::ObjectArray(out))
        }
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn check_range<T: PartialOrd>(
    name: &str,
    value: T,
    bound: &ValuesBound<T>,
) -> Result<(), ValidationError> {
    if value < bound.min || value > bound.max {
        Err(ValidationError::OutOfRange {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
