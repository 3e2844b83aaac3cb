// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Validation failures, always naming the variable at fault. A request that
/// fails validation is aborted with the failure's message, not retried.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("{name}: value out of range")]
    OutOfRange { name: String },

    #[error("{name}: value not in enumeration")]
    NotInEnum { name: String },

    #[error("{name}: does not match datetime format {format}")]
    DateTimeParse { name: String, format: String },

    #[error("{name}: exceeds max length")]
    TooLong { name: String },

    #[error("{name}: object nesting exceeds depth 2")]
    TooDeep { name: String },

    #[error("{name}: expected a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("CIS_SCHEDULER is required")]
    MissingScheduler,

    #[error("CIS_SCHEDULER names an unregistered scheduler: {0}")]
    UnknownScheduler(String),
}
