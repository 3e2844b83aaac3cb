// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jg-validator: turns an untyped request body into a bounded, typed
//! `valid_data` record.

mod error;
mod schema;
mod validate;

pub use error::ValidationError;
pub use schema::{parse_datetime, ArraySchema, ObjectSchema, Schema, ServiceSchema, ValuesBound};
pub use validate::{validate_request, ValidData};
