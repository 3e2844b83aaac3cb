// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jg-adapters: the `SchedulerAdapter` contract and a fake implementation
//! for engine-crate tests.

mod error;
mod scheduler;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::SchedulerError;
pub use scheduler::{JobOutcome, JobView, SchedulerAdapter, SchedulerName};
