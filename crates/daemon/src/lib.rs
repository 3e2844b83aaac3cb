// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jg-daemon: process entry point for the job gate daemon. Config loading,
//! the single-instance lock, logging setup, and the tick-loop driver that
//! ties `jg-engine`'s `JobManager` to wall-clock time and OS signals.

pub mod config;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod run;

pub use config::DaemonConfig;
pub use error::{ConfigError, LifecycleError};
pub use lifecycle::LockGuard;
