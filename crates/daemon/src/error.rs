// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

/// Failures loading and interpreting the daemon's TOML config file. These
/// are all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a default state directory (no $HOME)")]
    NoStateDir,

    #[error("cannot read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("service {service}: variable {variable}: {reason}")]
    InvalidVariable {
        service: String,
        variable: String,
        reason: String,
    },

    #[error("service {service}: variable {variable}: unknown type {ty:?}")]
    UnknownVariableType {
        service: String,
        variable: String,
        ty: String,
    },

    #[error("service {0}: default for CIS_SCHEDULER, if set, must be a string")]
    BadScheduler(String),
}

/// Lifecycle failures around acquiring the single-instance lock and standing
/// up the daemon's directories at startup.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("another jobgate daemon instance is already running (lock at {0})")]
    AlreadyRunning(PathBuf),

    #[error("cannot create gate directories under {0}: {1}")]
    CreateDirs(PathBuf, #[source] std::io::Error),

    #[error("cannot acquire lock file {0}: {1}")]
    Lock(PathBuf, #[source] std::io::Error),

    #[error("cannot write PID to lock file {0}: {1}")]
    WritePid(PathBuf, #[source] std::io::Error),

    #[error("cannot set up logging at {0}: {1}")]
    Logging(PathBuf, #[source] std::io::Error),
}
