// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon binary.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Resolve the config file path: `JOBGATE_CONFIG` env var, or
/// `/etc/jobgate/jobgate.toml` by default.
pub fn config_path() -> PathBuf {
    std::env::var("JOBGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/jobgate/jobgate.toml"))
}

/// Resolve the gate root directory override chain: `JOBGATE_STATE_DIR` >
/// `XDG_STATE_HOME/jobgate` > `~/.local/state/jobgate`. The config file's
/// `[gate] root` key, if present, takes priority over all of these; this
/// chain is only consulted when the config omits it.
pub fn default_gate_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("JOBGATE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jobgate"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jobgate"))
}

/// Path to the daemon's single-instance lock file, a sibling of the gate
/// root rather than inside it (so it survives `dump/`-style cleanup passes).
pub fn lock_path(gate_root: &std::path::Path) -> PathBuf {
    gate_root.join(".jobgate.lock")
}

/// Path to the daemon's log file.
pub fn log_path(gate_root: &std::path::Path) -> PathBuf {
    gate_root.join("jobgate.log")
}
