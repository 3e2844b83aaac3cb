// SPDX-License-Identifier: MIT

//! Job exit codes.
//!
//! Every exit message embeds the integer value
//! (`"<Titlecased>:<code> <message>"`), so `Display` here prints the bare
//! number rather than a symbolic name.

use std::fmt;

/// Closed set of exit codes a job can finish with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCode {
    Undefined,
    Success,
    Abort,
    UserKill,
    Delete,
    Shutdown,
}

impl ExitCode {
    /// The integer value embedded in exit messages.
    pub const fn value(self) -> i32 {
        match self {
            ExitCode::Undefined => -1,
            ExitCode::Success => 0,
            ExitCode::Abort => 1,
            ExitCode::UserKill => 2,
            ExitCode::Delete => 3,
            ExitCode::Shutdown => 4,
        }
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        ExitCode::Undefined
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
#[path = "exit_tests.rs"]
mod tests;
