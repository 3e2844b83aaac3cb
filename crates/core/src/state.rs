// SPDX-License-Identifier: MIT

//! Job lifecycle states and the terminal "exit state" that precedes them.

use std::fmt;

/// A job's current position in the lifecycle state machine:
///
/// ```text
/// waiting -> queued -> running -+
///    |          |         |     |
///    +----------+---------+--> closing -> cleanup -> {done|failed|aborted|killed}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Queued,
    Running,
    Closing,
    Cleanup,
    Done,
    Failed,
    Aborted,
    Killed,
}

impl JobState {
    /// All states, in the `GateFs::check_state` probe precedence: the state
    /// most likely to indicate a finished, unambiguous outcome is checked
    /// first so a job mid-transition (briefly holding two symlinks) resolves
    /// to its most "final" marker.
    pub const PROBE_ORDER: [JobState; 9] = [
        JobState::Aborted,
        JobState::Killed,
        JobState::Failed,
        JobState::Done,
        JobState::Cleanup,
        JobState::Closing,
        JobState::Running,
        JobState::Queued,
        JobState::Waiting,
    ];

    pub const ALL: [JobState; 9] = Self::PROBE_ORDER;

    /// Directory name under the gate root this state's symlinks live in.
    pub fn dir_name(self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Closing => "closing",
            JobState::Cleanup => "cleanup",
            JobState::Done => "done",
            JobState::Failed => "failed",
            JobState::Aborted => "aborted",
            JobState::Killed => "killed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Done | JobState::Failed | JobState::Aborted | JobState::Killed
        )
    }

    /// Terminal states map 1:1 onto an [`ExitState`]; used by `Job::exit()`.
    pub fn as_exit_state(self) -> Option<ExitState> {
        match self {
            JobState::Done => Some(ExitState::Done),
            JobState::Failed => Some(ExitState::Failed),
            JobState::Aborted => Some(ExitState::Aborted),
            JobState::Killed => Some(ExitState::Killed),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// The pending terminal state recorded on a job before cleanup completes;
/// becomes the job's actual [`JobState`] on `exit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitState {
    Done,
    Failed,
    Aborted,
    Killed,
}

impl ExitState {
    /// Whether `self` (the currently recorded exit state) may be replaced by
    /// `new`. `aborted` is a dead end: once set, no
    /// further call updates the value, the message, or the persisted opts
    /// record — not even another `aborted`. `killed` only yields to a
    /// promotion to `aborted`; a second `killed` call is itself a no-op.
    /// `done`/`failed` (or no exit state yet) are freely replaceable.
    pub fn may_transition_to(self, new: ExitState) -> bool {
        match self {
            ExitState::Aborted => false,
            ExitState::Killed => new == ExitState::Aborted,
            ExitState::Done | ExitState::Failed => true,
        }
    }

    pub fn as_job_state(self) -> JobState {
        match self {
            ExitState::Done => JobState::Done,
            ExitState::Failed => JobState::Failed,
            ExitState::Aborted => JobState::Aborted,
            ExitState::Killed => JobState::Killed,
        }
    }

    /// `"<Titlecased>"` prefix used in exit messages, e.g. `"Done"`, `"Killed"`.
    pub fn titlecase(self) -> &'static str {
        match self {
            ExitState::Done => "Done",
            ExitState::Failed => "Failed",
            ExitState::Aborted => "Aborted",
            ExitState::Killed => "Killed",
        }
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.titlecase().to_lowercase())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
