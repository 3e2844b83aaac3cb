// SPDX-License-Identifier: MIT

//! `opts/<id>`: the persisted `{exit_state, exit_code, exit_message}` triple.

use jg_core::{ExitCode, ExitState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptsRecord {
    pub exit_state: ExitState,
    pub exit_code: ExitCode,
    pub exit_message: String,
}
