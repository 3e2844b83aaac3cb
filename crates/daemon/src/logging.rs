// SPDX-License-Identifier: MIT

//! Logging setup: `tracing` + `tracing-appender` writing to a file under
//! the gate root, with level controlled by `RUST_LOG`.

use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::LifecycleError;

/// Install a global `tracing` subscriber that writes to `log_path`,
/// non-blockingly. The returned guard must be kept alive for the process
/// lifetime — dropping it stops the background flush thread.
pub fn init(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    let dir = log_path
        .parent()
        .ok_or_else(|| LifecycleError::Logging(log_path.to_path_buf(), std::io::Error::from(std::io::ErrorKind::NotFound)))?;
    std::fs::create_dir_all(dir).map_err(|e| LifecycleError::Logging(log_path.to_path_buf(), e))?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging(log_path.to_path_buf(), std::io::Error::from(std::io::ErrorKind::InvalidInput)))?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
