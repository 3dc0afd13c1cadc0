//! Diagnostic logging.
//!
//! The TUI owns the terminal, so tracing output only goes to a file. With no
//! log file configured nothing is installed and the `tracing` macros are
//! no-ops.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::config::data::path_display;

pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("failed to open log file '{}': {err}", path_display(path)))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init()
        .map_err(|err| err as Box<dyn Error>)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unwritable_log_path_is_reported() {
        let temp_dir = TempDir::new().expect("temp dir");
        // A directory cannot be opened for appending.
        let err = init_file_logging(temp_dir.path()).expect_err("should fail");
        assert!(err.to_string().starts_with("failed to open log file"));
    }
}
