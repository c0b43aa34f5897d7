//! Append-only log of pass failures

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Mirrors pass-boundary failures into a file next to the regular log output
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    path: Option<PathBuf>,
}

impl ErrorLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Log `message` as an error and append it to the file, if any
    ///
    /// Failing to write the file never fails the caller.
    pub fn record(&self, message: &str) {
        log::error!("{message}");
        let Some(path) = &self.path else {
            return;
        };
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "[sceneopt] {message}"));
        if let Err(e) = written {
            log::debug!("could not append to {}: {e}", path.display());
        }
    }
}
