//! Persistent error log (`errors.txt`).
//!
//! Every error the audit handles is appended here with its context and the
//! full cause chain, whatever the console verbosity.

use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

pub const DEFAULT_ERROR_LOG: &str = "errors.txt";

const RULE: &str = "==================================================";

/// The error and each of its causes, one per line.
pub fn format_chain(error: &dyn Error) -> String {
    let mut trace = String::new();
    let mut depth = 0;
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        trace.push_str(&format!("  {}: {}\n", depth, err));
        depth += 1;
        current = err.source();
    }
    trace
}

/// Render one log entry.
pub fn format_entry(at: NaiveDateTime, context: &str, error: &dyn Error) -> String {
    let trace = format_chain(error);
    format!(
        "\n=== ERROR at {} ===\nContext: {}\nError: {}\nTrace:\n{}{}\n\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        context,
        error,
        trace,
        RULE
    )
}

/// Appends entries to a log file, opening it for each write.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, context: &str, error: &dyn Error) -> std::io::Result<()> {
        let entry = format_entry(Local::now().naive_local(), context, error);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG)
    }
}
