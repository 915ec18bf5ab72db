//! Run log handed to every stage of a classification run.
//!
//! The log is created at the start of a run and closed at its end. Stages
//! receive it as `&dyn AnalysisLog` instead of reaching for a global, so a
//! run's progress and failures end up in one place next to its outputs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StackError};

/// File name of the run log inside the output directory.
pub const LOG_FILE_NAME: &str = "aloc.log";

/// Sink for progress and error messages of a single run.
pub trait AnalysisLog: Send + Sync {
    /// Record a progress message.
    fn log(&self, message: &str);

    /// Record a failure. The run may still continue.
    fn err(&self, message: &str);

    /// Flush and release the sink. Later messages are dropped.
    fn close(&self);
}

/// Forwards messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl AnalysisLog for TracingLog {
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn err(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn close(&self) {}
}

/// Appends messages to a file and mirrors them to `tracing`.
///
/// Every line is flushed as it is written so the file is readable while the
/// run is still going.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileLog {
    /// Open (or append to) `aloc.log` in `dir`.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(dir.as_ref().join(LOG_FILE_NAME))
    }

    /// Open (or append to) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StackError::io(&path, e))?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(&self, line: &str) {
        let mut guard = self.writer();
        let Some(writer) = guard.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write run log");
        }
    }
}

impl AnalysisLog for FileLog {
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
        self.write_line(message);
    }

    fn err(&self, message: &str) {
        tracing::error!("{}", message);
        self.write_line(&format!("ERROR: {message}"));
    }

    fn close(&self) {
        if let Some(mut writer) = self.writer().take() {
            if let Err(e) = writer.flush() {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush run log");
            }
        }
    }
}

/// Keeps messages in memory, for callers that inspect a run afterwards.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, errors prefixed with `ERROR: `.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Check if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).push(line);
    }
}

impl AnalysisLog for MemoryLog {
    fn log(&self, message: &str) {
        self.push(message.to_string());
    }

    fn err(&self, message: &str) {
        self.push(format!("ERROR: {message}"));
    }

    fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_log_appends_and_prefixes_errors() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileLog::create(dir.path()).unwrap();
        log.log("starting");
        log.err("layer rain unreadable");
        log.close();
        log.log("after close");

        let text = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(text, "starting\nERROR: layer rain unreadable\n");

        // reopening appends
        let log = FileLog::create(dir.path()).unwrap();
        log.log("second run");
        log.close();
        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.ends_with("unreadable\nsecond run\n"));
    }

    #[test]
    fn test_memory_log() {
        let log = MemoryLog::new();
        log.log("a");
        log.err("b");
        assert_eq!(log.lines(), vec!["a".to_string(), "ERROR: b".to_string()]);
        assert!(log.contains("ERROR"));
    }
}
