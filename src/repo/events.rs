use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_KEEP_LAST: usize = 400;

/// Timestamped text sink with a bounded in-memory tail and an optional
/// append-only file. The file is opened once and kept open.
#[derive(Debug)]
pub struct EventLog {
    keep_last: usize,
    path: Option<PathBuf>,
    file: Mutex<Option<LineWriter<File>>>,
    lines: Mutex<VecDeque<String>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP_LAST, None)
    }
}

impl EventLog {
    pub fn new(keep_last: usize, path: Option<PathBuf>) -> Self {
        let file = path.as_ref().and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(LineWriter::new(file)),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "event log file unavailable, keeping memory tail only"
                    );
                    None
                }
            }
        });
        Self {
            keep_last: keep_last.max(1),
            path,
            file: Mutex::new(file),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    /// True when lines are also going to a file
    pub fn is_persistent(&self) -> bool {
        self.file.lock().is_some()
    }

    /// Record `msg` as `[YYYY-mm-dd HH:MM:SS] msg`
    pub fn log(&self, now: NaiveDateTime, msg: impl AsRef<str>) {
        let line = format!("[{}] {}", now.format("%Y-%m-%d %H:%M:%S"), msg.as_ref());

        if let Some(writer) = self.file.lock().as_mut() {
            if let Err(e) = writeln!(writer, "{line}") {
                warn!(path = ?self.path, error = %e, "event log append failed");
            }
        }

        let mut lines = self.lines.lock();
        lines.push_back(line);
        while lines.len() > self.keep_last {
            lines.pop_front();
        }
    }

    /// The last `n` lines, oldest first
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock();
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
