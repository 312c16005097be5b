//! Build log handling for install transactions.
//!
//! Every package step can write a log whose path comes from a pattern with
//! `%n` (name), `%p` (overlay root), `%v` (version) and `%r` (release)
//! placeholders. The log directory is created on demand; an optional
//! cooperative lock guards against two front-ends writing the same log.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::config::Config;
use crate::lockfile::LockFile;
use crate::ports::Port;
use crate::ports::cache::create_output_dir;
use crate::transaction::TransactionError;

/// Timestamp format for the log header lines, `ctime`-style.
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// An open build log for one package step.
#[derive(Debug)]
pub(crate) struct BuildLog {
    /// The log file, opened for appending.
    file: File,
    /// The expanded log path.
    path: PathBuf,
    /// Cooperative lock over the log, when requested.
    lock: Option<LockFile>,
}

impl BuildLog {
    /// What: Expand the configured pattern and open the log for `port`.
    ///
    /// Inputs:
    /// - `config`: Supplies the pattern and the append/truncate mode.
    /// - `port`: Substituted into the pattern placeholders.
    /// - `use_lock`: Whether a `<log>.lock` sidecar must be acquired.
    ///
    /// Output:
    /// - Returns the open log with a lock held when requested.
    ///
    /// # Errors
    ///
    /// [`TransactionError::NoLogFile`] on an empty pattern,
    /// [`TransactionError::LogDirFailure`] when the directory cannot be
    /// created, [`TransactionError::CantLockLogFile`] when the sidecar
    /// exists or cannot be created, [`TransactionError::LogFileFailure`]
    /// when the log itself cannot be opened.
    pub(crate) fn open(
        config: &Config,
        port: &Port,
        use_lock: bool,
    ) -> Result<Self, TransactionError> {
        if config.log_file_pattern.is_empty() {
            return Err(TransactionError::NoLogFile);
        }
        let path = expand_log_pattern(&config.log_file_pattern, port);

        if let Some(parent) = path.parent()
            && create_output_dir(parent).is_err()
        {
            return Err(TransactionError::LogDirFailure);
        }

        let lock = if use_lock {
            let mut lock = LockFile::for_file(&path);
            if !lock.lock_write() {
                return Err(TransactionError::CantLockLogFile);
            }
            Some(lock)
        } else {
            None
        };

        if !config.append_log {
            let _ = fs::remove_file(&path);
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|_| TransactionError::LogFileFailure)?;

        Ok(Self { file, path, lock })
    }

    /// Append one line to the log; write failures are not fatal to the
    /// build and only logged.
    pub(crate) fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.file, "{line}") {
            tracing::warn!("Could not write to {}: {}", self.path.display(), err);
        }
    }

    /// Append a `<label>: <event> <timestamp>` header line.
    pub(crate) fn write_timestamped(&mut self, label: &str, event: &str) {
        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        self.write_line(&format!("{label}: {event} {stamp}"));
    }

    /// The underlying file, for teeing child output.
    pub(crate) fn file(&self) -> &File {
        &self.file
    }

    /// Release the lock and close the log, removing the file when the
    /// caller asks for it (successful non-append builds with
    /// remove-on-success configured).
    pub(crate) fn close(mut self, remove: bool) {
        if let Some(lock) = &mut self.lock {
            lock.unlock();
        }
        drop(self.file);
        if remove {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Expand `%n`, `%p`, `%v` and `%r` in a log file pattern.
pub(crate) fn expand_log_pattern(pattern: &str, port: &Port) -> PathBuf {
    let expanded = pattern
        .replace("%n", port.name())
        .replace("%p", &port.path().display().to_string())
        .replace("%v", port.version())
        .replace("%r", port.release());
    PathBuf::from(expanded)
}
