//! Creation-based advisory locking for build log files.
//!
//! A lock on `foo.log` is represented by a sidecar file `foo.log.lock` that
//! must not pre-exist. Whoever manages to create it holds the lock; removing
//! it releases the lock. This is purely cooperative between processes that
//! agree on the convention.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the protected file's path to form the sidecar.
const LOCK_SUFFIX: &str = ".lock";

/// Marker written into the sidecar so a stale file is self-describing.
const WRITE_LOCK_MARKER: &str = "write_lock";

/// Advisory write lock on a single file.
#[derive(Debug)]
pub struct LockFile {
    /// Path of the sidecar file.
    lock_path: PathBuf,
    /// Whether this instance currently holds the lock.
    held: bool,
}

impl LockFile {
    /// Create a lock handle for `target`; no lock is taken yet.
    #[must_use]
    pub fn for_file(target: &Path) -> Self {
        let mut name = target.as_os_str().to_owned();
        name.push(LOCK_SUFFIX);
        Self {
            lock_path: PathBuf::from(name),
            held: false,
        }
    }

    /// What: Try to take the write lock.
    ///
    /// Output:
    /// - Returns `true` when the sidecar was created (or this instance
    ///   already holds it), `false` when somebody else holds the lock or
    ///   the sidecar cannot be created.
    ///
    /// Details:
    /// - Creation is the atomic primitive: `O_CREAT | O_EXCL` either makes
    ///   a fresh file or fails because one exists.
    pub fn lock_write(&mut self) -> bool {
        if self.held {
            return true;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(mut file) => {
                let _ = file.write_all(WRITE_LOCK_MARKER.as_bytes());
                self.held = true;
                true
            }
            Err(err) => {
                tracing::debug!(
                    "Could not create lock file {}: {}",
                    self.lock_path.display(),
                    err
                );
                false
            }
        }
    }

    /// Release the lock by removing the sidecar. Returns `false` when this
    /// instance does not hold the lock or the sidecar cannot be removed.
    pub fn unlock(&mut self) -> bool {
        if !self.held {
            return false;
        }
        if std::fs::remove_file(&self.lock_path).is_ok() {
            self.held = false;
            return true;
        }
        false
    }

    /// Path of the sidecar file, mainly for diagnostics.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if self.held {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
