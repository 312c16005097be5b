//! Persistent set of packages excluded from system-wide updates.
//!
//! The locker file holds one package name per line. Locked packages are
//! skipped by the update planner until they are unlocked again. The set is
//! read once on construction and only written back on an explicit
//! [`Locker::store`]; nothing auto-persists.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Conventional location of the locker file on a CRUX system.
pub const DEFAULT_LOCKER_FILE: &str = "/var/lib/pkg/prt-get.locker";

/// Ordered set of package names excluded from updates.
#[derive(Debug)]
pub struct Locker {
    /// Backing file, written by [`Locker::store`].
    path: PathBuf,
    /// Locked names in file order.
    packages: Vec<String>,
    /// Whether the backing file could not be opened on construction.
    open_failed: bool,
}

impl Locker {
    /// What: Load the locker from `path`.
    ///
    /// Inputs:
    /// - `path`: Locker file, one package name per line.
    ///
    /// Output:
    /// - Returns a `Locker` holding the names found; an unreadable file
    ///   yields an empty set with [`Locker::open_failed`] set.
    ///
    /// Details:
    /// - Blank lines are ignored.
    /// - A missing file is the normal first-run state, so it is not an
    ///   error; callers that care can inspect `open_failed`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let packages = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                Self {
                    path,
                    packages,
                    open_failed: false,
                }
            }
            Err(err) => {
                tracing::debug!("Could not read locker file {}: {}", path.display(), err);
                Self {
                    path,
                    packages: Vec::new(),
                    open_failed: true,
                }
            }
        }
    }

    /// Add `package` to the set. Returns `false` if it was already locked.
    pub fn lock(&mut self, package: &str) -> bool {
        if self.is_locked(package) {
            return false;
        }
        self.packages.push(package.to_string());
        true
    }

    /// Remove `package` from the set. Returns `false` if it was not locked.
    pub fn unlock(&mut self, package: &str) -> bool {
        let Some(index) = self.packages.iter().position(|p| p == package) else {
            return false;
        };
        self.packages.remove(index);
        true
    }

    /// Whether `package` is currently locked.
    #[must_use]
    pub fn is_locked(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }

    /// The locked names in insertion order.
    #[must_use]
    pub fn locked_packages(&self) -> &[String] {
        &self.packages
    }

    /// Whether the backing file could not be opened on construction.
    #[must_use]
    pub const fn open_failed(&self) -> bool {
        self.open_failed
    }

    /// What: Write the current set back to the backing file.
    ///
    /// Output:
    /// - Returns `Ok(())` once every name is written, one per line.
    ///
    /// Details:
    /// - Creates the parent directory when missing.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or the file cannot be
    /// written.
    pub fn store(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all_if_missing(parent)?;
        }
        let mut contents = String::new();
        for package in &self.packages {
            contents.push_str(package);
            contents.push('\n');
        }
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Create `dir` and any missing parents.
fn create_dir_all_if_missing(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.is_dir() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_and_unlock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut locker = Locker::open(dir.path().join("locker"));
        assert!(locker.open_failed());

        assert!(locker.lock("glibc"));
        assert!(!locker.lock("glibc"));
        assert!(locker.is_locked("glibc"));

        assert!(locker.unlock("glibc"));
        assert!(!locker.unlock("glibc"));
        assert!(!locker.is_locked("glibc"));
    }

    #[test]
    fn test_store_and_reload_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("locker");

        let mut locker = Locker::open(&path);
        locker.lock("openssl");
        locker.lock("zlib");
        locker.store().expect("store");

        let reloaded = Locker::open(&path);
        assert!(!reloaded.open_failed());
        assert_eq!(reloaded.locked_packages(), ["openssl", "zlib"]);

        let mut reloaded = reloaded;
        assert!(reloaded.unlock("openssl"));
        reloaded.store().expect("store");

        let reloaded = Locker::open(&path);
        assert_eq!(reloaded.locked_packages(), ["zlib"]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("locker");
        fs::write(&path, "a\n\n\nb\n").expect("write");

        let locker = Locker::open(&path);
        assert_eq!(locker.locked_packages(), ["a", "b"]);
    }
}
