//! Reader for the installed-package database.
//!
//! The database is the blank-line-separated file maintained by the low-level
//! package tools: each record starts with the package name, then the
//! installed `version-release` string, then the file list (which this crate
//! skips). On top of it sits the aliases store, which declares that an
//! installed package satisfies dependencies on other names (virtual
//! provides). Aliases are only consulted when a direct lookup misses.
//!
//! The database is read once, on first query, and cached for the life of
//! the object. Code that installs packages and re-queries in the same run
//! sees the initial snapshot, not the new state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::datafile::parse_data_file;
use crate::error::Result;
use crate::ports::repository::NameMatcher;

/// Location of the installed-package database on a CRUX system.
pub const DEFAULT_DB_FILE: &str = "/var/lib/pkg/db";

/// Conventional location of the aliases store.
pub const DEFAULT_ALIASES_FILE: &str = "/var/lib/pkg/prt-get.aliases";

/// Loaded database state.
#[derive(Debug, Default)]
struct DbState {
    /// Installed packages: name to `version-release`.
    packages: BTreeMap<String, String>,
    /// Virtual provides: installed provider to the names it satisfies,
    /// in store order.
    aliases: IndexMap<String, Vec<String>>,
}

/// Fallback for queries against a database that failed to load.
static EMPTY_PACKAGES: BTreeMap<String, String> = BTreeMap::new();

/// The installed-package database with alias resolution.
#[derive(Debug)]
pub struct InstalledDb {
    /// Path of the database file.
    db_file: PathBuf,
    /// Path of the aliases store.
    aliases_file: PathBuf,
    /// Lazily loaded snapshot; `None` when the database was unreadable.
    state: OnceCell<Option<DbState>>,
}

impl InstalledDb {
    /// Create a reader for the system database, optionally relocated under
    /// an install root. The aliases store is not relocated; it describes
    /// the host system.
    #[must_use]
    pub fn new(install_root: Option<&Path>) -> Self {
        let db_file = install_root.map_or_else(
            || PathBuf::from(DEFAULT_DB_FILE),
            |root| PathBuf::from(format!("{}{DEFAULT_DB_FILE}", root.display())),
        );
        Self {
            db_file,
            aliases_file: PathBuf::from(DEFAULT_ALIASES_FILE),
            state: OnceCell::new(),
        }
    }

    /// Create a reader over explicit database and aliases paths.
    #[must_use]
    pub fn with_paths(db_file: impl Into<PathBuf>, aliases_file: impl Into<PathBuf>) -> Self {
        Self {
            db_file: db_file.into(),
            aliases_file: aliases_file.into(),
            state: OnceCell::new(),
        }
    }

    /// What: Check whether a package is installed.
    ///
    /// Inputs:
    /// - `name`: Package name to look up.
    /// - `use_alias`: Whether the aliases store is consulted on a miss.
    ///
    /// Output:
    /// - Returns `true` when the name is in the database, or (with
    ///   `use_alias`) when some installed package provides it.
    #[must_use]
    pub fn is_installed(&self, name: &str, use_alias: bool) -> bool {
        let Some(state) = self.load() else {
            return false;
        };
        if state.packages.contains_key(name) {
            return true;
        }
        use_alias && self.provider_of(name).is_some()
    }

    /// What: Find the installed package providing `name` as an alias.
    ///
    /// Output:
    /// - Returns the provider's real name, or `None` when `name` is not
    ///   provided by anything. First match in store order wins.
    #[must_use]
    pub fn provider_of(&self, name: &str) -> Option<&str> {
        let state = self.load()?;
        state
            .aliases
            .iter()
            .find(|(_, provided)| provided.iter().any(|p| p == name))
            .map(|(provider, _)| provider.as_str())
    }

    /// The installed `version-release` string of `name`, if any.
    #[must_use]
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.load()?.packages.get(name).map(String::as_str)
    }

    /// Every installed package with its `version-release`, in name order.
    /// An unreadable database reads as empty.
    #[must_use]
    pub fn installed_packages(&self) -> &BTreeMap<String, String> {
        self.load().map_or(&EMPTY_PACKAGES, |state| &state.packages)
    }

    /// What: Find installed packages whose name matches a pattern.
    ///
    /// Inputs:
    /// - `pattern`: Shell wildcard, or regex when `use_regex` is set; both
    ///   case-insensitive.
    ///
    /// Output:
    /// - Matching names with their `version-release` strings.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not parse.
    pub fn matching_packages(
        &self,
        pattern: &str,
        use_regex: bool,
    ) -> Result<BTreeMap<String, String>> {
        let matcher = NameMatcher::build(pattern, use_regex)?;
        Ok(self
            .installed_packages()
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .map(|(name, version)| (name.clone(), version.clone()))
            .collect())
    }

    /// Load the database and aliases on first use.
    fn load(&self) -> Option<&DbState> {
        self.state
            .get_or_init(|| {
                let contents = match fs::read_to_string(&self.db_file) {
                    Ok(contents) => contents,
                    Err(err) => {
                        tracing::debug!(
                            "Could not read package database {}: {}",
                            self.db_file.display(),
                            err
                        );
                        return None;
                    }
                };

                let packages = parse_db(&contents);
                let aliases = self.load_aliases(&packages);
                Some(DbState { packages, aliases })
            })
            .as_ref()
    }

    /// Read the aliases store, keeping only entries whose provider is
    /// actually installed, in store order.
    fn load_aliases(&self, packages: &BTreeMap<String, String>) -> IndexMap<String, Vec<String>> {
        let Ok(raw) = parse_data_file(&self.aliases_file) else {
            return IndexMap::new();
        };
        raw.into_iter()
            .filter(|(provider, _)| packages.contains_key(provider))
            .map(|(provider, provided)| {
                let provided = provided
                    .split(',')
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                (provider, provided)
            })
            .collect()
    }
}

/// Parse the blank-line-separated database format. Records missing their
/// version line are skipped.
fn parse_db(contents: &str) -> BTreeMap<String, String> {
    let mut packages = BTreeMap::new();

    for record in contents.split("\n\n") {
        let mut lines = record.lines().filter(|line| !line.is_empty());
        let Some(name) = lines.next() else {
            continue;
        };
        let Some(version) = lines.next() else {
            continue;
        };
        packages.insert(name.to_string(), version.to_string());
    }

    packages
}
