//! Complete Rust toolkit for CRUX-style ports tree and package management.
//!
//! This crate is the engineering core of a source-package manager
//! front-end: it models the ports tree and the installed-package database,
//! resolves dependencies into a buildable order, compares version-release
//! strings, and drives the external builder and installer tools through a
//! transactional install with logging and partial-failure accounting. The
//! command-line surface, pagers, editors and signal plumbing are left to
//! the embedding front-end.
//!
//! # Overview
//!
//! - [`ports`]: port records, overlay aggregation with shadowing, searches,
//!   and the repository cache file
//! - [`db`]: the installed-package database with virtual provides
//! - [`resolver`] and [`version`]: dependency ordering and version
//!   comparison
//! - [`transaction`]: the install transaction over the external tools
//! - [`updates`]: system-wide update planning with locking support
//! - [`config`] and [`locker`]: the configuration model and the
//!   do-not-update set
//!
//! # Examples
//!
//! ## Search the ports tree
//!
//! ```no_run
//! use std::path::PathBuf;
//! use ports_toolkit::ports::Repository;
//!
//! let mut repo = Repository::new(false);
//! repo.init_from_overlays(&[(PathBuf::from("/usr/ports/core"), None)], false);
//! for port in repo.matching_ports("*ssl*")? {
//!     println!("{} {}", port.name(), port.version_release());
//! }
//! # Ok::<(), ports_toolkit::Error>(())
//! ```
//!
//! ## Install a package with its dependencies
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use ports_toolkit::config::Config;
//! use ports_toolkit::db::InstalledDb;
//! use ports_toolkit::ports::Repository;
//! use ports_toolkit::transaction::{InstallOptions, InstallTransaction};
//!
//! let config = Config::parse_file(Path::new("/etc/prt-get.conf"))?;
//! let mut repo = Repository::new(config.use_regex);
//! repo.init_from_overlays(&config.root_list, false);
//! let db = InstalledDb::new(None);
//!
//! let mut closure = InstallTransaction::new(["irssi"], &repo, &db, &config);
//! let order: Vec<String> = closure.calc_dependencies()?.to_vec();
//!
//! let mut transaction = InstallTransaction::new(order, &repo, &db, &config);
//! transaction.install(&InstallOptions::default(), false, false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Plan a system update
//!
//! ```no_run
//! use ports_toolkit::db::InstalledDb;
//! use ports_toolkit::locker::{DEFAULT_LOCKER_FILE, Locker};
//! use ports_toolkit::ports::Repository;
//! use ports_toolkit::updates::plan_system_update;
//!
//! let repo = Repository::new(false);
//! let db = InstalledDb::new(None);
//! let locker = Locker::open(DEFAULT_LOCKER_FILE);
//!
//! let plan = plan_system_update(&repo, &db, &locker, true);
//! for odd in &plan.undecidable {
//!     println!("{}: {} vs {}", odd.name, odd.installed, odd.candidate);
//! }
//! ```

pub mod config;
pub mod datafile;
pub mod db;
pub mod error;
pub mod locker;
pub mod lockfile;
pub mod ports;
pub mod process;
pub mod resolver;
pub mod transaction;
pub mod updates;
pub mod version;

mod util;

/// Prelude module for convenient imports.
///
/// Re-exports the types and functions most front-ends need, so a single
/// `use ports_toolkit::prelude::*;` covers the common cases.
pub mod prelude;

// Re-export commonly used types
pub use error::{PortsToolkitError as Error, Result};

pub use config::{Config, ReadmeMode};
pub use db::InstalledDb;
pub use locker::Locker;
pub use ports::{Port, PortDetails, Repository};
pub use resolver::DepResolver;
pub use transaction::{
    HookState, InstallInfo, InstallOptions, InstallTransaction, TransactionError,
};
pub use updates::{UpdatePlan, plan_system_update};
pub use version::{VersionCmp, compare_versions};
