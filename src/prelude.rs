//! Convenient re-exports for embedding front-ends.
//!
//! # Example
//!
//! ```no_run
//! use ports_toolkit::prelude::*;
//!
//! let repo = Repository::new(false);
//! let db = InstalledDb::new(None);
//! assert!(!db.is_installed("nonexistent", true));
//! # let _ = repo;
//! ```

pub use crate::config::{Config, DEFAULT_CONFIG_FILE, ReadmeMode};
pub use crate::db::{DEFAULT_ALIASES_FILE, DEFAULT_DB_FILE, InstalledDb};
pub use crate::error::{PortsToolkitError, Result};
pub use crate::locker::{DEFAULT_LOCKER_FILE, Locker};
pub use crate::ports::{
    CACHE_VERSION, CacheReadError, CacheWriteError, Port, PortDetails, Repository, ShadowedPort,
    cache_is_stale,
};
pub use crate::resolver::DepResolver;
pub use crate::transaction::{
    HookState, InstallInfo, InstallOptions, InstallTransaction, TransactionError,
};
pub use crate::updates::{
    UndecidableUpdate, UpdatePlan, dependency_order, plan_system_update, policy_compare,
};
pub use crate::version::{VersionCmp, compare_versions};
