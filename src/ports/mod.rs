//! The ports tree model: port records, overlay aggregation, and caching.
//!
//! A *port* is a directory containing a build recipe (`Pkgfile`) and
//! metadata for producing one binary package. An *overlay root* is a
//! directory of ports; multiple roots compose into one [`Repository`] with
//! first-wins shadowing. The repository can be flattened into a versioned
//! cache file and rebuilt from it without touching the tree.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//! use ports_toolkit::ports::Repository;
//!
//! let mut repo = Repository::new(false);
//! repo.init_from_overlays(
//!     &[
//!         (PathBuf::from("/usr/ports/core"), None),
//!         (PathBuf::from("/usr/ports/contrib"), None),
//!     ],
//!     true,
//! );
//! if let Some(port) = repo.get_port("zlib") {
//!     println!("zlib {}", port.version_release());
//! }
//! ```

pub mod cache;
pub mod record;
pub mod repository;

pub use cache::{CACHE_VERSION, CacheReadError, CacheWriteError, cache_is_stale};
pub use record::{Port, PortDetails};
pub use repository::{DEFAULT_DEPENDENCY_FILE, OverlayRoot, Repository, ShadowedPort};
