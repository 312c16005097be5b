//! On-disk cache of a fully loaded ports tree.
//!
//! Scanning overlay roots is cheap but loading every `Pkgfile` is not, so a
//! repository can be flattened into a line-oriented cache file and read back
//! without touching the tree. The format is versioned by a leading tag; a
//! tag mismatch is a hard error so stale caches from older writers are
//! regenerated instead of misparsed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ports::record::{Port, PortDetails};

/// Version tag on the cache file's first line.
pub const CACHE_VERSION: &str = "V5";

/// Fixed field lines per cached port, excluding the blank separator.
const FIELDS_PER_PORT: usize = 12;

/// Failure reading a cache file.
#[derive(Error, Debug)]
pub enum CacheReadError {
    /// The file cannot be opened or read.
    #[error("cannot access cache file: {0}")]
    Access(#[from] io::Error),

    /// The leading version tag does not match [`CACHE_VERSION`].
    #[error("cache format version mismatch: found {found:?}, expected {CACHE_VERSION:?}")]
    Format {
        /// The tag actually found on the first line.
        found: String,
    },
}

/// Failure writing a cache file.
#[derive(Error, Debug)]
pub enum CacheWriteError {
    /// The cache directory cannot be created.
    #[error("cannot create cache directory {path}: {source}")]
    Dir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The cache file itself cannot be written.
    #[error("cannot write cache file: {0}")]
    File(#[from] io::Error),
}

/// What: Read every port from a cache file.
///
/// Inputs:
/// - `cache_file`: File written by [`write_cache`].
///
/// Output:
/// - Returns fully materialized ports in file order.
///
/// Details:
/// - Records are 12 fixed field lines followed by one blank line; a record
///   truncated by the end of the file is dropped.
///
/// # Errors
///
/// [`CacheReadError::Access`] when the file cannot be read,
/// [`CacheReadError::Format`] on a version tag mismatch.
pub fn read_cache(cache_file: &Path) -> Result<Vec<Port>, CacheReadError> {
    let contents = fs::read_to_string(cache_file)?;
    let mut lines = contents.lines();

    let tag = lines.next().unwrap_or("").trim();
    if tag != CACHE_VERSION {
        return Err(CacheReadError::Format {
            found: tag.to_string(),
        });
    }

    let mut ports = Vec::new();
    let mut fields: Vec<String> = Vec::with_capacity(FIELDS_PER_PORT);
    loop {
        let Some(line) = lines.next() else {
            break;
        };
        fields.push(line.trim().to_string());
        if fields.len() == FIELDS_PER_PORT {
            ports.push(port_from_fields(&fields));
            fields.clear();
            // skip the blank separator line
            let _ = lines.next();
        }
    }

    Ok(ports)
}

/// What: Write ports to a cache file, creating the directory when needed.
///
/// Inputs:
/// - `cache_file`: Destination path.
/// - `ports`: Records to flatten; writing forces a full metadata load.
///
/// # Errors
///
/// [`CacheWriteError::Dir`] when the parent directory cannot be created,
/// [`CacheWriteError::File`] when the file cannot be written.
pub fn write_cache<'a>(
    cache_file: &Path,
    ports: impl Iterator<Item = &'a Port>,
) -> Result<(), CacheWriteError> {
    if let Some(parent) = cache_file.parent() {
        create_output_dir(parent).map_err(|source| CacheWriteError::Dir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut out = String::new();
    out.push_str(CACHE_VERSION);
    out.push('\n');

    for port in ports {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        out.push_str(&format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n\n",
            port.name(),
            port.path().display(),
            port.version(),
            port.release(),
            port.description(),
            port.dependencies(),
            port.url(),
            port.packager(),
            port.maintainer(),
            yes_no(port.has_readme()),
            yes_no(port.has_pre_install()),
            yes_no(port.has_post_install()),
        ));
    }

    fs::write(cache_file, out)?;
    Ok(())
}

/// What: Decide whether a cache file must be regenerated.
///
/// Inputs:
/// - `cache_file`: The cache to check.
/// - `config_file`: The configuration file whose overlay roots produced it.
///
/// Output:
/// - Returns `true` when the cache is missing or the configuration changed
///   after the cache was written (inode change time comparison).
#[must_use]
pub fn cache_is_stale(cache_file: &Path, config_file: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Ok(cache_meta) = fs::metadata(cache_file) else {
        return true;
    };
    let Ok(config_meta) = fs::metadata(config_file) else {
        return false;
    };
    config_meta.ctime() > cache_meta.ctime()
}

/// Create `path` and any missing parents with mode `0755`.
pub(crate) fn create_output_dir(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// Materialize one port from its 12 cache fields.
fn port_from_fields(fields: &[String]) -> Port {
    let yes = |index: usize| fields[index] == "yes";
    let details = PortDetails {
        version: fields[2].clone(),
        release: fields[3].clone(),
        description: fields[4].clone(),
        dependencies: fields[5].clone(),
        url: fields[6].clone(),
        packager: fields[7].clone(),
        maintainer: fields[8].clone(),
        has_readme: yes(9),
        has_pre_install: yes(10),
        has_post_install: yes(11),
    };
    Port::materialized(fields[0].clone(), fields[1].clone(), details)
}
