//! Parser for the colon-separated data files shared by several stores.
//!
//! The aliases store and the external dependency overlay both use the same
//! line format: `name : value1,value2,...`, with `#` starting a comment
//! line and whitespace stripped around both sides. Values are normalized to
//! comma lists so callers can split them uniformly.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::Result;

/// What: Parse a `name : comma-list` data file.
///
/// Inputs:
/// - `path`: File to read.
///
/// Output:
/// - Returns `Ok(map)` preserving the file's line order; later duplicate
///   names overwrite earlier ones in place.
///
/// Details:
/// - Lines that are empty, start with `#`, or carry no `:` are skipped.
/// - Values are normalized: runs of spaces collapse, spaces become commas,
///   doubled commas collapse.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be read; callers treat a
/// missing store as an empty one.
pub fn parse_data_file(path: &Path) -> Result<IndexMap<String, String>> {
    let contents = fs::read_to_string(path)?;
    let mut target = IndexMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            tracing::debug!("Skipping malformed data file line: {}", line);
            continue;
        };
        target.insert(
            name.trim().to_string(),
            normalize_comma_list(value.trim()),
        );
    }

    Ok(target)
}

/// Normalize a whitespace-or-comma separated list into a plain comma list.
pub(crate) fn normalize_comma_list(value: &str) -> String {
    let mut value = value.to_string();
    while value.contains("  ") {
        value = value.replace("  ", " ");
    }
    value = value.replace(' ', ",");
    while value.contains(",,") {
        value = value.replace(",,", ",");
    }
    value
}
