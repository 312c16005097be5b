//! Extraction of settings from the package builder's configuration.
//!
//! The builder keeps its settings as shell assignments, usually in
//! `/etc/pkgmk.conf` with defaults inside the builder script itself. The
//! two settings the transaction needs are `PKGMK_PACKAGE_DIR` (where built
//! packages land) and `PKGMK_COMPRESSION_MODE` (the archive suffix).
//! Because values may reference other shell variables, the last matching
//! assignment is resolved through a one-shot `sh -c "eval ... && echo"`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The builder's configuration file.
pub const DEFAULT_PKGMK_CONF: &str = "/etc/pkgmk.conf";

/// The builder script, probed for defaults when the configuration file
/// does not carry a setting.
pub const DEFAULT_PKGMK_COMMAND: &str = "/usr/bin/pkgmk";

/// The default probe order: configuration first, builder script second.
#[must_use]
pub fn default_probe_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from(DEFAULT_PKGMK_CONF),
        PathBuf::from(DEFAULT_PKGMK_COMMAND),
    ]
}

/// The builder's package output directory, or empty when unset.
#[must_use]
pub fn package_dir(probe_files: &[PathBuf]) -> String {
    pkgmk_setting("PKGMK_PACKAGE_DIR", probe_files)
}

/// The builder's compression mode; `gz` when unset.
#[must_use]
pub fn compression_mode(probe_files: &[PathBuf]) -> String {
    let value = pkgmk_setting("PKGMK_COMPRESSION_MODE", probe_files);
    if value.is_empty() { "gz".to_string() } else { value }
}

/// What: Look a builder setting up across the probe files.
///
/// Inputs:
/// - `setting`: Shell variable name, e.g. `PKGMK_PACKAGE_DIR`.
/// - `probe_files`: Files tried in order; the first non-empty value wins.
///
/// Output:
/// - Returns the resolved value, or an empty string when no file carries
///   the setting.
#[must_use]
pub fn pkgmk_setting(setting: &str, probe_files: &[PathBuf]) -> String {
    for file in probe_files {
        let value = setting_from_file(setting, file);
        if !value.is_empty() {
            return value;
        }
    }
    String::new()
}

/// Find the last `SETTING=...` assignment in `file` and resolve it through
/// the shell. Unreadable files and failed evaluations yield an empty value.
fn setting_from_file(setting: &str, file: &Path) -> String {
    let Ok(contents) = fs::read_to_string(file) else {
        return String::new();
    };

    let prefix = format!("{setting}=");
    let Some(candidate) = contents
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(&prefix))
        .next_back()
    else {
        return String::new();
    };

    let command = format!("eval {candidate} && echo ${setting}");
    tracing::debug!("Resolving builder setting: {}", command);
    let output = Command::new("/bin/sh")
        .args(["-c", &command])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string(),
        Err(err) => {
            tracing::debug!("Could not evaluate builder setting: {}", err);
            String::new()
        }
    }
}
