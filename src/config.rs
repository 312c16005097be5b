//! Configuration model for the front-end.
//!
//! The configuration file is line-oriented: one `key value` pair per line,
//! `#` starts a comment and also terminates a value mid-line. Keys are
//! matched case-insensitively. `prtdir` lines accumulate into the overlay
//! root list in file order; everything else is last-writer-wins.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ports::OverlayRoot;
use crate::util::{starts_with_nocase, value_before};

/// Location of the configuration file on a CRUX system.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/prt-get.conf";

/// How README files of freshly installed packages are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ReadmeMode {
    /// List packages with READMEs in a separate block.
    #[default]
    Verbose,
    /// Tag packages inline with `(README)`.
    Compact,
    /// Do not report READMEs at all.
    Disabled,
}

/// Parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Overlay roots in search order, each with an optional whitelist.
    pub root_list: Vec<OverlayRoot>,
    /// Path of the repository cache file; empty means unset.
    pub cache_file: String,
    /// Whether installs write a build log.
    pub write_log: bool,
    /// Whether the build log is appended to instead of truncated.
    pub append_log: bool,
    /// Whether a successful build's log is removed again. Not a file key;
    /// set by the embedding front-end.
    pub remove_log_on_success: bool,
    /// Build log path pattern with `%n`/`%p`/`%v`/`%r` placeholders.
    pub log_file_pattern: String,
    /// README reporting mode.
    pub readme_mode: ReadmeMode,
    /// Whether pre/post-install scripts run by default.
    pub run_scripts: bool,
    /// Whether version comparison prefers the higher version instead of
    /// treating any difference as an update.
    pub prefer_higher: bool,
    /// Whether search patterns are regexes instead of shell wildcards.
    pub use_regex: bool,
    /// Override for the package build command; empty means the default.
    pub make_command: String,
    /// Override for the package install command; empty means the default.
    pub add_command: String,
    /// Override for the package remove command; empty means the default.
    pub remove_command: String,
    /// Override for the script interpreter; empty means `sh`.
    pub runscript_command: String,
}

impl Config {
    /// What: Parse a configuration file.
    ///
    /// Inputs:
    /// - `config_file`: File to read.
    ///
    /// Output:
    /// - Returns the parsed configuration; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Fails only when the file cannot be read.
    pub fn parse_file(config_file: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_file)?;
        let mut config = Self::default();
        for line in contents.lines() {
            let line = value_before(line, '#').trim().to_string();
            config.parse_line(&line, false);
        }
        Ok(config)
    }

    /// What: Apply one extra configuration line on top of the parsed file.
    ///
    /// Inputs:
    /// - `line`: A line in configuration file syntax.
    /// - `replace`: When set and the line is a `prtdir`, the existing root
    ///   list is discarded first (a "set" rather than an "append").
    /// - `prepend`: Whether list-valued settings go in front instead of at
    ///   the end.
    pub fn add_config_line(&mut self, line: &str, replace: bool, prepend: bool) {
        if replace && starts_with_nocase(line, "prtdir") {
            self.root_list.clear();
        }
        self.parse_line(line, prepend);
    }

    /// Apply one already-stripped configuration line.
    fn parse_line(&mut self, line: &str, prepend: bool) {
        if line.is_empty() {
            return;
        }

        if let Some(value) = key_value(line, "prtdir") {
            self.add_root(value, prepend);
        } else if let Some(value) = key_value(line, "cachefile") {
            self.cache_file = value.to_string();
        } else if let Some(value) = key_value(line, "writelog") {
            if value == "enabled" {
                self.write_log = true;
            }
        } else if let Some(value) = key_value(line, "logfile") {
            self.log_file_pattern = value.to_string();
        } else if let Some(value) = key_value(line, "logmode") {
            if value == "append" {
                self.append_log = true;
            }
        } else if let Some(value) = key_value(line, "readme") {
            if value == "compact" {
                self.readme_mode = ReadmeMode::Compact;
            } else if value == "disabled" {
                self.readme_mode = ReadmeMode::Disabled;
            }
        } else if let Some(value) = key_value(line, "runscripts") {
            if value == "yes" {
                self.run_scripts = true;
            }
        } else if let Some(value) = key_value(line, "preferhigher") {
            if value == "yes" {
                self.prefer_higher = true;
            }
        } else if let Some(value) = key_value(line, "useregex") {
            if value == "yes" {
                self.use_regex = true;
            }
        } else if let Some(value) = key_value(line, "makecommand") {
            self.make_command = value.to_string();
        } else if let Some(value) = key_value(line, "addcommand") {
            self.add_command = value.to_string();
        } else if let Some(value) = key_value(line, "removecommand") {
            self.remove_command = value.to_string();
        } else if let Some(value) = key_value(line, "runscriptcommand") {
            self.runscript_command = value.to_string();
        }
    }

    /// Register a `prtdir` value, `PATH` or `PATH : PKGS`. Inaccessible
    /// paths are reported and skipped.
    fn add_root(&mut self, value: &str, prepend: bool) {
        let path = value_before(value, ':').trim();
        let whitelist = value
            .split_once(':')
            .map(|(_, packages)| packages.to_string());

        if !Path::new(path).is_dir() {
            tracing::warn!("Config error: can't access {}", path);
            return;
        }

        let root = (PathBuf::from(path), whitelist);
        if prepend {
            self.root_list.insert(0, root);
        } else {
            self.root_list.push(root);
        }
    }
}

/// The value of `line` when it starts with `key` (case-insensitive),
/// stripped of surrounding whitespace.
fn key_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    if starts_with_nocase(line, key) {
        Some(line[key.len()..].trim())
    } else {
        None
    }
}
