//! Aggregation of overlay roots into one ports tree.
//!
//! A repository scans an ordered list of overlay roots and keeps one record
//! per port name with first-occurrence-wins shadowing. Later roots can see
//! their colliding ports recorded in a shadow map for diagnostics. Lookups
//! come in three flavors: exact name, name pattern (shell wildcard or
//! regex), and pattern-over-name-and-description.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use regex::RegexBuilder;

use crate::datafile::{normalize_comma_list, parse_data_file};
use crate::error::Result;
use crate::ports::cache::{self, CacheReadError, CacheWriteError};
use crate::ports::record::Port;

/// Conventional location of the external dependency overlay file.
pub const DEFAULT_DEPENDENCY_FILE: &str = "/var/lib/pkg/prt-get.deplist";

/// One overlay root: a directory of ports plus an optional whitelist of
/// port names to take from it.
pub type OverlayRoot = (PathBuf, Option<String>);

/// A port shadowed by an earlier overlay root with the same name.
#[derive(Debug)]
pub struct ShadowedPort {
    /// The losing record from the later root.
    pub shadowed: Port,
}

/// The aggregated ports tree.
#[derive(Debug, Default)]
pub struct Repository {
    /// Primary map, one record per name.
    packages: BTreeMap<String, Port>,
    /// Losing duplicates by name, kept only when duplicate tracking is on.
    shadowed: BTreeMap<String, ShadowedPort>,
    /// Whether name patterns are regexes instead of shell wildcards.
    use_regex: bool,
}

impl Repository {
    /// Create an empty repository. `use_regex` selects regex name patterns
    /// over shell wildcards for every subsequent search.
    #[must_use]
    pub fn new(use_regex: bool) -> Self {
        Self {
            use_regex,
            ..Self::default()
        }
    }

    /// What: Populate the repository by scanning overlay roots.
    ///
    /// Inputs:
    /// - `roots`: Ordered `(path, optional whitelist)` pairs; earlier roots
    ///   win name collisions. The whitelist is a comma or whitespace
    ///   separated set of port names to take from that root.
    /// - `track_shadowed`: Whether losing duplicates are recorded for
    ///   later inspection instead of silently dropped.
    ///
    /// Details:
    /// - Only immediate subdirectories containing a `Pkgfile` count as
    ///   ports; everything else is skipped.
    /// - A root path that was already scanned without a whitelist is not
    ///   scanned again.
    /// - Unreadable roots are logged and skipped.
    pub fn init_from_overlays(&mut self, roots: &[OverlayRoot], track_shadowed: bool) {
        let mut already_checked: HashSet<PathBuf> = HashSet::new();

        for (path, whitelist) in roots {
            if already_checked.contains(path) {
                continue;
            }

            let filter = whitelist
                .as_deref()
                .map(str::trim)
                .filter(|list| !list.is_empty())
                .map(parse_whitelist);

            if filter.is_none() {
                already_checked.insert(path.clone());
            }

            let entries = match fs::read_dir(path) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!("Cannot scan ports directory {}: {}", path.display(), err);
                    continue;
                }
            };

            for entry in entries.flatten() {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if !path.join(&name).join("Pkgfile").is_file() {
                    // no Pkgfile, no port
                    continue;
                }
                if let Some(allowed) = &filter
                    && !allowed.contains(&name)
                {
                    continue;
                }

                let port = Port::header(name.clone(), path.clone());
                if self.packages.contains_key(&name) {
                    if track_shadowed {
                        self.shadowed.insert(name, ShadowedPort { shadowed: port });
                    }
                } else {
                    self.packages.insert(name, port);
                }
            }
        }
    }

    /// What: Populate the repository from a cache file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheReadError::Access`] when the file cannot be read and
    /// [`CacheReadError::Format`] when the leading version tag does not
    /// match the writer's.
    pub fn init_from_cache(&mut self, cache_file: &Path) -> std::result::Result<(), CacheReadError> {
        for port in cache::read_cache(cache_file)? {
            self.packages.insert(port.name().to_string(), port);
        }
        Ok(())
    }

    /// What: Write the repository to a cache file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheWriteError::Dir`] when the parent directory cannot be
    /// created and [`CacheWriteError::File`] when the file cannot be
    /// written. Writing forces a full metadata load of every port.
    pub fn write_cache(&self, cache_file: &Path) -> std::result::Result<(), CacheWriteError> {
        cache::write_cache(cache_file, self.packages.values())
    }

    /// What: Merge an external dependency overlay file.
    ///
    /// Inputs:
    /// - `overlay_file`: `name: deps` data file.
    ///
    /// Details:
    /// - An entry applies only when the named port exists and its own
    ///   dependency field is empty; everything else is ignored.
    /// - A missing overlay file is the normal state.
    pub fn apply_dependency_overlay(&self, overlay_file: &Path) {
        let Ok(overlay) = parse_data_file(overlay_file) else {
            return;
        };
        for (name, dependencies) in overlay {
            if let Some(port) = self.packages.get(&name)
                && port.dependencies().is_empty()
            {
                port.override_dependencies(dependencies);
            }
        }
    }

    /// Exact lookup by port name.
    #[must_use]
    pub fn get_port(&self, name: &str) -> Option<&Port> {
        self.packages.get(name)
    }

    /// Every port keyed by name, in name order.
    #[must_use]
    pub fn ports(&self) -> &BTreeMap<String, Port> {
        &self.packages
    }

    /// Losing duplicates with their winning records, in name order. Only
    /// populated when the overlay scan tracked duplicates.
    #[must_use]
    pub fn shadowed_ports(&self) -> Vec<(&Port, &Port)> {
        self.shadowed
            .iter()
            .filter_map(|(name, entry)| {
                self.packages
                    .get(name)
                    .map(|winner| (&entry.shadowed, winner))
            })
            .collect()
    }

    /// Whether name patterns are treated as regexes.
    #[must_use]
    pub const fn use_regex(&self) -> bool {
        self.use_regex
    }

    /// What: Find ports whose name matches a pattern.
    ///
    /// Inputs:
    /// - `pattern`: Shell wildcard, or regex when the repository was built
    ///   with `use_regex`. Both match case-insensitively.
    ///
    /// Output:
    /// - Matching ports in name order.
    ///
    /// # Errors
    ///
    /// Fails when the pattern itself does not parse.
    pub fn matching_ports(&self, pattern: &str) -> Result<Vec<&Port>> {
        let matcher = NameMatcher::build(pattern, self.use_regex)?;
        Ok(self
            .packages
            .values()
            .filter(|port| matcher.matches(port.name()))
            .collect())
    }

    /// What: Find ports whose name or (optionally) description matches.
    ///
    /// Inputs:
    /// - `pattern`: As for [`Repository::matching_ports`].
    /// - `search_descriptions`: Whether the description field is also
    ///   consulted. This forces a metadata load of every port, so it is
    ///   much slower on an uncached tree.
    ///
    /// # Errors
    ///
    /// Fails when the pattern itself does not parse.
    pub fn search_ports(&self, pattern: &str, search_descriptions: bool) -> Result<Vec<&Port>> {
        let matcher = NameMatcher::build(pattern, self.use_regex)?;
        Ok(self
            .packages
            .values()
            .filter(|port| {
                matcher.matches(port.name())
                    || (search_descriptions && matcher.matches(port.description()))
            })
            .collect())
    }
}

/// Compiled name pattern: shell wildcard or regex, both case-folded.
pub(crate) enum NameMatcher {
    /// Shell wildcard via `fnmatch`-style globbing.
    Wildcard(Pattern),
    /// Case-insensitive regular expression.
    Regex(regex::Regex),
}

impl NameMatcher {
    /// Compile `pattern` in the flavor selected by `use_regex`.
    pub(crate) fn build(pattern: &str, use_regex: bool) -> Result<Self> {
        if use_regex {
            let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
            Ok(Self::Regex(re))
        } else {
            Ok(Self::Wildcard(Pattern::new(pattern)?))
        }
    }

    /// Whether `candidate` matches the pattern.
    pub(crate) fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Wildcard(pattern) => pattern.matches_with(
                candidate,
                MatchOptions {
                    case_sensitive: false,
                    ..MatchOptions::new()
                },
            ),
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

/// Parse a whitelist into the set of allowed port names.
fn parse_whitelist(list: &str) -> HashSet<String> {
    normalize_comma_list(&list.replace('\t', " "))
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
