//! A single port and its lazily loaded metadata.
//!
//! A port is a directory holding a `Pkgfile` build recipe plus optional
//! `README`, `pre-install` and `post-install` files. Enumerating a ports
//! tree only needs the directory name, so a [`Port`] starts out as a header
//! (name and overlay root) and reads its `Pkgfile` at most once, on first
//! access to any metadata field.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use once_cell::sync::OnceCell;

use crate::datafile::normalize_comma_list;
use crate::util::{starts_with_nocase, value_before};

/// Metadata loaded from a port's `Pkgfile` and neighbor files.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortDetails {
    /// Upstream version, after shell macro expansion.
    pub version: String,
    /// Port release number.
    pub release: String,
    /// One-line description from the `# Description:` header.
    pub description: String,
    /// Comma-separated dependency names from the `# Depends on:` header.
    pub dependencies: String,
    /// Upstream URL.
    pub url: String,
    /// Packager header.
    pub packager: String,
    /// Maintainer header.
    pub maintainer: String,
    /// Whether the port ships a `README`.
    pub has_readme: bool,
    /// Whether the port ships a `pre-install` script.
    pub has_pre_install: bool,
    /// Whether the port ships a `post-install` script.
    pub has_post_install: bool,
}

/// One port in the ports tree.
///
/// Immutable after load; metadata access is `&self` and loads at most once,
/// also when readers run in parallel.
#[derive(Debug)]
pub struct Port {
    /// Directory name of the port, which is also its package name.
    name: String,
    /// Overlay root containing the port directory.
    path: PathBuf,
    /// Lazily loaded metadata.
    details: OnceCell<PortDetails>,
    /// Dependency string supplied by an external overlay file; wins only
    /// when the port's own dependency header is empty.
    dep_override: OnceCell<String>,
}

impl Port {
    /// Create a header-only port; metadata loads on first access.
    #[must_use]
    pub fn header(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            details: OnceCell::new(),
            dep_override: OnceCell::new(),
        }
    }

    /// Create a fully materialized port, typically from the cache file.
    #[must_use]
    pub fn materialized(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        details: PortDetails,
    ) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(details);
        Self {
            name: name.into(),
            path: path.into(),
            details: cell,
            dep_override: OnceCell::new(),
        }
    }

    /// The port's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The overlay root containing this port.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The port's own directory, `<path>/<name>`.
    #[must_use]
    pub fn port_dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    /// Upstream version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.details().version
    }

    /// Release number.
    #[must_use]
    pub fn release(&self) -> &str {
        &self.details().release
    }

    /// The `version-release` identity used by the installed database.
    #[must_use]
    pub fn version_release(&self) -> String {
        let details = self.details();
        format!("{}-{}", details.version, details.release)
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.details().description
    }

    /// Comma-separated dependency list. An external overlay entry replaces
    /// an empty `Pkgfile` header.
    #[must_use]
    pub fn dependencies(&self) -> &str {
        if let Some(overlay) = self.dep_override.get() {
            return overlay;
        }
        &self.details().dependencies
    }

    /// Upstream URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.details().url
    }

    /// Packager header.
    #[must_use]
    pub fn packager(&self) -> &str {
        &self.details().packager
    }

    /// Maintainer header.
    #[must_use]
    pub fn maintainer(&self) -> &str {
        &self.details().maintainer
    }

    /// Whether the port ships a `README`.
    #[must_use]
    pub fn has_readme(&self) -> bool {
        self.details().has_readme
    }

    /// Whether the port ships a `pre-install` script.
    #[must_use]
    pub fn has_pre_install(&self) -> bool {
        self.details().has_pre_install
    }

    /// Whether the port ships a `post-install` script.
    #[must_use]
    pub fn has_post_install(&self) -> bool {
        self.details().has_post_install
    }

    /// Snapshot of the loaded metadata, forcing the load.
    #[must_use]
    pub fn details(&self) -> &PortDetails {
        self.details.get_or_init(|| self.load_details())
    }

    /// Install the overlay dependency string. Only the first call takes
    /// effect; the repository applies the overlay once per build.
    pub(crate) fn override_dependencies(&self, dependencies: String) {
        let _ = self.dep_override.set(dependencies);
    }

    /// Read the `Pkgfile` and probe the neighbor files. A missing or
    /// unreadable recipe degrades to empty metadata; enumeration already
    /// checked the file existed, so this only happens on races or
    /// permission problems.
    fn load_details(&self) -> PortDetails {
        let recipe = self.port_dir().join("Pkgfile");
        let mut details = match fs::read_to_string(&recipe) {
            Ok(contents) => parse_pkgfile(&contents, &Local::now(), &kernel_release()),
            Err(err) => {
                tracing::debug!("Could not read {}: {}", recipe.display(), err);
                PortDetails::default()
            }
        };

        let dir = self.port_dir();
        details.has_readme = dir.join("README").exists();
        details.has_pre_install = dir.join("pre-install").exists();
        details.has_post_install = dir.join("post-install").exists();
        details
    }
}

/// What: Parse `Pkgfile` contents into port metadata.
///
/// Inputs:
/// - `contents`: The recipe text.
/// - `now`: Load time, used by `date` macro expansion.
/// - `kernel_release`: Current kernel release, used by `uname -r` expansion.
///
/// Output:
/// - Returns the metadata carried by the recipe; file-presence flags are
///   left unset for the caller.
///
/// Details:
/// - `version=` and `release=` assignments are read up to a `#` comment.
/// - The comment headers are matched case-insensitively on the prefixes
///   `desc`, `url`, `pack`, `maint` and `dep`.
/// - The dependency header is normalized to a plain comma list.
fn parse_pkgfile(contents: &str, now: &DateTime<Local>, kernel_release: &str) -> PortDetails {
    let mut details = PortDetails::default();

    for raw in contents.lines() {
        let line = raw.trim();

        if let Some(value) = line.strip_prefix("version=") {
            let value = value_before(value, '#').trim();
            details.version = expand_shell_commands(value, now, kernel_release);
        } else if let Some(value) = line.strip_prefix("release=") {
            details.release = value_before(value, '#').trim().to_string();
        } else if line.starts_with('#') {
            let header = line.trim_start_matches(['#', ' ', '\t']);
            let Some((_, value)) = header.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if starts_with_nocase(header, "desc") {
                details.description = value.to_string();
            } else if starts_with_nocase(header, "pack") {
                details.packager = value.to_string();
            } else if starts_with_nocase(header, "maint") {
                details.maintainer = value.to_string();
            } else if starts_with_nocase(header, "url") {
                details.url = value.to_string();
            } else if starts_with_nocase(header, "dep") {
                details.dependencies = normalize_comma_list(value);
            }
        }
    }

    details
}

/// What: Expand the two supported shell escapes inside a version value.
///
/// Inputs:
/// - `input`: Version value, possibly holding `` `...` `` or `$(...)`.
/// - `now`: Substituted into `date '+FMT'` / `date "+FMT"` escapes.
/// - `kernel_release`: Substituted for `uname -r` escapes.
///
/// Output:
/// - Returns the expanded string. Escapes other than the two supported
///   commands stay verbatim.
///
/// Details:
/// - One pass per tag set; nothing is rescanned, so unknown escapes cannot
///   loop the expansion.
fn expand_shell_commands(input: &str, now: &DateTime<Local>, kernel_release: &str) -> String {
    let mut result = input.to_string();

    for (start_tag, end_tag) in [("`", "`"), ("$(", ")")] {
        let uname_escape = format!("{start_tag}uname -r{end_tag}");
        result = result.replace(&uname_escape, kernel_release);

        let date_escape = format!("{start_tag}date");
        while let Some(pos) = result.find(&date_escape) {
            let search_from = pos + date_escape.len();
            let Some(end_rel) = result[search_from..].find(end_tag) else {
                break;
            };
            let end = search_from + end_rel;
            let Some(plus_rel) = result[search_from..end].find('+') else {
                break;
            };

            let mut format = result[search_from + plus_rel + 1..end].to_string();
            if format.ends_with('\'') || format.ends_with('"') {
                format.pop();
            }

            let Some(stamp) = strftime(now, &format) else {
                break;
            };
            result = format!("{}{}{}", &result[..pos], stamp, &result[end + end_tag.len()..]);
        }
    }

    result
}

/// Render `now` with a strftime format, or `None` when the format itself
/// does not parse.
fn strftime(now: &DateTime<Local>, format: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(*item, Item::Error)) {
        return None;
    }
    Some(now.format_with_items(items.into_iter()).to_string())
}

/// Current kernel release string, as `uname -r` would print it.
fn kernel_release() -> String {
    rustix::system::uname()
        .release()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).single().expect("valid time")
    }

    #[test]
    fn test_parse_pkgfile_fields() {
        let recipe = "\
# Description: Fast ogg encoder\n\
# URL:         https://example.org/enc\n\
# Maintainer:  Jane Doe, jane@example.org\n\
# Packager:    John Doe, john@example.org\n\
# Depends on:  libogg libvorbis\n\
\n\
name=encoder\n\
version=1.4.2 # trailing comment\n\
release=3\n";
        let details = parse_pkgfile(recipe, &sample_time(), "6.6.1");

        assert_eq!(details.version, "1.4.2");
        assert_eq!(details.release, "3");
        assert_eq!(details.description, "Fast ogg encoder");
        assert_eq!(details.url, "https://example.org/enc");
        assert_eq!(details.maintainer, "Jane Doe, jane@example.org");
        assert_eq!(details.packager, "John Doe, john@example.org");
        assert_eq!(details.dependencies, "libogg,libvorbis");
    }

    #[test]
    fn test_expand_uname() {
        let now = sample_time();
        assert_eq!(expand_shell_commands("`uname -r`", &now, "6.6.1"), "6.6.1");
        assert_eq!(
            expand_shell_commands("nvidia-$(uname -r)", &now, "6.6.1"),
            "nvidia-6.6.1"
        );
    }

    #[test]
    fn test_expand_date() {
        let now = sample_time();
        assert_eq!(
            expand_shell_commands("`date '+%Y%m%d'`", &now, "6.6.1"),
            "20240309"
        );
        assert_eq!(
            expand_shell_commands("snapshot-$(date \"+%Y.%m\")", &now, "6.6.1"),
            "snapshot-2024.03"
        );
    }

    #[test]
    fn test_unknown_escapes_stay_verbatim() {
        let now = sample_time();
        assert_eq!(
            expand_shell_commands("`git describe`", &now, "6.6.1"),
            "`git describe`"
        );
        assert_eq!(
            expand_shell_commands("$(hostname)", &now, "6.6.1"),
            "$(hostname)"
        );
    }

    #[test]
    fn test_lazy_load_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let port_dir = dir.path().join("mytool");
        fs::create_dir(&port_dir).expect("mkdir");
        fs::write(
            port_dir.join("Pkgfile"),
            "# Description: Tooling\nversion=2.0\nrelease=1\n",
        )
        .expect("write");
        fs::write(port_dir.join("README"), "read me\n").expect("write");
        fs::write(port_dir.join("post-install"), "#!/bin/sh\n").expect("write");

        let port = Port::header("mytool", dir.path());
        assert_eq!(port.version(), "2.0");
        assert_eq!(port.version_release(), "2.0-1");
        assert!(port.has_readme());
        assert!(!port.has_pre_install());
        assert!(port.has_post_install());
    }

    #[test]
    fn test_missing_recipe_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let port = Port::header("ghost", dir.path());
        assert_eq!(port.version(), "");
        assert_eq!(port.dependencies(), "");
        assert!(!port.has_readme());
    }

    #[test]
    fn test_dependency_override() {
        let port = Port::materialized("tool", "/usr/ports/core", PortDetails::default());
        port.override_dependencies("zlib,openssl".to_string());
        assert_eq!(port.dependencies(), "zlib,openssl");
    }

    #[test]
    fn test_materialized_ports_never_touch_disk() {
        let details = PortDetails {
            version: "1.0".into(),
            release: "2".into(),
            description: "cached".into(),
            ..PortDetails::default()
        };
        let port = Port::materialized("cached-tool", "/nonexistent/ports", details);
        assert_eq!(port.version_release(), "1.0-2");
        assert_eq!(port.description(), "cached");
    }
}
