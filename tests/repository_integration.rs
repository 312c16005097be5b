//! Integration tests for the ports tree model.
//!
//! These tests build real port trees in temporary directories and exercise
//! overlay composition, shadowing, searching, the cache round trip and the
//! external dependency overlay together.

use std::fs;
use std::path::Path;

use ports_toolkit::ports::{CacheReadError, Repository, cache_is_stale};

fn add_port(root: &Path, name: &str, version: &str, description: &str, deps: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("mkdir");
    let mut recipe = format!(
        "# Description: {description}\n\
         # URL: https://example.org/{name}\n\
         # Maintainer: Ports Team, ports@example.org\n"
    );
    if !deps.is_empty() {
        recipe.push_str(&format!("# Depends on: {deps}\n"));
    }
    recipe.push_str(&format!("\nname={name}\nversion={version}\nrelease=1\n"));
    fs::write(dir.join("Pkgfile"), recipe).expect("write");
}

/// Two overlay roots compose with first-wins semantics and the loser is
/// available through the shadow listing.
#[test]
fn test_overlay_composition_with_shadowing() {
    let core = tempfile::tempdir().expect("tempdir");
    let contrib = tempfile::tempdir().expect("tempdir");
    add_port(core.path(), "openssl", "3.1.4", "SSL toolkit", "zlib");
    add_port(core.path(), "zlib", "1.3", "compression library", "");
    add_port(contrib.path(), "openssl", "3.2.0", "SSL toolkit fork", "zlib");
    add_port(contrib.path(), "irssi", "1.4.5", "IRC client", "glib,openssl");

    let mut repo = Repository::new(false);
    repo.init_from_overlays(
        &[
            (core.path().to_path_buf(), None),
            (contrib.path().to_path_buf(), None),
        ],
        true,
    );

    assert_eq!(repo.ports().len(), 3);
    let openssl = repo.get_port("openssl").expect("openssl");
    assert_eq!(openssl.version(), "3.1.4");
    assert_eq!(openssl.path(), core.path());

    let shadowed = repo.shadowed_ports();
    assert_eq!(shadowed.len(), 1);
    let (loser, winner) = shadowed[0];
    assert_eq!(loser.name(), "openssl");
    assert_eq!(loser.path(), contrib.path());
    assert_eq!(winner.path(), core.path());
}

/// The cache round trip preserves the primary map, and a repository built
/// from the cache answers searches without the tree on disk.
#[test]
fn test_cache_round_trip_preserves_repository() {
    let root = tempfile::tempdir().expect("tempdir");
    add_port(root.path(), "gawk", "5.3.0", "GNU awk", "");
    add_port(root.path(), "grep", "3.11", "GNU grep", "pcre2");
    fs::write(root.path().join("grep").join("README"), "notes\n").expect("write");

    let mut original = Repository::new(false);
    original.init_from_overlays(&[(root.path().to_path_buf(), None)], false);

    let cache_dir = tempfile::tempdir().expect("tempdir");
    let cache_file = cache_dir.path().join("ports.cache");
    original.write_cache(&cache_file).expect("write cache");

    // wipe the tree to prove the cache is self-contained
    drop(root);

    let mut cached = Repository::new(false);
    cached.init_from_cache(&cache_file).expect("read cache");

    assert_eq!(cached.ports().len(), original.ports().len());
    for (name, port) in original.ports() {
        let copy = cached.get_port(name).expect("cached port");
        assert_eq!(copy.details(), port.details());
        assert_eq!(copy.path(), port.path());
    }

    let grep = cached.get_port("grep").expect("grep");
    assert_eq!(grep.version_release(), "3.11-1");
    assert!(grep.has_readme());
    assert_eq!(grep.dependencies(), "pcre2");

    let hits = cached.search_ports("*gnu*", true).expect("search");
    assert_eq!(hits.len(), 2);
}

/// A wrong version tag is a format error, not a silent misparse.
#[test]
fn test_cache_version_tag_guard() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_file = dir.path().join("ports.cache");
    fs::write(&cache_file, "V2\n").expect("write");

    let mut repo = Repository::new(false);
    assert!(matches!(
        repo.init_from_cache(&cache_file),
        Err(CacheReadError::Format { .. })
    ));

    assert!(matches!(
        repo.init_from_cache(Path::new("/nonexistent/cache")),
        Err(CacheReadError::Access(_))
    ));
}

/// A configuration file that changed after the cache was written marks the
/// cache stale.
#[test]
fn test_cache_staleness_against_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_file = dir.path().join("prt-get.conf");
    let cache_file = dir.path().join("ports.cache");

    fs::write(&config_file, "prtdir /usr/ports/core\n").expect("write");
    assert!(cache_is_stale(&cache_file, &config_file));

    fs::write(&cache_file, "V5\n").expect("write");
    assert!(!cache_is_stale(&cache_file, &config_file));
}

/// The dependency overlay supersedes empty dependency fields, also for a
/// repository built from the cache, and the merged value is written back
/// on the next cache write.
#[test]
fn test_dependency_overlay_with_cache() {
    let root = tempfile::tempdir().expect("tempdir");
    add_port(root.path(), "legacy", "1.0", "legacy port without deps header", "");
    add_port(root.path(), "modern", "1.0", "modern port", "zlib");

    let overlay = root.path().join("deplist");
    fs::write(&overlay, "legacy: glibc ncurses\nmodern: should-not-apply\n").expect("write");

    let mut repo = Repository::new(false);
    repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
    repo.apply_dependency_overlay(&overlay);

    assert_eq!(
        repo.get_port("legacy").expect("legacy").dependencies(),
        "glibc,ncurses"
    );
    assert_eq!(repo.get_port("modern").expect("modern").dependencies(), "zlib");

    // the merged dependencies survive the cache round trip
    let cache_file = root.path().join("ports.cache");
    repo.write_cache(&cache_file).expect("write cache");

    let mut cached = Repository::new(false);
    cached.init_from_cache(&cache_file).expect("read cache");
    assert_eq!(
        cached.get_port("legacy").expect("legacy").dependencies(),
        "glibc,ncurses"
    );
}

/// Whitelisted roots only contribute the listed ports.
#[test]
fn test_whitelisted_overlay_root() {
    let main = tempfile::tempdir().expect("tempdir");
    let extra = tempfile::tempdir().expect("tempdir");
    add_port(main.path(), "bash", "5.2", "shell", "");
    add_port(extra.path(), "qt5", "5.15", "toolkit", "");
    add_port(extra.path(), "kde", "5.27", "desktop", "qt5");
    add_port(extra.path(), "gnome", "45", "desktop", "");

    let mut repo = Repository::new(false);
    repo.init_from_overlays(
        &[
            (main.path().to_path_buf(), None),
            (extra.path().to_path_buf(), Some(" qt5, kde".to_string())),
        ],
        false,
    );

    assert_eq!(repo.ports().len(), 3);
    assert!(repo.get_port("gnome").is_none());
    assert!(repo.get_port("qt5").is_some());
}
