//! Transactional installation of a group of ports.
//!
//! An [`InstallTransaction`] takes a list of requested names, resolves them
//! against the [`Repository`], optionally expands their dependency closure
//! into a buildable order, and then drives the external builder and
//! installer for each package in turn. Results land in disjoint buckets:
//! installed, already installed, ignored, missing (with the port that
//! required them) and failed. Resource problems (log directory, log lock,
//! package output directory) abort the whole transaction; ordinary build
//! or install failures only do so in group mode.
//!
//! # Examples
//!
//! ```no_run
//! use ports_toolkit::config::Config;
//! use ports_toolkit::db::InstalledDb;
//! use ports_toolkit::ports::Repository;
//! use ports_toolkit::transaction::{InstallOptions, InstallTransaction};
//!
//! let config = Config::default();
//! let repo = Repository::new(false);
//! let db = InstalledDb::new(None);
//!
//! let mut transaction = InstallTransaction::new(["htop"], &repo, &db, &config);
//! match transaction.install(&InstallOptions::default(), false, false) {
//!     Ok(()) => println!("installed: {}", transaction.installed_packages().len()),
//!     Err(err) => eprintln!("transaction failed: {err}"),
//! }
//! ```

mod log;
pub mod pkgmk;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Config;
use crate::db::InstalledDb;
use crate::ports::{Port, Repository};
use crate::process::{self, EXEC_FAILURE};
use crate::resolver::DepResolver;
use crate::transaction::log::BuildLog;

/// Default build command of the wrapped tool chain.
pub const PKGMK_DEFAULT_COMMAND: &str = "/usr/bin/pkgmk";
/// Default install command of the wrapped tool chain.
pub const PKGADD_DEFAULT_COMMAND: &str = "/usr/bin/pkgadd";
/// Default remove command of the wrapped tool chain.
pub const PKGRM_DEFAULT_COMMAND: &str = "/usr/bin/pkgrm";

/// Why an install transaction stopped.
///
/// Log and package-directory problems are always fatal to the transaction;
/// build and install failures are fatal only in group mode and otherwise
/// accumulate in the failed bucket.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    /// The transaction was started without any package.
    #[error("no package specified")]
    NoPackageGiven,

    /// A requested package does not exist in the ports tree.
    #[error("package(s) not found")]
    PackageNotFound,

    /// The build command could not be spawned.
    #[error("couldn't execute the build command")]
    BuildExecError,

    /// The build command ran and reported failure.
    #[error("error while building")]
    BuildFailed,

    /// The install command could not be spawned.
    #[error("couldn't execute the install command")]
    InstallExecError,

    /// The install command ran and reported failure.
    #[error("error while installing")]
    InstallFailed,

    /// The package output directory cannot be entered.
    #[error("error changing into the package output directory")]
    PackageDirError,

    /// The dependency graph contains a cycle.
    #[error("cyclic dependencies found")]
    CyclicDependencies,

    /// The log directory cannot be created.
    #[error("can't create log file directory")]
    LogDirFailure,

    /// The log file cannot be opened.
    #[error("can't create log file")]
    LogFileFailure,

    /// Logging is enabled but no log file pattern is configured.
    #[error("no log file specified, but logging enabled")]
    NoLogFile,

    /// The log file's lock sidecar exists or cannot be created.
    #[error("can't create lock file for the log file")]
    CantLockLogFile,
}

impl TransactionError {
    /// Whether this error always ends the transaction, regardless of group
    /// mode.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::LogDirFailure
                | Self::LogFileFailure
                | Self::NoLogFile
                | Self::CantLockLogFile
                | Self::PackageDirError
        )
    }
}

/// Outcome of one install hook script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum HookState {
    /// The hook was not requested or does not exist.
    #[default]
    NotRun,
    /// The hook ran and succeeded.
    Ok,
    /// The hook ran and failed.
    Failed,
}

/// Per-package information accumulated during an install.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstallInfo {
    /// Whether the port ships a README worth showing afterwards.
    pub has_readme: bool,
    /// Outcome of the pre-install hook.
    pub pre_install: HookState,
    /// Outcome of the post-install hook.
    pub post_install: HookState,
}

impl InstallInfo {
    /// Fresh info for a port, with no hooks run yet.
    #[must_use]
    pub const fn new(has_readme: bool) -> Self {
        Self {
            has_readme,
            pre_install: HookState::NotRun,
            post_install: HookState::NotRun,
        }
    }
}

/// Caller-supplied knobs for one transaction, the contract between the
/// argument-parsing front-end and this core.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Front-end name used in announcements and log headers.
    pub label: String,
    /// Names to skip, recorded in the ignored bucket.
    pub ignore: Vec<String>,
    /// Dry run: account packages as installed without running anything.
    pub test: bool,
    /// Verbosity of announcements; above zero prints full command lines.
    pub verbose: u8,
    /// Extra arguments appended to the builder's `-d`.
    pub pkgmk_args: String,
    /// Extra arguments for the installer.
    pub pkgadd_args: String,
    /// Alternative installation root passed as `-r`; empty means none.
    pub install_root: String,
    /// Run a pre-install script even when scripts are off by config.
    pub exec_pre_install: bool,
    /// Run a post-install script even when scripts are off by config.
    pub exec_post_install: bool,
    /// Guard each build log with a `<log>.lock` sidecar.
    pub log_locking: bool,
    /// Files probed for builder settings; empty means the system default
    /// of `/etc/pkgmk.conf` followed by the builder script.
    pub pkgmk_probe_files: Vec<PathBuf>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            label: "ports-toolkit".to_string(),
            ignore: Vec::new(),
            test: false,
            verbose: 0,
            pkgmk_args: String::new(),
            pkgadd_args: String::new(),
            install_root: String::new(),
            exec_pre_install: false,
            exec_post_install: false,
            log_locking: false,
            pkgmk_probe_files: Vec::new(),
        }
    }
}

impl InstallOptions {
    /// The builder-settings probe list, falling back to the system default.
    fn probe_files(&self) -> Vec<PathBuf> {
        if self.pkgmk_probe_files.is_empty() {
            pkgmk::default_probe_files()
        } else {
            self.pkgmk_probe_files.clone()
        }
    }
}

/// A transactional install of one or more ports.
#[derive(Debug)]
pub struct InstallTransaction<'a> {
    /// The ports tree used for lookups.
    repo: &'a Repository,
    /// Snapshot of the installed database.
    db: &'a InstalledDb,
    /// Front-end configuration.
    config: &'a Config,
    /// Requested names with their resolved ports, in request order.
    packages: Vec<(String, Option<&'a Port>)>,

    /// Whether the dependency closure has been expanded already.
    dep_calced: bool,
    /// Vertex index to package name for the resolver.
    dep_list: Vec<String>,
    /// Dependency-ordered names, filled by the expansion.
    dep_name_list: Vec<String>,
    /// Edge collector for the expansion.
    resolver: DepResolver,

    /// Successfully installed packages.
    installed: Vec<(String, InstallInfo)>,
    /// Packages that were already installed before this run.
    already_installed: Vec<String>,
    /// Packages skipped because the caller asked to ignore them.
    ignored: Vec<String>,
    /// Names not found in the tree, with the port that required them when
    /// the miss came from dependency expansion.
    missing: Vec<(String, Option<String>)>,
    /// Packages whose build or install failed.
    failed: Vec<(String, InstallInfo)>,
}

impl<'a> InstallTransaction<'a> {
    /// Create a transaction for `names`, resolving each against the
    /// repository up front. Unresolved names stay in the queue and are
    /// accounted as missing when the transaction runs.
    pub fn new<I, S>(
        names: I,
        repo: &'a Repository,
        db: &'a InstalledDb,
        config: &'a Config,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let packages = names
            .into_iter()
            .map(Into::into)
            .map(|name| {
                let port = repo.get_port(&name);
                (name, port)
            })
            .collect();

        Self {
            repo,
            db,
            config,
            packages,
            dep_calced: false,
            dep_list: Vec::new(),
            dep_name_list: Vec::new(),
            resolver: DepResolver::new(),
            installed: Vec::new(),
            already_installed: Vec::new(),
            ignored: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// What: Expand the dependency closure and compute the install order.
    ///
    /// Output:
    /// - Returns the dependency-ordered names (dependencies first,
    ///   including the requested packages themselves).
    ///
    /// Details:
    /// - Each port is walked at most once; dependency tokens keep only the
    ///   last `group/` segment for lookup.
    /// - Dependencies absent from the tree land in the missing bucket
    ///   together with the port that required them, and the walk continues
    ///   through the present branches.
    ///
    /// # Errors
    ///
    /// [`TransactionError::NoPackageGiven`] for an empty request,
    /// [`TransactionError::PackageNotFound`] when no requested name
    /// resolved at all, [`TransactionError::CyclicDependencies`] when the
    /// closure has a cycle.
    pub fn calc_dependencies(&mut self) -> Result<&[String], TransactionError> {
        if self.packages.is_empty() {
            return Err(TransactionError::NoPackageGiven);
        }

        let mut any_resolved = false;
        for (name, port) in &self.packages {
            if port.is_some() {
                any_resolved = true;
            } else {
                self.missing.push((name.clone(), None));
            }
        }
        if !any_resolved {
            return Err(TransactionError::PackageNotFound);
        }

        if self.expand_dependencies() {
            Ok(&self.dep_name_list)
        } else {
            Err(TransactionError::CyclicDependencies)
        }
    }

    /// The dependency-ordered names computed by
    /// [`InstallTransaction::calc_dependencies`].
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dep_name_list
    }

    /// What: Run the transaction: build and install every queued package.
    ///
    /// Inputs:
    /// - `options`: Caller-supplied flags and tool arguments.
    /// - `update`: Whether installed packages are updated instead of
    ///   skipped; passed to the installer as `-u`.
    /// - `group`: Whether the first failure ends the transaction.
    ///
    /// Output:
    /// - `Ok(())` when the queue was processed; individual failures are in
    ///   the buckets. An error ends the transaction early.
    ///
    /// Details:
    /// - Per package: ignore-list check, repository check, installed check
    ///   (aliases count), then pre-install hook, builder, installer and
    ///   post-install hook with a shared build log.
    /// - In test mode packages are accounted as installed without running
    ///   anything.
    ///
    /// # Errors
    ///
    /// Fatal resource errors always; [`TransactionError::PackageNotFound`]
    /// and build or install failures only in group mode.
    pub fn install(
        &mut self,
        options: &InstallOptions,
        update: bool,
        group: bool,
    ) -> Result<(), TransactionError> {
        if self.packages.is_empty() {
            return Err(TransactionError::NoPackageGiven);
        }

        let queue = self.packages.clone();
        for (requested, port) in queue {
            if options.ignore.iter().any(|ignored| *ignored == requested) {
                self.ignored.push(requested);
                continue;
            }

            let Some(port) = port else {
                self.missing.push((requested, None));
                if group {
                    return Err(TransactionError::PackageNotFound);
                }
                continue;
            };

            // virtual provides satisfy the installed check
            if !update && self.db.is_installed(port.name(), true) {
                self.already_installed.push(port.name().to_string());
                continue;
            }

            let mut info = InstallInfo::new(port.has_readme());
            let result = if options.test {
                Ok(())
            } else {
                self.install_package(port, options, update, &mut info)
            };

            match result {
                Ok(()) => self.installed.push((port.name().to_string(), info)),
                Err(err) => {
                    if err.is_fatal() {
                        return Err(err);
                    }
                    self.failed.push((port.name().to_string(), info));
                    if group {
                        return Err(err);
                    }
                }
            }
        }

        Ok(())
    }

    /// Successfully installed packages with their hook outcomes.
    #[must_use]
    pub fn installed_packages(&self) -> &[(String, InstallInfo)] {
        &self.installed
    }

    /// Packages that were already installed before this run.
    #[must_use]
    pub fn already_installed_packages(&self) -> &[String] {
        &self.already_installed
    }

    /// Packages skipped on the caller's request.
    #[must_use]
    pub fn ignored_packages(&self) -> &[String] {
        &self.ignored
    }

    /// Names not found in the ports tree; the second element is the port
    /// that required the name, when the miss came from dependency
    /// expansion.
    #[must_use]
    pub fn missing_packages(&self) -> &[(String, Option<String>)] {
        &self.missing
    }

    /// Packages whose build or install failed, with their hook outcomes.
    #[must_use]
    pub fn failed_packages(&self) -> &[(String, InstallInfo)] {
        &self.failed
    }

    /// Walk the queue and feed the resolver. `true` on success, `false`
    /// on a cycle.
    fn expand_dependencies(&mut self) -> bool {
        if self.dep_calced {
            return true;
        }
        self.dep_calced = true;

        for index in 0..self.packages.len() {
            if let Some(port) = self.packages[index].1 {
                self.walk_port(port, None);
            }
        }

        match self.resolver.resolve() {
            Ok(order) => {
                self.dep_name_list = order
                    .into_iter()
                    .map(|vertex| self.dep_list[vertex].clone())
                    .collect();
                true
            }
            Err(_) => {
                self.dep_calced = false;
                false
            }
        }
    }

    /// Recursive dependency walk. Every visited port gets a vertex; edges
    /// run from the requiring port to its dependency, and roots register
    /// with a self-edge.
    fn walk_port(&mut self, port: &'a Port, required_by: Option<usize>) {
        let repo = self.repo;

        let (index, first_visit) =
            match self.dep_list.iter().position(|name| name == port.name()) {
                Some(index) => (index, false),
                None => {
                    self.dep_list.push(port.name().to_string());
                    (self.dep_list.len() - 1, true)
                }
            };

        match required_by {
            Some(parent) => self.resolver.add_dependency(parent, index),
            // registers the vertex without a real predecessor
            None => self.resolver.add_dependency(index, index),
        }

        if !first_visit {
            return;
        }

        let dependencies = port.dependencies();
        if dependencies.is_empty() {
            return;
        }
        for dependency in dependencies.split(',') {
            if dependency.is_empty() {
                continue;
            }
            let name = strip_group_prefix(dependency);
            match repo.get_port(name) {
                Some(dep_port) => self.walk_port(dep_port, Some(index)),
                None => self
                    .missing
                    .push((name.to_string(), Some(port.name().to_string()))),
            }
        }
    }

    /// Drive one package through announce, log, hooks, build and install.
    fn install_package(
        &self,
        port: &'a Port,
        options: &InstallOptions,
        update: bool,
        info: &mut InstallInfo,
    ) -> Result<(), TransactionError> {
        let label = &options.label;
        let action = if update { "updating" } else { "installing" };
        let announce = format!("{label}: {action} {}", port.port_dir().display());
        println!("{announce}");

        let mut build_log = if self.config.write_log {
            let mut log = BuildLog::open(self.config, port, options.log_locking)?;
            log.write_line(&announce);
            log.write_timestamped(label, "starting build");
            Some(log)
        } else {
            None
        };

        let port_dir = port.port_dir();
        if let Err(err) = std::env::set_current_dir(&port_dir) {
            tracing::warn!("Cannot change into {}: {}", port_dir.display(), err);
        }

        let result = self.build_and_install(port, options, update, info, build_log.as_mut());

        if let Some(log) = build_log {
            let remove =
                self.config.remove_log_on_success && !self.config.append_log && result.is_ok();
            log.close(remove);
        }
        result
    }

    /// The build half of a package step: hooks, builder, output directory,
    /// installer.
    fn build_and_install(
        &self,
        port: &'a Port,
        options: &InstallOptions,
        update: bool,
        info: &mut InstallInfo,
        mut log: Option<&mut BuildLog>,
    ) -> Result<(), TransactionError> {
        let label = &options.label;
        let config = self.config;
        let port_dir = port.port_dir();

        let runscript = if config.runscript_command.is_empty() {
            "sh"
        } else {
            &config.runscript_command
        };

        let pre_script = port_dir.join("pre-install");
        if (options.exec_pre_install || config.run_scripts) && pre_script.is_file() {
            let status = process::run_shell(
                &format!("{runscript} {}", pre_script.display()),
                log.as_deref().map(BuildLog::file),
            );
            info.pre_install = if status == 0 {
                HookState::Ok
            } else {
                HookState::Failed
            };
        }

        let make_command = if config.make_command.is_empty() {
            PKGMK_DEFAULT_COMMAND
        } else {
            &config.make_command
        };
        let status = process::run_shell(
            &format!("{make_command} -d {}", options.pkgmk_args),
            log.as_deref().map(BuildLog::file),
        );
        if status == EXEC_FAILURE {
            return Err(TransactionError::BuildExecError);
        }
        if status != 0 {
            return Err(TransactionError::BuildFailed);
        }

        let probe_files = options.probe_files();
        let package_dir = pkgmk::package_dir(&probe_files);
        let mut install_dir = port_dir.clone();
        if !package_dir.is_empty() {
            install_dir = PathBuf::from(&package_dir);
            let message = format!("{label}: using package directory {package_dir}");
            if options.verbose > 0 {
                println!("{message}");
            }
            if let Some(log) = log.as_mut() {
                log.write_line(&message);
            }
        }
        if std::env::set_current_dir(&install_dir).is_err() {
            return Err(TransactionError::PackageDirError);
        }

        let add_command = if config.add_command.is_empty() {
            PKGADD_DEFAULT_COMMAND
        } else {
            &config.add_command
        };
        let mut add_args = String::new();
        if !options.install_root.is_empty() {
            add_args.push_str(&format!("-r {} ", options.install_root));
        }
        if update {
            add_args.push_str("-u ");
        }
        if !options.pkgadd_args.is_empty() {
            add_args.push_str(&options.pkgadd_args);
            add_args.push(' ');
        }
        add_args.push_str(&format!(
            "{}#{}.pkg.tar.{}",
            port.name(),
            port.version_release(),
            pkgmk::compression_mode(&probe_files)
        ));

        let full_command = format!("{label}: {add_command} {add_args}");
        let summary = if update {
            let to = port.version_release();
            let from = self.db.version_of(port.name()).unwrap_or_default();
            if from == to {
                format!("{label}: reinstalling {} {to}", port.name())
            } else {
                format!("{label}: updating {} from {from} to {to}", port.name())
            }
        } else {
            format!("{label}: installing {} {}", port.name(), port.version_release())
        };

        println!("{summary}");
        if options.verbose > 0 {
            println!("{full_command}");
        }
        if let Some(log) = log.as_mut() {
            log.write_line(&summary);
            log.write_line(&full_command);
            log.write_timestamped(label, "build done");
        }

        let status = process::run_shell(
            &format!("{add_command} {add_args}"),
            log.as_deref().map(BuildLog::file),
        );
        if status == EXEC_FAILURE {
            return Err(TransactionError::InstallExecError);
        }
        if status != 0 {
            return Err(TransactionError::InstallFailed);
        }

        let post_script = port_dir.join("post-install");
        if (options.exec_post_install || config.run_scripts) && post_script.is_file() {
            let status = process::run_shell(
                &format!("{runscript} {}", post_script.display()),
                log.as_deref().map(BuildLog::file),
            );
            info.post_install = if status == 0 {
                HookState::Ok
            } else {
                HookState::Failed
            };
        }

        Ok(())
    }
}

/// Keep only the last segment of a `group/name` dependency token.
fn strip_group_prefix(token: &str) -> &str {
    match token.rfind('/') {
        Some(pos) if pos + 1 < token.len() => &token[pos + 1..],
        _ => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn add_port(root: &Path, name: &str, deps: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("mkdir");
        let mut recipe = String::from("version=1.0\nrelease=1\n");
        if !deps.is_empty() {
            recipe = format!("# Depends on: {deps}\n{recipe}");
        }
        fs::write(dir.join("Pkgfile"), recipe).expect("write");
    }

    fn empty_db(dir: &Path) -> InstalledDb {
        InstalledDb::with_paths(dir.join("db"), dir.join("aliases"))
    }

    #[test]
    fn test_strip_group_prefix() {
        assert_eq!(strip_group_prefix("xorg/xorg-server"), "xorg-server");
        assert_eq!(strip_group_prefix("plain"), "plain");
        assert_eq!(strip_group_prefix("trailing/"), "trailing/");
    }

    #[test]
    fn test_dependency_expansion_orders_dependencies_first() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "app", "libfoo, libbar");
        add_port(root.path(), "libfoo", "libbar");
        add_port(root.path(), "libbar", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction = InstallTransaction::new(["app"], &repo, &db, &config);
        let order = transaction.calc_dependencies().expect("resolve").to_vec();
        assert_eq!(order, ["libbar", "libfoo", "app"]);
    }

    #[test]
    fn test_missing_dependency_is_recorded_with_requirer() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "app", "nonexistent, libok");
        add_port(root.path(), "libok", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction = InstallTransaction::new(["app"], &repo, &db, &config);
        let order = transaction.calc_dependencies().expect("resolve").to_vec();
        assert_eq!(order, ["libok", "app"]);
        assert_eq!(
            transaction.missing_packages(),
            [("nonexistent".to_string(), Some("app".to_string()))]
        );
    }

    #[test]
    fn test_group_prefix_is_stripped_for_lookup() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "app", "xorg/xorg-server");
        add_port(root.path(), "xorg-server", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction = InstallTransaction::new(["app"], &repo, &db, &config);
        let order = transaction.calc_dependencies().expect("resolve").to_vec();
        assert_eq!(order, ["xorg-server", "app"]);
    }

    #[test]
    fn test_cyclic_dependencies_are_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "ouro", "boros");
        add_port(root.path(), "boros", "ouro");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction = InstallTransaction::new(["ouro"], &repo, &db, &config);
        assert_eq!(
            transaction.calc_dependencies().err(),
            Some(TransactionError::CyclicDependencies)
        );
    }

    #[test]
    fn test_shared_dependency_is_walked_once() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "a", "common");
        add_port(root.path(), "b", "common");
        add_port(root.path(), "common", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction = InstallTransaction::new(["a", "b"], &repo, &db, &config);
        let order = transaction.calc_dependencies().expect("resolve").to_vec();
        assert_eq!(order, ["common", "a", "b"]);
    }

    #[test]
    fn test_calc_dependencies_empty_and_all_missing() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let mut transaction =
            InstallTransaction::new(Vec::<String>::new(), &repo, &db, &config);
        assert_eq!(
            transaction.calc_dependencies().err(),
            Some(TransactionError::NoPackageGiven)
        );

        let mut transaction = InstallTransaction::new(["ghost"], &repo, &db, &config);
        assert_eq!(
            transaction.calc_dependencies().err(),
            Some(TransactionError::PackageNotFound)
        );
        assert_eq!(
            transaction.missing_packages(),
            [("ghost".to_string(), None)]
        );
    }

    #[test]
    fn test_dry_run_accounts_packages_as_installed() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "tool", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let options = InstallOptions {
            test: true,
            ..InstallOptions::default()
        };
        let mut transaction = InstallTransaction::new(["tool"], &repo, &db, &config);
        transaction.install(&options, false, false).expect("install");

        assert_eq!(transaction.installed_packages().len(), 1);
        assert_eq!(transaction.installed_packages()[0].0, "tool");
    }

    #[test]
    fn test_ignored_and_already_installed_buckets() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "wanted", "");
        add_port(root.path(), "unwanted", "");
        add_port(root.path(), "present", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        fs::write(root.path().join("db"), "present\n1.0-1\nusr/bin/present\n")
            .expect("write");
        let db = empty_db(root.path());
        let config = Config::default();

        let options = InstallOptions {
            test: true,
            ignore: vec!["unwanted".to_string()],
            ..InstallOptions::default()
        };
        let mut transaction =
            InstallTransaction::new(["wanted", "unwanted", "present", "ghost"], &repo, &db, &config);
        transaction.install(&options, false, false).expect("install");

        assert_eq!(transaction.installed_packages().len(), 1);
        assert_eq!(transaction.ignored_packages(), ["unwanted"]);
        assert_eq!(transaction.already_installed_packages(), ["present"]);
        assert_eq!(
            transaction.missing_packages(),
            [("ghost".to_string(), None)]
        );
    }

    #[test]
    fn test_group_mode_stops_on_missing_package() {
        let root = tempfile::tempdir().expect("tempdir");
        add_port(root.path(), "real", "");

        let mut repo = Repository::new(false);
        repo.init_from_overlays(&[(root.path().to_path_buf(), None)], false);
        let db = empty_db(root.path());
        let config = Config::default();

        let options = InstallOptions {
            test: true,
            ..InstallOptions::default()
        };
        let mut transaction =
            InstallTransaction::new(["ghost", "real"], &repo, &db, &config);
        assert_eq!(
            transaction.install(&options, false, true).err(),
            Some(TransactionError::PackageNotFound)
        );
        // the miss is accounted, the rest of the queue never ran
        assert_eq!(transaction.missing_packages().len(), 1);
        assert!(transaction.installed_packages().is_empty());
    }
}
