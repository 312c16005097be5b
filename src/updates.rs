//! Planning of system-wide updates.
//!
//! The planner walks the installed database, skips locked packages, and
//! compares each installed `version-release` against the ports tree. Ports
//! that compare newer become update candidates; pairs the comparator cannot
//! order land in a dedicated undecidable list so the operator can decide
//! instead of the tool guessing. The candidate list is then brought into
//! dependency order before it feeds an install transaction.

use crate::config::Config;
use crate::db::InstalledDb;
use crate::locker::Locker;
use crate::ports::Repository;
use crate::transaction::{InstallTransaction, TransactionError};
use crate::version::{VersionCmp, compare_versions};

/// An installed package whose version difference cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UndecidableUpdate {
    /// Package name.
    pub name: String,
    /// The installed `version-release`.
    pub installed: String,
    /// The `version-release` offered by the ports tree.
    pub candidate: String,
}

/// Result of scanning the system for outdated packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdatePlan {
    /// Packages to update, in database order; not yet dependency-sorted.
    pub to_update: Vec<String>,
    /// Version differences the comparator refused to order.
    pub undecidable: Vec<UndecidableUpdate>,
    /// Installed packages skipped because they are locked.
    pub locked: Vec<String>,
}

impl UpdatePlan {
    /// Whether nothing needs updating.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.to_update.is_empty()
    }
}

/// What: Compare a port's version against the installed one under the
/// configured update policy.
///
/// Inputs:
/// - `candidate`: The tree's `version-release`.
/// - `installed`: The installed `version-release`.
/// - `prefer_higher`: Whether the real comparator decides the direction.
///
/// Output:
/// - With `prefer_higher`, the comparator's verdict, including
///   `Undefined`.
/// - Without it, any difference counts as an update (`Greater`), which is
///   the classic "the tree is authoritative" behavior.
#[must_use]
pub fn policy_compare(candidate: &str, installed: &str, prefer_higher: bool) -> VersionCmp {
    if candidate == installed {
        return VersionCmp::Equal;
    }
    if prefer_higher {
        return compare_versions(candidate, installed);
    }
    VersionCmp::Greater
}

/// What: Scan the installed database for packages the ports tree can
/// update.
///
/// Inputs:
/// - `repo`: The ports tree.
/// - `db`: The installed database.
/// - `locker`: Locked packages are skipped and recorded.
/// - `prefer_higher`: Update policy, see [`policy_compare`]. Callers
///   derive it from configuration and a strict-diff override.
///
/// Output:
/// - Returns the update plan. Installed packages absent from the tree are
///   not an error; they are simply not updatable.
#[must_use]
pub fn plan_system_update(
    repo: &Repository,
    db: &InstalledDb,
    locker: &Locker,
    prefer_higher: bool,
) -> UpdatePlan {
    let mut plan = UpdatePlan::default();

    for (name, installed_version) in db.installed_packages() {
        if locker.is_locked(name) {
            plan.locked.push(name.clone());
            continue;
        }
        let Some(port) = repo.get_port(name) else {
            continue;
        };

        let candidate = port.version_release();
        match policy_compare(&candidate, installed_version, prefer_higher) {
            VersionCmp::Greater => plan.to_update.push(name.clone()),
            VersionCmp::Undefined => plan.undecidable.push(UndecidableUpdate {
                name: name.clone(),
                installed: installed_version.clone(),
                candidate,
            }),
            VersionCmp::Less | VersionCmp::Equal => {}
        }
    }

    plan
}

/// What: Bring update candidates into dependency order.
///
/// Inputs:
/// - `names`: The candidate set, typically [`UpdatePlan::to_update`].
///
/// Output:
/// - Returns `names` reordered so dependencies come first; names outside
///   the candidate set stay out, even when the dependency closure pulled
///   them in.
///
/// # Errors
///
/// Propagates [`TransactionError::CyclicDependencies`] and
/// [`TransactionError::PackageNotFound`] from the expansion.
pub fn dependency_order(
    names: &[String],
    repo: &Repository,
    db: &InstalledDb,
    config: &Config,
) -> Result<Vec<String>, TransactionError> {
    let mut transaction = InstallTransaction::new(names.iter().cloned(), repo, db, config);
    let ordered = transaction.calc_dependencies()?;
    Ok(ordered
        .iter()
        .filter(|name| names.contains(*name))
        .cloned()
        .collect())
}
