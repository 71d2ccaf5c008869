use reqpin_schema::{normalize_name, LockFile, LockedPackage, Resolution};
use serde::Serialize;
use std::collections::BTreeMap;

/// A package present on both sides whose pin differs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageChange {
    pub name: String,
    pub old: LockedPackage,
    pub new: LockedPackage,
}

/// Differences between two pin sets.
///
/// `renamed` holds packages whose pin is unchanged but whose name is spelled
/// differently (`Jinja2` -> `jinja2`). Only normalized comparison produces it.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DriftReport {
    pub added: Vec<LockedPackage>,
    pub removed: Vec<LockedPackage>,
    pub changed: Vec<PackageChange>,
    pub renamed: Vec<PackageChange>,
    pub has_drift: bool,
}

impl DriftReport {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} added, {} removed, {} changed",
            self.added.len(),
            self.removed.len(),
            self.changed.len()
        );
        if !self.renamed.is_empty() {
            summary.push_str(&format!(", {} respelled", self.renamed.len()));
        }
        summary
    }
}

/// Compare two package lists. With `normalize` set, names are matched by their
/// normalized form.
pub fn diff_packages(old: &[LockedPackage], new: &[LockedPackage], normalize: bool) -> DriftReport {
    let key = |name: &str| {
        if normalize {
            normalize_name(name)
        } else {
            name.to_owned()
        }
    };
    let old_map: BTreeMap<String, &LockedPackage> = old.iter().map(|p| (key(&p.name), p)).collect();
    let new_map: BTreeMap<String, &LockedPackage> = new.iter().map(|p| (key(&p.name), p)).collect();

    let mut report = DriftReport::default();
    for (k, new_pkg) in &new_map {
        match old_map.get(k) {
            None => report.added.push((*new_pkg).clone()),
            Some(old_pkg) if old_pkg.version != new_pkg.version || old_pkg.extras != new_pkg.extras => {
                report.changed.push(PackageChange {
                    name: new_pkg.name.clone(),
                    old: (*old_pkg).clone(),
                    new: (*new_pkg).clone(),
                });
            }
            Some(old_pkg) if old_pkg.name != new_pkg.name => {
                report.renamed.push(PackageChange {
                    name: new_pkg.name.clone(),
                    old: (*old_pkg).clone(),
                    new: (*new_pkg).clone(),
                });
            }
            Some(_) => {}
        }
    }
    for (k, old_pkg) in &old_map {
        if !new_map.contains_key(k) {
            report.removed.push((*old_pkg).clone());
        }
    }

    report.has_drift = !report.added.is_empty()
        || !report.removed.is_empty()
        || !report.changed.is_empty()
        || !report.renamed.is_empty();
    report
}

pub fn diff_resolutions(old: &Resolution, new: &Resolution) -> DriftReport {
    diff_packages(
        &LockFile::from_resolution(old).packages,
        &LockFile::from_resolution(new).packages,
        new.normalizes_names(),
    )
}

/// Compare a lock file against a fresh resolution of its manifest.
pub fn diff_lock(lock: &LockFile, current: &Resolution) -> DriftReport {
    diff_packages(
        &lock.packages,
        &LockFile::from_resolution(current).packages,
        current.normalizes_names(),
    )
}
