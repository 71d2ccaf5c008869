use crate::normalize::Resolution;
use crate::types::{normalize_name, ManifestDigest, ShortDigest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const LOCK_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lock file serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported lock_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("lock file digest mismatch: lock has '{lock_digest}', recomputed '{computed_digest}'")]
    DigestMismatch {
        lock_digest: String,
        computed_digest: String,
    },
    #[error("lock file drift: {0}")]
    Drift(String),
}

/// A package as captured in the lock file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

impl LockedPackage {
    pub fn requirement(&self) -> String {
        if self.extras.is_empty() {
            format!("{}=={}", self.name, self.version)
        } else {
            format!("{}[{}]=={}", self.name, self.extras.join(","), self.version)
        }
    }
}

/// A manifest file that was read to produce the lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedSource {
    pub path: String,
    pub blake3: String,
}

/// Snapshot of a resolved manifest tree.
///
/// The digest covers only the resolved packages, so comment or ordering edits
/// in the manifests leave it unchanged. Any version change alters it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    pub lock_version: u32,
    pub root: String,
    pub digest: String,
    pub short_digest: String,

    #[serde(default)]
    pub sources: Vec<LockedSource>,

    // Sorted by resolution key
    pub packages: Vec<LockedPackage>,
}

impl LockFile {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let packages = resolution
            .iter()
            .map(|pin| LockedPackage {
                name: pin.name.to_string(),
                version: pin.version.to_string(),
                extras: pin.extras.clone(),
            })
            .collect();
        let sources = resolution
            .sources
            .iter()
            .map(|s| LockedSource {
                path: s.path.display().to_string(),
                blake3: s.blake3.clone(),
            })
            .collect();

        let lock = LockFile {
            lock_version: LOCK_VERSION,
            root: resolution.root.display().to_string(),
            digest: String::new(), // computed below
            short_digest: String::new(),
            sources,
            packages,
        };

        let (digest, short) = lock.compute_digest();
        LockFile {
            digest: digest.into_inner(),
            short_digest: short.into_inner(),
            ..lock
        }
    }

    /// Hash the locked packages in their stored order.
    pub fn compute_digest(&self) -> (ManifestDigest, ShortDigest) {
        let mut hasher = blake3::Hasher::new();
        for pkg in &self.packages {
            hasher.update(format!("pkg:{}=={}", pkg.name, pkg.version).as_bytes());
            for extra in &pkg.extras {
                hasher.update(format!("extra:{}[{extra}]", pkg.name).as_bytes());
            }
        }
        let hex = hasher.finalize().to_hex().to_string();
        let short = hex[..12].to_owned();
        (ManifestDigest::new(hex), ShortDigest::new(short))
    }

    /// Verify that the stored digest matches the stored packages.
    pub fn verify_integrity(&self) -> Result<ManifestDigest, LockError> {
        if self.lock_version != LOCK_VERSION {
            return Err(LockError::UnsupportedVersion(self.lock_version));
        }
        let (digest, _) = self.compute_digest();
        if self.digest != digest.as_str() {
            return Err(LockError::DigestMismatch {
                lock_digest: self.digest.clone(),
                computed_digest: digest.into_inner(),
            });
        }
        Ok(digest)
    }

    /// Check that a fresh resolution still matches this lock.
    ///
    /// Packages are matched by the resolution's key, so a respelled name
    /// (`Jinja2` locked, `jinja2` pinned) is reported rather than passed over.
    pub fn verify_resolution(&self, resolution: &Resolution) -> Result<(), LockError> {
        let current = LockFile::from_resolution(resolution);
        if current.digest == self.digest {
            return Ok(());
        }

        let key = |name: &str| {
            if resolution.normalizes_names() {
                normalize_name(name)
            } else {
                name.to_owned()
            }
        };
        let locked: BTreeMap<String, &LockedPackage> =
            self.packages.iter().map(|p| (key(&p.name), p)).collect();
        let pinned: BTreeMap<String, &LockedPackage> =
            current.packages.iter().map(|p| (key(&p.name), p)).collect();

        for (k, pkg) in &pinned {
            match locked.get(k) {
                None => {
                    return Err(LockError::Drift(format!(
                        "package '{}' is in the manifest but not in the lock file. Run 'reqpin lock' to update.",
                        pkg.name
                    )))
                }
                Some(old) if old.version != pkg.version => {
                    return Err(LockError::Drift(format!(
                        "package '{}' changed: lock has '{}', manifest has '{}'",
                        pkg.name, old.version, pkg.version
                    )))
                }
                Some(old) if old.extras != pkg.extras => {
                    return Err(LockError::Drift(format!(
                        "package '{}' changed: lock has '{}', manifest has '{}'",
                        pkg.name,
                        old.requirement(),
                        pkg.requirement()
                    )))
                }
                Some(old) if old.name != pkg.name => {
                    return Err(LockError::Drift(format!(
                        "package '{}' is locked as '{}'. Run 'reqpin lock' to update.",
                        pkg.name, old.name
                    )))
                }
                Some(_) => {}
            }
        }
        if let Some(old) = locked.iter().find_map(|(k, p)| (!pinned.contains_key(k)).then_some(p)) {
            return Err(LockError::Drift(format!(
                "package '{}' is in the lock file but no longer in the manifest. Run 'reqpin lock' to update.",
                old.name
            )));
        }
        Err(LockError::Drift(format!(
            "manifest digest {} differs from lock digest {}. Run 'reqpin lock' to update.",
            current.short_digest, self.short_digest
        )))
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LockError::Io(e.error))?;
        // Fsync parent directory so the rename survives power loss.
        if let Ok(f) = fs::File::open(dir) {
            if let Err(e) = f.sync_all() {
                debug!("failed to fsync {}: {e}", dir.display());
            }
        }
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
