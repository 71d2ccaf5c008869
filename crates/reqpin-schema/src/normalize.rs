use crate::manifest::Pin;
use crate::types::{normalize_name, PackageName, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a pin was declared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Origin {
    pub path: PathBuf,
    pub line: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// The pin that won for one package after all includes and overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPin {
    pub name: PackageName,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub origin: Origin,
}

impl ResolvedPin {
    pub fn from_pin(pin: &Pin, path: &Path, line: usize) -> Self {
        Self {
            name: pin.name.clone(),
            version: pin.version.clone(),
            extras: pin.extras.clone(),
            origin: Origin {
                path: path.to_path_buf(),
                line,
            },
        }
    }

    /// `name[extras]==version`, the form an installer accepts.
    pub fn requirement(&self) -> String {
        if self.extras.is_empty() {
            format!("{}=={}", self.name, self.version)
        } else {
            format!("{}[{}]=={}", self.name, self.extras.join(","), self.version)
        }
    }
}

/// A later pin replacing an earlier entry for the same package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub previous: ResolvedPin,
    pub replacement: ResolvedPin,
}

impl Override {
    /// True when the replacement changes the version, not just restates it.
    pub fn changes_version(&self) -> bool {
        self.previous.version != self.replacement.version
    }
}

/// Content digest of one manifest file that took part in a resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDigest {
    pub path: PathBuf,
    pub blake3: String,
}

/// The flattened name → version mapping of a manifest tree.
///
/// Entries are keyed by the normalized package name (or the literal name when
/// normalization is off), so no package can appear twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub root: PathBuf,
    pub pins: BTreeMap<String, ResolvedPin>,
    pub overrides: Vec<Override>,
    pub sources: Vec<SourceDigest>,
    #[serde(skip)]
    normalize_names: bool,
}

impl Resolution {
    pub fn new(root: impl Into<PathBuf>, normalize_names: bool) -> Self {
        Self {
            root: root.into(),
            pins: BTreeMap::new(),
            overrides: Vec::new(),
            sources: Vec::new(),
            normalize_names,
        }
    }

    pub fn normalizes_names(&self) -> bool {
        self.normalize_names
    }

    pub fn key_for(&self, name: &str) -> String {
        if self.normalize_names {
            normalize_name(name)
        } else {
            name.to_owned()
        }
    }

    /// Set the entry for `pin`, replacing any earlier one. Returns the
    /// override record when an entry already existed.
    pub fn apply(&mut self, pin: ResolvedPin) -> Option<&Override> {
        let key = self.key_for(&pin.name);
        let previous = self.pins.insert(key.clone(), pin.clone())?;
        self.overrides.push(Override {
            key,
            previous,
            replacement: pin,
        });
        self.overrides.last()
    }

    pub fn record_source(&mut self, path: impl Into<PathBuf>, content: &str) {
        self.sources.push(SourceDigest {
            path: path.into(),
            blake3: blake3::hash(content.as_bytes()).to_hex().to_string(),
        });
    }

    /// Look a package up by any spelling of its name.
    pub fn get(&self, name: &str) -> Option<&ResolvedPin> {
        self.pins.get(&self.key_for(name))
    }

    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|p| p.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPin> {
        self.pins.values()
    }

    /// One `name==version` line per package, sorted by key.
    pub fn to_freeze(&self) -> String {
        let mut out = String::new();
        for pin in self.pins.values() {
            out.push_str(&pin.requirement());
            out.push('\n');
        }
        out
    }

    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
