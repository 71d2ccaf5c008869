use crate::resolve::ResolveOptions;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "reqpin.toml";

/// Project settings read from `reqpin.toml`. Every field has a default, so an
/// empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_lock")]
    pub lock: PathBuf,
    #[serde(default = "default_true")]
    pub normalize_names: bool,
    #[serde(default)]
    pub strict: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            lock: default_lock(),
            normalize_names: true,
            strict: false,
        }
    }
}

fn default_manifest() -> PathBuf {
    PathBuf::from("requirements/local.txt")
}

fn default_lock() -> PathBuf {
    PathBuf::from("requirements.lock")
}

fn default_true() -> bool {
    true
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Load `reqpin.toml` from `dir`, or fall back to defaults when absent.
    pub fn load_or_default(dir: &Path) -> Result<Self, CoreError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            normalize_names: self.normalize_names,
            strict: self.strict,
        }
    }

    /// Manifest path, taken relative to `base` unless absolute.
    pub fn manifest_path(&self, base: &Path) -> PathBuf {
        join_relative(base, &self.manifest)
    }

    pub fn lock_path(&self, base: &Path) -> PathBuf {
        join_relative(base, &self.lock)
    }
}

fn join_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
