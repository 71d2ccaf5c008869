pub mod check;
pub mod completions;
pub mod diff;
pub mod init;
pub mod lock;
pub mod man_pages;
pub mod resolve;
pub mod verify;

use console::Style;
use reqpin_core::{DriftReport, FsSource, ProjectConfig, Resolver, CONFIG_FILE_NAME};
use reqpin_schema::Resolution;
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_LOCK_ERROR: u8 = 3;

/// Settings shared by every command: the loaded config, the directory its
/// paths are relative to, and output mode.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ProjectConfig,
    pub base: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn load(
        config_path: Option<&Path>,
        json: bool,
        strict: bool,
        literal_names: bool,
    ) -> Result<Self, String> {
        let (mut config, base) = match config_path {
            Some(path) => {
                let config = ProjectConfig::load(path).map_err(|e| e.to_string())?;
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (config, base)
            }
            None => (
                ProjectConfig::load_or_default(Path::new(".")).map_err(|e| e.to_string())?,
                PathBuf::new(),
            ),
        };
        if strict {
            config.strict = true;
        }
        if literal_names {
            config.normalize_names = false;
        }
        Ok(Self { config, base, json })
    }

    /// Context for `init`, which creates the config file and so must not
    /// require it to exist. Paths are relative to the config file's directory.
    pub fn for_init(config_path: Option<&Path>, json: bool) -> Self {
        let base = config_path
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            config: ProjectConfig::default(),
            base,
            json,
        }
    }

    pub fn manifest_path(&self, arg: Option<&Path>) -> PathBuf {
        arg.map_or_else(|| self.config.manifest_path(&self.base), Path::to_path_buf)
    }

    pub fn lock_path(&self, arg: Option<&Path>) -> PathBuf {
        arg.map_or_else(|| self.config.lock_path(&self.base), Path::to_path_buf)
    }

    pub fn config_path(&self, arg: Option<&Path>) -> PathBuf {
        arg.map_or_else(|| self.base.join(CONFIG_FILE_NAME), Path::to_path_buf)
    }

    pub fn resolver(&self) -> Resolver<FsSource> {
        Resolver::with_options(FsSource, self.config.resolve_options())
    }

    pub fn resolve(&self, manifest: &Path) -> Result<Resolution, String> {
        self.resolver().resolve(manifest).map_err(|e| e.to_string())
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// One line per drifted package: `+` added, `-` removed, `~` changed or respelled.
pub fn render_drift(report: &DriftReport) -> Vec<String> {
    let added = Style::new().green();
    let removed = Style::new().red();
    let changed = Style::new().yellow();

    let mut lines = Vec::new();
    for pkg in &report.added {
        lines.push(added.apply_to(format!("+ {}", pkg.requirement())).to_string());
    }
    for pkg in &report.removed {
        lines.push(removed.apply_to(format!("- {}", pkg.requirement())).to_string());
    }
    for change in &report.changed {
        lines.push(
            changed
                .apply_to(format!(
                    "~ {}: {} -> {}",
                    change.name,
                    change.old.requirement(),
                    change.new.requirement()
                ))
                .to_string(),
        );
    }
    for change in &report.renamed {
        lines.push(
            changed
                .apply_to(format!(
                    "~ {} -> {} (respelled)",
                    change.old.name, change.new.name
                ))
                .to_string(),
        );
    }
    lines
}
