//! Resolution engine for reqpin.
//!
//! This crate walks a manifest tree through a [`ManifestSource`], applying
//! include directives in place so later pins override earlier ones, and
//! produces the flattened [`Resolution`](reqpin_schema::Resolution). It also
//! loads the project configuration and compares resolutions for drift.

pub mod config;
pub mod drift;
pub mod resolve;
pub mod source;

pub use config::{ProjectConfig, CONFIG_FILE_NAME};
pub use drift::{diff_lock, diff_packages, diff_resolutions, DriftReport, PackageChange};
pub use resolve::{ResolveOptions, Resolver};
pub use source::{lexical_normalize, FsSource, ManifestSource, MemorySource};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        source: reqpin_schema::ManifestError,
    },
    #[error("failed to read manifest {}{}: {source}", path.display(), included_by(included_from.as_deref()))]
    Read {
        path: PathBuf,
        included_from: Option<PathBuf>,
        source: std::io::Error,
    },
    #[error("manifest error: include cycle: {}", display_chain(chain))]
    IncludeCycle { chain: Vec<PathBuf> },
    #[error("manifest error: {}: '{name}' is pinned twice (lines {first} and {second})", path.display())]
    DuplicatePin {
        path: PathBuf,
        name: String,
        first: usize,
        second: usize,
    },
    #[error("lock error: {0}")]
    Lock(#[from] reqpin_schema::LockError),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn included_by(from: Option<&Path>) -> String {
    from.map(|p| format!(" (included from {})", p.display()))
        .unwrap_or_default()
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
