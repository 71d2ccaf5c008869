use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Where manifest text comes from.
///
/// The resolver only talks to this trait, so the same walk runs against the
/// filesystem or an in-memory tree.
pub trait ManifestSource {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Path of the file named by `-r <target>` inside `from`. Relative targets
    /// are taken relative to the directory of the including file.
    fn include_path(&self, from: &Path, target: &str) -> PathBuf {
        let target = Path::new(target);
        if target.is_absolute() {
            return lexical_normalize(target);
        }
        let base = from.parent().unwrap_or_else(|| Path::new(""));
        lexical_normalize(&base.join(target))
    }

    /// Key used to detect include cycles. Two paths naming the same file must
    /// map to the same key.
    fn identity(&self, path: &Path) -> PathBuf {
        lexical_normalize(path)
    }
}

impl<S: ManifestSource + ?Sized> ManifestSource for &S {
    fn read(&self, path: &Path) -> io::Result<String> {
        (**self).read(path)
    }

    fn include_path(&self, from: &Path, target: &str) -> PathBuf {
        (**self).include_path(from, target)
    }

    fn identity(&self, path: &Path) -> PathBuf {
        (**self).identity(path)
    }
}

/// Reads manifests from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ManifestSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn identity(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| lexical_normalize(path))
    }
}

/// An in-memory manifest tree keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(lexical_normalize(path.as_ref()), content.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ManifestSource for MemorySource {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&lexical_normalize(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such manifest: {}", path.display()),
                )
            })
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
