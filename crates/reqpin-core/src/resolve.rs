use crate::source::{FsSource, ManifestSource};
use crate::CoreError;
use reqpin_schema::{parse_manifest_str, Line, ParsedManifest, Resolution, ResolvedPin};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Key packages by their normalized name so `Foo_Bar` and `foo-bar` collide.
    pub normalize_names: bool,
    /// Reject a name pinned twice within the same file.
    pub strict: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            normalize_names: true,
            strict: false,
        }
    }
}

/// Flattens a manifest tree into a single name → version mapping.
///
/// Lines are applied in order. An include is resolved at the position of its
/// directive, so pins that follow it override anything it pulled in. Each
/// distinct file is read, parsed and hashed once per `resolve`; a file reached
/// again through another branch reapplies its cached lines.
pub struct Resolver<S = FsSource> {
    source: S,
    options: ResolveOptions,
}

impl Resolver<FsSource> {
    pub fn from_fs() -> Self {
        Self::new(FsSource)
    }
}

impl<S: ManifestSource> Resolver<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ResolveOptions::default())
    }

    pub fn with_options(source: S, options: ResolveOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn resolve(&self, root: impl AsRef<Path>) -> Result<Resolution, CoreError> {
        let root = root.as_ref();
        info!("resolving manifest {}", root.display());

        let mut resolution = Resolution::new(root, self.options.normalize_names);
        let mut walk = Walk::default();
        self.visit(root, None, &mut walk, &mut resolution)?;

        debug!(
            "resolved {} packages from {} files ({} overrides)",
            resolution.len(),
            resolution.sources.len(),
            resolution.overrides.len()
        );
        Ok(resolution)
    }

    fn visit(
        &self,
        path: &Path,
        included_from: Option<&Path>,
        walk: &mut Walk,
        resolution: &mut Resolution,
    ) -> Result<(), CoreError> {
        let id = self.source.identity(path);
        if let Some(pos) = walk.stack.iter().position(|(seen, _)| *seen == id) {
            let mut chain: Vec<PathBuf> =
                walk.stack[pos..].iter().map(|(_, p)| p.clone()).collect();
            chain.push(path.to_path_buf());
            return Err(CoreError::IncludeCycle { chain });
        }

        let parsed = if let Some(parsed) = walk.parsed.get(&id) {
            debug!("{} already read, reapplying", path.display());
            Rc::clone(parsed)
        } else {
            let content = self.source.read(path).map_err(|source| CoreError::Read {
                path: path.to_path_buf(),
                included_from: included_from.map(Path::to_path_buf),
                source,
            })?;
            let parsed = parse_manifest_str(&content).map_err(|source| CoreError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
            resolution.record_source(path, &content);
            let parsed = Rc::new(parsed);
            walk.parsed.insert(id.clone(), Rc::clone(&parsed));
            parsed
        };

        walk.stack.push((id, path.to_path_buf()));
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for entry in &parsed.lines {
            match &entry.line {
                Line::Include(include) => {
                    let target = self.source.include_path(path, &include.path);
                    debug!(
                        "{}:{} includes {}",
                        path.display(),
                        entry.number,
                        target.display()
                    );
                    self.visit(&target, Some(path), walk, resolution)?;
                }
                Line::Pin(pin) => {
                    match first_seen.entry(resolution.key_for(&pin.name)) {
                        Entry::Occupied(first) => {
                            if self.options.strict {
                                return Err(CoreError::DuplicatePin {
                                    path: path.to_path_buf(),
                                    name: pin.name.to_string(),
                                    first: *first.get(),
                                    second: entry.number,
                                });
                            }
                            warn!(
                                "{}:{} pins '{}' again (first at line {})",
                                path.display(),
                                entry.number,
                                pin.name,
                                first.get()
                            );
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(entry.number);
                        }
                    }

                    let resolved = ResolvedPin::from_pin(pin, path, entry.number);
                    if let Some(replaced) = resolution.apply(resolved) {
                        debug!(
                            "{} overrides {}=={} from {}",
                            replaced.replacement.origin,
                            replaced.previous.name,
                            replaced.previous.version,
                            replaced.previous.origin
                        );
                    }
                }
                Line::Blank | Line::Comment { .. } => {}
            }
        }

        walk.stack.pop();
        Ok(())
    }
}

/// State of one `resolve` call: the active include stack (identity, path as
/// written) and every file parsed so far, keyed by identity.
#[derive(Default)]
struct Walk {
    stack: Vec<(PathBuf, PathBuf)>,
    parsed: HashMap<PathBuf, Rc<ParsedManifest>>,
}
