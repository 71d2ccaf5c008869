//! Requirements line grammar, resolved pin mapping, and lock files for reqpin.
//!
//! This crate defines the schema layer: per-file manifest parsing
//! (`ParsedManifest`), the flattened name → version mapping produced by include
//! resolution (`Resolution`), package name normalization, and lock file
//! generation/verification (`LockFile`).

pub mod lock;
pub mod manifest;
pub mod normalize;
pub mod types;

pub use lock::{LockError, LockFile, LockedPackage, LockedSource, LOCK_VERSION};
pub use manifest::{
    parse_line, parse_manifest_file, parse_manifest_str, Include, Line, ManifestError,
    ParsedManifest, Pin, SourceLine,
};
pub use normalize::{Origin, Override, ResolvedPin, Resolution, SourceDigest};
pub use types::{normalize_name, ManifestDigest, PackageName, ShortDigest, Version};
