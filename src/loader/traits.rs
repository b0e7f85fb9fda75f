//! Loader traits and shared types
//!
//! Defines the contract every loader in a delegation chain satisfies, plus the
//! value types that flow between loaders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Fully-qualified dotted name of a loadable unit (e.g. `com.example.Widget`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName(String);

impl UnitName {
    /// Validate and wrap a dotted unit name
    pub fn new(name: impl Into<String>) -> Result<Self, LoaderError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LoaderError::InvalidUnitName("unit name cannot be empty".to_string()));
        }
        if name.contains('/') || name.contains('\0') {
            return Err(LoaderError::InvalidUnitName(name));
        }
        if name.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(LoaderError::InvalidUnitName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archive entry path holding this unit: `a.b.C` -> `a/b/C.<extension>`
    pub fn entry_path(&self, extension: &str) -> String {
        format!("{}.{}", self.0.replace('.', "/"), extension)
    }

    /// Prefix match used by the parent-first policy
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UnitName {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UnitName {
    type Error = LoaderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitName> for String {
    fn from(name: UnitName) -> Self {
        name.0
    }
}

/// Slash-delimited path of a resource inside an archive
///
/// A single leading `/` is dropped so `/conf/app.toml` and `conf/app.toml`
/// address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        Self(path.strip_prefix('/').unwrap_or(path).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Where a loaded unit's bytes came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOrigin {
    /// Read from an archive file (the directly loadable one, after container unpacking)
    Archive(PathBuf),
    /// Served from an in-memory root loader
    Bootstrap(String),
}

/// Resolved unit content
///
/// Immutable once created. Loaders hand these out as `Arc<LoadedUnit>` so
/// callers racing on the same name can observe they got the same instance.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedUnit {
    /// Unit name
    pub name: UnitName,
    /// Raw unit bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Archive or loader the bytes came from
    pub origin: UnitOrigin,
}

impl LoadedUnit {
    pub fn new(name: UnitName, bytes: Vec<u8>, origin: UnitOrigin) -> Self {
        Self { name, bytes, origin }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Locator for a resource match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocator {
    /// Entry inside an archive file
    Archive { archive: PathBuf, entry: String },
    /// In-memory resource held by a root loader
    Memory {
        loader: String,
        path: String,
        bytes: Arc<[u8]>,
    },
}

impl ResourceLocator {
    /// Archive file backing this resource, if any
    pub fn archive(&self) -> Option<&Path> {
        match self {
            Self::Archive { archive, .. } => Some(archive),
            Self::Memory { .. } => None,
        }
    }

    /// Read the resource bytes
    pub fn read(&self) -> Result<Vec<u8>, LoaderError> {
        match self {
            Self::Archive { archive, entry } => {
                crate::loader::registry::archive::read_entry(archive, entry)
            }
            Self::Memory { bytes, .. } => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive { archive, entry } => write!(f, "{}!/{}", archive.display(), entry),
            Self::Memory { loader, path, .. } => write!(f, "{}:/{}", loader, path),
        }
    }
}

/// Contract shared by every loader in a delegation chain
///
/// A child loader reaches its parent only through this trait, so chains of
/// any depth compose: a `DelegatingLoader` can be the parent of another.
pub trait UnitLoader: Send + Sync {
    /// Short name used in logs and locators
    fn name(&self) -> &str;

    /// Resolve a unit, failing with `UnitNotFound` when no scope has it
    fn load_unit(&self, name: &UnitName) -> Result<Arc<LoadedUnit>, LoaderError>;

    /// First match for a resource; `Ok(None)` is a normal outcome
    fn find_resource(&self, path: &ResourcePath) -> Result<Option<ResourceLocator>, LoaderError>;

    /// Every match for a resource, in search order, duplicates preserved
    fn find_all_resources(&self, path: &ResourcePath) -> Result<Vec<ResourceLocator>, LoaderError>;
}

/// Loader errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("Invalid archive {path}: {reason}")]
    InvalidArchive { path: String, reason: String },

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Invalid unit name: {0}")]
    InvalidUnitName(String),

    #[error("Failed to read archive {archive}: {reason}")]
    ArchiveRead { archive: String, reason: String },
}

impl LoaderError {
    pub(crate) fn invalid_archive(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::InvalidArchive {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn archive_read(archive: &Path, reason: impl fmt::Display) -> Self {
        Self::ArchiveRead {
            archive: archive.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for the "not found anywhere" outcome of `load_unit`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnitNotFound(_))
    }
}
