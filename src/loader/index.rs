//! Unit index over the child scope
//!
//! Answers "which archive holds this unit/resource" for a loader's own
//! archive sources. Absence is `None`, never an error; turning "absent
//! everywhere" into a failure is the delegating loader's job.

use std::sync::Arc;

use crate::loader::registry::archive::ArchiveSource;
use crate::loader::traits::{LoaderError, ResourceLocator, ResourcePath, UnitName};

/// A unit found in the child scope
#[derive(Debug, Clone)]
pub struct UnitMatch {
    /// Archive source that held the unit
    pub source: Arc<ArchiveSource>,
    /// Unit bytes
    pub bytes: Vec<u8>,
}

/// Lookup surface of the child scope
pub trait UnitIndex: Send + Sync {
    /// First archive source containing `name` wins
    fn find_unit(&self, name: &UnitName) -> Result<Option<UnitMatch>, LoaderError>;

    /// Every archive source containing `path`, in archive order
    fn find_resources<'a>(
        &'a self,
        path: &ResourcePath,
    ) -> Box<dyn Iterator<Item = ResourceLocator> + 'a>;

    /// First resource match
    fn find_resource(&self, path: &ResourcePath) -> Option<ResourceLocator> {
        self.find_resources(path).next()
    }
}

/// Archive-backed unit index
pub struct ArchiveUnitIndex {
    /// Sources in archive list order
    sources: Vec<Arc<ArchiveSource>>,
    /// Extension of unit entries
    unit_extension: String,
}

impl ArchiveUnitIndex {
    pub fn new(sources: Vec<Arc<ArchiveSource>>, unit_extension: impl Into<String>) -> Self {
        Self {
            sources,
            unit_extension: unit_extension.into(),
        }
    }

    pub fn sources(&self) -> &[Arc<ArchiveSource>] {
        &self.sources
    }

    /// Lazy, restartable resource match sequence
    pub fn resource_matches(&self, path: &ResourcePath) -> ResourceMatches<'_> {
        ResourceMatches {
            sources: self.sources.iter(),
            entry: path.as_str().to_string(),
        }
    }
}

impl UnitIndex for ArchiveUnitIndex {
    fn find_unit(&self, name: &UnitName) -> Result<Option<UnitMatch>, LoaderError> {
        let entry = name.entry_path(&self.unit_extension);

        for source in &self.sources {
            if let Some(bytes) = source.read(&entry)? {
                return Ok(Some(UnitMatch {
                    source: Arc::clone(source),
                    bytes,
                }));
            }
        }

        Ok(None)
    }

    fn find_resources<'a>(
        &'a self,
        path: &ResourcePath,
    ) -> Box<dyn Iterator<Item = ResourceLocator> + 'a> {
        Box::new(self.resource_matches(path))
    }
}

/// Resource matches across archive sources
///
/// Yields at most one locator per source. Cloning restarts from the current
/// position; calling `resource_matches` again restarts from the beginning.
#[derive(Clone)]
pub struct ResourceMatches<'a> {
    sources: std::slice::Iter<'a, Arc<ArchiveSource>>,
    entry: String,
}

impl Iterator for ResourceMatches<'_> {
    type Item = ResourceLocator;

    fn next(&mut self) -> Option<Self::Item> {
        if self.entry.is_empty() {
            return None;
        }
        for source in self.sources.by_ref() {
            if source.contains(&self.entry) {
                return Some(ResourceLocator::Archive {
                    archive: source.archive().to_path_buf(),
                    entry: self.entry.clone(),
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.sources.len()))
    }
}
