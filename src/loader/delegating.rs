//! Delegating loader implementation
//!
//! Resolves units from its own archive sources (the child scope) and a parent
//! loader, following a parent-first prefix policy:
//!
//! 1. A unit already cached by this loader is returned as-is.
//! 2. Names matching a parent-first prefix go straight to the parent.
//! 3. Otherwise the child scope is searched; a hit is cached.
//! 4. A miss falls back to the parent, whose result is returned uncached.
//!
//! Steps 1-4 run under a per-name lock, so two threads asking for the same
//! name never both search the archives, while different names proceed in
//! parallel. Resource lookups are lock-free reads.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::loader::cache::{Outcome, Retention, UnitCache};
use crate::loader::index::{ArchiveUnitIndex, UnitIndex};
use crate::loader::registry::archive::ArchiveSource;
use crate::loader::registry::container::ContainerResolver;
use crate::loader::registry::discovery::ArchiveSourceResolver;
use crate::loader::traits::{
    LoadedUnit, LoaderError, ResourceLocator, ResourcePath, UnitLoader, UnitName, UnitOrigin,
};

/// Ordered name prefixes that are always resolved through the parent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentFirstPatterns(Vec<String>);

impl ParentFirstPatterns {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(prefixes.into_iter().map(Into::into).collect())
    }

    /// No eager delegation
    pub fn empty() -> Self {
        Self::default()
    }

    /// First prefix matching `name`
    pub fn matches(&self, name: &UnitName) -> Option<&str> {
        self.0
            .iter()
            .find(|prefix| name.starts_with(prefix))
            .map(|prefix| prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Loader with a child scope and a parent loader
pub struct DelegatingLoader {
    /// Loader name for logs
    name: String,
    /// Child-scope lookups
    index: Arc<dyn UnitIndex>,
    /// Child-scope archives, in search order
    sources: Vec<Arc<ArchiveSource>>,
    /// Delegation target, never mutated by this loader
    parent: Arc<dyn UnitLoader>,
    /// Names resolved parent-first
    parent_first: ParentFirstPatterns,
    /// Per-name locks and resolved units
    cache: UnitCache,
}

impl DelegatingLoader {
    /// Build a loader from configuration
    ///
    /// Fails with `InvalidArchive` if any archive list entry cannot be turned
    /// into a directly loadable source; no loader is returned in that case.
    pub fn new(
        config: &LoaderConfig,
        parent: Arc<dyn UnitLoader>,
        containers: &dyn ContainerResolver,
    ) -> Result<Self, LoaderError> {
        let sources =
            ArchiveSourceResolver::from_config(config, containers).resolve(&config.archive_path)?;
        let index = ArchiveUnitIndex::new(sources.clone(), config.unit_extension.clone());

        let mut loader = Self::with_index(
            Arc::new(index),
            parent,
            ParentFirstPatterns::new(config.parent_first.iter().cloned()),
        );
        loader.sources = sources;

        info!(
            "Loader ready: {} archive sources, {} parent-first prefixes, parent {}",
            loader.sources.len(),
            loader.parent_first.len(),
            loader.parent.name()
        );
        Ok(loader)
    }

    /// Build a loader over an arbitrary child-scope index
    pub fn with_index(
        index: Arc<dyn UnitIndex>,
        parent: Arc<dyn UnitLoader>,
        parent_first: ParentFirstPatterns,
    ) -> Self {
        Self {
            name: "delegating".to_string(),
            index,
            sources: Vec::new(),
            parent,
            parent_first,
            cache: UnitCache::new(),
        }
    }

    /// Rename the loader (shows up in logs)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse `name` and load it
    pub fn load(&self, name: &str) -> Result<Arc<LoadedUnit>, LoaderError> {
        self.load_unit(&UnitName::new(name)?)
    }

    /// Cached unit for `name`, without resolving
    pub fn find_loaded_unit(&self, name: &UnitName) -> Option<Arc<LoadedUnit>> {
        self.cache.get(name)
    }

    /// Names resolved from the child scope so far, sorted
    pub fn loaded_units(&self) -> Vec<UnitName> {
        self.cache.names()
    }

    /// Child-scope archive sources, in search order
    pub fn archive_sources(&self) -> &[Arc<ArchiveSource>] {
        &self.sources
    }

    pub fn parent(&self) -> &Arc<dyn UnitLoader> {
        &self.parent
    }

    pub fn parent_first(&self) -> &ParentFirstPatterns {
        &self.parent_first
    }

    /// Resolution steps 2-4; step 1 is handled by the slot
    fn resolve(&self, name: &UnitName) -> (Outcome, Retention) {
        if let Some(prefix) = self.parent_first.matches(name) {
            debug!("{}: {} matches parent-first prefix {:?}", self.name, name, prefix);
            return (self.parent.load_unit(name), Retention::Transient);
        }

        match self.index.find_unit(name) {
            Ok(Some(found)) => {
                debug!("{}: {} found in {:?}", self.name, name, found.source.archive());
                let unit = LoadedUnit::new(
                    name.clone(),
                    found.bytes,
                    UnitOrigin::Archive(found.source.archive().to_path_buf()),
                );
                (Ok(Arc::new(unit)), Retention::Cache)
            }
            Ok(None) => {
                debug!(
                    "{}: {} not in child scope, delegating to {}",
                    self.name,
                    name,
                    self.parent.name()
                );
                let outcome = self.parent.load_unit(name).map_err(|e| match e {
                    LoaderError::UnitNotFound(_) => LoaderError::UnitNotFound(name.to_string()),
                    other => other,
                });
                (outcome, Retention::Transient)
            }
            Err(e) => (Err(e), Retention::Transient),
        }
    }
}

impl UnitLoader for DelegatingLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_unit(&self, name: &UnitName) -> Result<Arc<LoadedUnit>, LoaderError> {
        let slot = self.cache.slot(name);
        let outcome = slot.resolve_with(name, || self.resolve(name));
        self.cache.release(name, &slot);
        outcome
    }

    fn find_resource(&self, path: &ResourcePath) -> Result<Option<ResourceLocator>, LoaderError> {
        if path.is_empty() {
            return Ok(None);
        }
        if let Some(found) = self.index.find_resource(path) {
            return Ok(Some(found));
        }
        self.parent.find_resource(path)
    }

    fn find_all_resources(&self, path: &ResourcePath) -> Result<Vec<ResourceLocator>, LoaderError> {
        if path.is_empty() {
            return Ok(Vec::new());
        }
        let mut matches: Vec<ResourceLocator> = self.index.find_resources(path).collect();
        matches.extend(self.parent.find_all_resources(path)?);
        Ok(matches)
    }
}
