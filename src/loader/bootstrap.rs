//! Root loader
//!
//! The top of every delegation chain. It has no parent and serves a fixed,
//! in-memory table of units and resources (empty by default).

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::loader::traits::{
    LoadedUnit, LoaderError, ResourceLocator, ResourcePath, UnitLoader, UnitName, UnitOrigin,
};

/// In-memory root loader
pub struct BootstrapLoader {
    name: String,
    units: HashMap<UnitName, Arc<LoadedUnit>>,
    resources: HashMap<String, Vec<Arc<[u8]>>>,
}

impl BootstrapLoader {
    /// Create an empty root loader
    pub fn new() -> Self {
        Self::named("bootstrap")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// Register a unit
    pub fn with_unit(mut self, name: UnitName, bytes: impl Into<Vec<u8>>) -> Self {
        let unit = LoadedUnit::new(
            name.clone(),
            bytes.into(),
            UnitOrigin::Bootstrap(self.name.clone()),
        );
        self.units.insert(name, Arc::new(unit));
        self
    }

    /// Register a resource; registering a path twice keeps both matches
    pub fn with_resource(mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Self {
        let path = ResourcePath::new(path);
        let bytes: Vec<u8> = bytes.into();
        let bytes: Arc<[u8]> = Arc::from(bytes);
        self.resources
            .entry(path.as_str().to_string())
            .or_default()
            .push(bytes);
        self
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn locators(&self, path: &ResourcePath) -> Vec<ResourceLocator> {
        self.resources
            .get(path.as_str())
            .map(|matches| {
                matches
                    .iter()
                    .map(|bytes| ResourceLocator::Memory {
                        loader: self.name.clone(),
                        path: path.as_str().to_string(),
                        bytes: Arc::clone(bytes),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for BootstrapLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitLoader for BootstrapLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_unit(&self, name: &UnitName) -> Result<Arc<LoadedUnit>, LoaderError> {
        match self.units.get(name) {
            Some(unit) => Ok(Arc::clone(unit)),
            None => {
                debug!("{}: {} not found", self.name, name);
                Err(LoaderError::UnitNotFound(name.to_string()))
            }
        }
    }

    fn find_resource(&self, path: &ResourcePath) -> Result<Option<ResourceLocator>, LoaderError> {
        Ok(self.locators(path).into_iter().next())
    }

    fn find_all_resources(&self, path: &ResourcePath) -> Result<Vec<ResourceLocator>, LoaderError> {
        Ok(self.locators(path))
    }
}
