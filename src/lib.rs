//! Unit Loader - delegating loader for archive-packaged code units
//!
//! Given an ordered list of archives (some of them container archives that
//! embed the archive to load from), this crate builds a loader that resolves
//! named units and resources, delegating to a parent loader according to a
//! configurable parent-first policy.
//!
//! ## Design Principles
//!
//! 1. **Explicit parent**: the parent loader is injected, never a global default
//! 2. **Explicit policy**: parent-first prefixes are caller-supplied
//! 3. **At most once**: a unit name is resolved at most once per loader, even
//!    under concurrent requests, without serializing unrelated names
//! 4. **Atomic construction**: a loader is either fully built or not returned
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unit_loader::{BootstrapLoader, DelegatingLoader, EmbeddedArchiveExtractor, LoaderConfig};
//!
//! let mut config = LoaderConfig::for_archives("libs/core.tar:apps/app.pkg");
//! config.parent_first = vec!["platform.".to_string()];
//!
//! let containers = EmbeddedArchiveExtractor::from_config(&config);
//! let loader = DelegatingLoader::new(&config, Arc::new(BootstrapLoader::new()), &containers)?;
//! let unit = loader.load("com.example.Main")?;
//! println!("{} bytes from {:?}", unit.len(), unit.origin);
//! # Ok::<(), unit_loader::LoaderError>(())
//! ```

pub mod config;
pub mod loader;
pub mod utils;

pub use config::{LoaderConfig, LoggingConfig};
pub use loader::{
    ArchiveKind, ArchivePath, ArchiveSource, ArchiveSourceResolver, ArchiveUnitIndex,
    BootstrapLoader, ContainerError, ContainerResolver, DelegatingLoader,
    EmbeddedArchiveExtractor, LoadedUnit, LoaderError, ParentFirstPatterns, ResourceLocator,
    ResourceMatches, ResourcePath, UnitIndex, UnitLoader, UnitMatch, UnitName, UnitOrigin,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
