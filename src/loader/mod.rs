//! Unit loading system
//!
//! Resolves named code units and resources from archive files, delegating to
//! a parent loader according to a parent-first prefix policy.
//!
//! ## Architecture
//!
//! - **Registry**: turns an archive list into opened, directly loadable
//!   archive sources, unpacking container archives on the way
//! - **Index**: first-match unit lookup and exhaustive resource lookup over
//!   the child scope
//! - **Delegating loader**: combines child scope and parent, with a per-name
//!   lock so each unit is resolved at most once per loader
//! - **Bootstrap loader**: in-memory root of a delegation chain

pub mod bootstrap;
pub mod cache;
pub mod delegating;
pub mod index;
pub mod registry;
pub mod traits;

pub use bootstrap::BootstrapLoader;
pub use delegating::{DelegatingLoader, ParentFirstPatterns};
pub use index::{ArchiveUnitIndex, ResourceMatches, UnitIndex, UnitMatch};
pub use registry::{
    ArchiveKind, ArchivePath, ArchiveSource, ArchiveSourceResolver, ContainerError,
    ContainerResolver, EmbeddedArchiveExtractor,
};
pub use traits::{
    LoadedUnit, LoaderError, ResourceLocator, ResourcePath, UnitLoader, UnitName, UnitOrigin,
};
