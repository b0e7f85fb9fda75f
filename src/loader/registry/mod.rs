//! Archive registry
//!
//! Handles archive list parsing, container unpacking, and opened archive sources.

pub mod archive;
pub mod container;
pub mod discovery;

pub use archive::{ArchiveKind, ArchivePath, ArchiveSource};
pub use container::{ContainerError, ContainerResolver, EmbeddedArchiveExtractor};
pub use discovery::ArchiveSourceResolver;
